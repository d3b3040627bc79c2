//! # Face-Square Topology
//!
//! The 20 label configurations of a square face and the static edge tables
//! that turn each configuration into interface segments.
//!
//! ```text
//!   corner 3 ── node 2 ── corner 2
//!      │                     │
//!    node 3     node 4     node 1
//!      │                     │
//!   corner 0 ── node 0 ── corner 1
//! ```
//!
//! Local node `i` (for `i < 4`) is the midpoint of the side between corners
//! `i` and `i + 1`; node 4 is the face centre. Each table row holds up to
//! four `(a, b)` pairs padded with `-1`.

/// Maximum segments a square can emit.
pub const MAX_SQUARE_EDGES: usize = 4;

/// Local index of the face-centre node.
pub const FACE_CENTER: u8 = 4;

/// Node pairs of every emitted segment, per configuration.
pub const EDGE_NODE_TABLE: [[i8; 8]; 20] = [
    [-1, -1, -1, -1, -1, -1, -1, -1],
    [-1, -1, -1, -1, -1, -1, -1, -1],
    [-1, -1, -1, -1, -1, -1, -1, -1],
    [0, 1, -1, -1, -1, -1, -1, -1],
    [-1, -1, -1, -1, -1, -1, -1, -1],
    [0, 2, -1, -1, -1, -1, -1, -1],
    [1, 2, -1, -1, -1, -1, -1, -1],
    [0, 4, 2, 4, 1, 4, -1, -1],
    [-1, -1, -1, -1, -1, -1, -1, -1],
    [3, 0, -1, -1, -1, -1, -1, -1],
    [3, 1, -1, -1, -1, -1, -1, -1],
    [3, 4, 0, 4, 1, 4, -1, -1],
    [2, 3, -1, -1, -1, -1, -1, -1],
    [3, 4, 0, 4, 2, 4, -1, -1],
    [3, 4, 1, 4, 2, 4, -1, -1],
    [3, 0, 1, 2, -1, -1, -1, -1],
    [0, 1, 2, 3, -1, -1, -1, -1],
    [0, 1, 2, 3, -1, -1, -1, -1],
    [3, 0, 1, 2, -1, -1, -1, -1],
    [3, 4, 1, 4, 0, 4, 2, 4],
];

/// Corner pairs whose labels each segment separates, per configuration.
pub const EDGE_PIXEL_TABLE: [[i8; 8]; 20] = [
    [-1, -1, -1, -1, -1, -1, -1, -1],
    [-1, -1, -1, -1, -1, -1, -1, -1],
    [-1, -1, -1, -1, -1, -1, -1, -1],
    [1, 0, -1, -1, -1, -1, -1, -1],
    [-1, -1, -1, -1, -1, -1, -1, -1],
    [1, 0, -1, -1, -1, -1, -1, -1],
    [2, 1, -1, -1, -1, -1, -1, -1],
    [1, 0, 3, 2, 2, 1, -1, -1],
    [-1, -1, -1, -1, -1, -1, -1, -1],
    [0, 3, -1, -1, -1, -1, -1, -1],
    [0, 3, -1, -1, -1, -1, -1, -1],
    [0, 3, 1, 0, 2, 1, -1, -1],
    [3, 2, -1, -1, -1, -1, -1, -1],
    [0, 3, 1, 0, 3, 2, -1, -1],
    [0, 3, 2, 1, 3, 2, -1, -1],
    [0, 3, 2, 1, -1, -1, -1, -1],
    [1, 0, 3, 2, -1, -1, -1, -1],
    [1, 0, 3, 2, -1, -1, -1, -1],
    [0, 3, 2, 1, -1, -1, -1, -1],
    [0, 3, 2, 1, 1, 0, 3, 2],
];

/// Label configuration of a square face.
///
/// `T0`..`T14` are named after their inequality bits
/// `8·[d≠a] + 4·[c≠d] + 2·[b≠c] + [a≠b]`. When all four sides differ the
/// diagonals decide: `T17` (`b≠d`, `a=c`), `T18` (`a≠c`, `b=d`), `T19`
/// (four distinct labels). The checkerboard (`a=c`, `b=d`) is ambiguous and
/// is split either as `T15` (corners 0 and 2 cut off) or `T16` (corners 1
/// and 3 cut off).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[allow(missing_docs)]
pub enum SquareTopology {
    T0,
    T1,
    T2,
    T3,
    T4,
    T5,
    T6,
    T7,
    T8,
    T9,
    T10,
    T11,
    T12,
    T13,
    T14,
    T15,
    T16,
    T17,
    T18,
    T19,
}

/// One segment template from the edge tables.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EdgeTemplate {
    /// Local node indices (0..=4).
    pub nodes: [u8; 2],
    /// Corner indices (0..=3) whose labels the segment separates.
    pub pixels: [u8; 2],
}

impl SquareTopology {
    /// All configurations in index order.
    pub const ALL: [Self; 20] = [
        Self::T0,
        Self::T1,
        Self::T2,
        Self::T3,
        Self::T4,
        Self::T5,
        Self::T6,
        Self::T7,
        Self::T8,
        Self::T9,
        Self::T10,
        Self::T11,
        Self::T12,
        Self::T13,
        Self::T14,
        Self::T15,
        Self::T16,
        Self::T17,
        Self::T18,
        Self::T19,
    ];

    /// Configuration for a table index.
    #[must_use]
    pub const fn from_index(index: usize) -> Option<Self> {
        if index < Self::ALL.len() {
            Some(Self::ALL[index])
        } else {
            None
        }
    }

    /// Table index of the configuration.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Whether this is an unresolved checkerboard.
    #[inline]
    #[must_use]
    pub const fn is_ambiguous(self) -> bool {
        matches!(self, Self::T15)
    }

    /// Kind the face centre takes when it is active.
    ///
    /// `T7`, `T11`, `T13` and `T14` meet three materials, `T19` four.
    #[must_use]
    pub const fn face_center_materials(self) -> Option<u8> {
        match self {
            Self::T7 | Self::T11 | Self::T13 | Self::T14 => Some(3),
            Self::T19 => Some(4),
            _ => None,
        }
    }

    /// Segment templates of this configuration.
    pub fn edges(self) -> impl Iterator<Item = EdgeTemplate> {
        let nodes = &EDGE_NODE_TABLE[self.index()];
        let pixels = &EDGE_PIXEL_TABLE[self.index()];
        (0..MAX_SQUARE_EDGES)
            .take_while(move |&k| nodes[2 * k] >= 0)
            .map(move |k| EdgeTemplate {
                nodes: [nodes[2 * k] as u8, nodes[2 * k + 1] as u8],
                pixels: [pixels[2 * k] as u8, pixels[2 * k + 1] as u8],
            })
    }
}

#[inline]
const fn differs(p: i32, q: i32) -> usize {
    (p != q) as usize
}

/// Classifies a square by its four corner labels in cyclic order.
///
/// Never fails. The checkerboard comes back as [`SquareTopology::T15`] and
/// must be passed through ambiguity resolution before its edges are used.
#[must_use]
pub const fn classify_square(labels: [i32; 4]) -> SquareTopology {
    let [a, b, c, d] = labels;
    let index = 8 * differs(d, a) + 4 * differs(c, d) + 2 * differs(b, c) + differs(a, b);
    if index != 15 {
        return SquareTopology::ALL[index];
    }
    let diagonals = 2 * differs(a, c) + differs(b, d);
    if diagonals == 0 {
        SquareTopology::T15
    } else {
        SquareTopology::ALL[15 + diagonals + 1]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_square_has_no_edges() {
        assert_eq!(classify_square([4, 4, 4, 4]), SquareTopology::T0);
        assert_eq!(SquareTopology::T0.edges().count(), 0);
    }

    #[test]
    fn test_classification_is_total() {
        // Every tuple over four symbols covers every equality pattern.
        let alphabet = [-3, 1, 2, 3];
        let mut seen = [false; 20];
        for a in alphabet {
            for b in alphabet {
                for c in alphabet {
                    for d in alphabet {
                        let topo = classify_square([a, b, c, d]);
                        seen[topo.index()] = true;
                        let distinct = {
                            let mut v = vec![a, b, c, d];
                            v.sort_unstable();
                            v.dedup();
                            v.len()
                        };
                        assert_eq!(topo == SquareTopology::T19, distinct == 4);
                        if topo.is_ambiguous() {
                            assert!(a == c && b == d && a != b);
                        }
                    }
                }
            }
        }
        // T16 only arises from ambiguity resolution; the impossible bit
        // patterns (exactly one differing side) never occur.
        for unreachable in [1, 2, 4, 8, 16] {
            assert!(!seen[unreachable], "index {unreachable} reached");
        }
    }

    #[test]
    fn test_diagonal_cases() {
        assert_eq!(classify_square([1, 2, 1, 3]), SquareTopology::T17);
        assert_eq!(classify_square([1, 2, 3, 2]), SquareTopology::T18);
        assert_eq!(classify_square([1, 2, 3, 4]), SquareTopology::T19);
        assert_eq!(classify_square([1, 2, 1, 2]), SquareTopology::T15);
    }

    #[test]
    fn test_edges_separate_their_pixels() {
        // Every emitted segment must separate two corners of different label
        // for any labelling that produces its configuration.
        let alphabet = [-3, 1, 2, 3];
        for a in alphabet {
            for b in alphabet {
                for c in alphabet {
                    for d in alphabet {
                        let labels = [a, b, c, d];
                        let topo = classify_square(labels);
                        for edge in topo.edges() {
                            let [p, q] = edge.pixels;
                            assert_ne!(labels[p as usize], labels[q as usize], "{topo:?} {labels:?}");
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_face_center_cases() {
        let with_center: Vec<_> = SquareTopology::ALL
            .into_iter()
            .filter(|t| t.edges().any(|e| e.nodes.contains(&FACE_CENTER)))
            .collect();
        assert_eq!(
            with_center,
            vec![
                SquareTopology::T7,
                SquareTopology::T11,
                SquareTopology::T13,
                SquareTopology::T14,
                SquareTopology::T19
            ]
        );
        for topo in with_center {
            assert!(topo.face_center_materials().is_some());
        }
    }
}
