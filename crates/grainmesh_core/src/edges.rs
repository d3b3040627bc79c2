//! # Edge Extraction
//!
//! Classifies the face squares of the window and emits the interface
//! segments each configuration prescribes.
//!
//! Plane 0 squares are classified in all three orientations; plane 1 squares
//! only as `Xy`, since their vertical squares belong to the next slice. The
//! segments of one square are stored contiguously so cells can gather them
//! without copying the square itself.

use crate::classify::classify_corners;
use crate::grid::{Axis, GridIndex};
use crate::neighbors::NeighborTable;
use crate::nodes::{NodeKind, NodeSlot, NodeTable};
use crate::options::AnomalyNeighborhood;
use crate::topology::{SquareTopology, FACE_CENTER};
use crate::window::LabelWindow;

/// Orientation of a face square.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SquareOrientation {
    /// Spans +x and +y.
    Xy = 0,
    /// Spans +x and +z.
    Xz = 1,
    /// Spans +y and +z.
    Yz = 2,
}

impl SquareOrientation {
    /// All orientations in storage order.
    pub const ALL: [Self; 3] = [Self::Xy, Self::Xz, Self::Yz];

    /// Corner sites of the square anchored at `site`, in cyclic order.
    #[must_use]
    pub fn corners(self, grid: &GridIndex, site: usize) -> [usize; 4] {
        let x = grid.stride(Axis::X);
        let y = grid.stride(Axis::Y);
        let z = grid.stride(Axis::Z);
        match self {
            Self::Xy => [site, site + x, site + x + y, site + y],
            Self::Xz => [site, site + x, site + x + z, site + z],
            Self::Yz => [site + y, site, site + z, site + z + y],
        }
    }

    /// Node index of local node `local` (0..=4) of the square at `site`.
    #[must_use]
    pub fn local_node(self, grid: &GridIndex, site: usize, local: u8) -> usize {
        let x = grid.stride(Axis::X);
        let y = grid.stride(Axis::Y);
        let z = grid.stride(Axis::Z);
        let (owner, slot) = match (self, local) {
            (Self::Xy, 0) => (site, NodeSlot::EdgeX),
            (Self::Xy, 1) => (site + x, NodeSlot::EdgeY),
            (Self::Xy, 2) => (site + y, NodeSlot::EdgeX),
            (Self::Xy, 3) => (site, NodeSlot::EdgeY),
            (Self::Xy, _) => (site, NodeSlot::FaceXy),
            (Self::Xz, 0) => (site, NodeSlot::EdgeX),
            (Self::Xz, 1) => (site + x, NodeSlot::EdgeZ),
            (Self::Xz, 2) => (site + z, NodeSlot::EdgeX),
            (Self::Xz, 3) => (site, NodeSlot::EdgeZ),
            (Self::Xz, _) => (site, NodeSlot::FaceXz),
            (Self::Yz, 0) => (site, NodeSlot::EdgeY),
            (Self::Yz, 1) => (site, NodeSlot::EdgeZ),
            (Self::Yz, 2) => (site + z, NodeSlot::EdgeY),
            (Self::Yz, 3) => (site + y, NodeSlot::EdgeZ),
            (Self::Yz, _) => (site, NodeSlot::FaceYz),
        };
        NodeTable::index(owner, slot)
    }
}

/// Vertical position of a segment within the window.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EdgePlacement {
    /// In plane 0.
    Lower = 0,
    /// On a vertical square between the planes.
    Mid = 1,
    /// In plane 1.
    Upper = 2,
}

/// Directed interface segment between two nodes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Segment {
    /// Start node.
    pub tail: usize,
    /// End node.
    pub head: usize,
    /// Materials on either side.
    pub labels: [i32; 2],
    /// Where the segment lies.
    pub placement: EdgePlacement,
}

impl Segment {
    /// The same segment walked the other way.
    #[inline]
    #[must_use]
    pub const fn reversed(self) -> Self {
        Self {
            tail: self.head,
            head: self.tail,
            labels: [self.labels[1], self.labels[0]],
            placement: self.placement,
        }
    }

    /// Whether both segments separate the same pair of materials.
    #[inline]
    #[must_use]
    pub const fn same_interface(&self, other: &Self) -> bool {
        let [a, b] = self.labels;
        let [c, d] = other.labels;
        (a == c && b == d) || (a == d && b == c)
    }

    /// Whether `node` is one of the endpoints.
    #[inline]
    #[must_use]
    pub const fn touches(&self, node: usize) -> bool {
        self.tail == node || self.head == node
    }
}

/// Per-square extraction result.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FaceSquare {
    /// Configuration, `None` if the square was not classified.
    pub topology: Option<SquareTopology>,
    /// Whether any corner holds a real material.
    pub effect: bool,
    /// Active face-centre node.
    pub face_center: Option<usize>,
    resolved: bool,
    first_segment: usize,
    segment_count: usize,
}

/// Counters gathered during one extraction pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ExtractStats {
    /// Squares with effect.
    pub squares: usize,
    /// Segments per [`EdgePlacement`].
    pub segments: [usize; 3],
    /// Checkerboards resolved.
    pub resolved_checkerboards: usize,
}

/// All face squares of the window and their segments.
///
/// A checkerboard Xy square is split once, while it is in the current plane.
/// The split is carried into the previous plane so that the cells below and
/// above the square stitch against the same segments.
pub struct SquareField {
    grid: GridIndex,
    squares: Vec<FaceSquare>,
    segments: Vec<Segment>,
    carried: Vec<Option<SquareTopology>>,
}

impl SquareField {
    /// Creates an empty field for a window geometry.
    #[must_use]
    pub fn new(grid: GridIndex) -> Self {
        Self {
            grid,
            squares: vec![FaceSquare::default(); grid.window_len() * 3],
            segments: Vec::new(),
            carried: vec![None; grid.plane_len()],
        }
    }

    /// Moves the checkerboard splits of the current plane's Xy squares to
    /// the previous plane. Call after the window advances.
    pub fn advance(&mut self) {
        let plane_len = self.grid.plane_len();
        for (offset, slot) in self.carried.iter_mut().enumerate() {
            let square = &self.squares[(plane_len + offset) * 3 + SquareOrientation::Xy as usize];
            *slot = if square.resolved { square.topology } else { None };
        }
    }

    /// Split carried over for the Xy square at `site` of the previous plane.
    #[inline]
    #[must_use]
    pub fn carried_split(&self, site: usize) -> Option<SquareTopology> {
        self.carried.get(site).copied().flatten()
    }

    /// Square anchored at `site` with the given orientation.
    #[inline]
    #[must_use]
    pub fn square(&self, site: usize, orientation: SquareOrientation) -> &FaceSquare {
        &self.squares[site * 3 + orientation as usize]
    }

    /// Segments emitted by a square.
    #[inline]
    #[must_use]
    pub fn segments_of(&self, square: &FaceSquare) -> &[Segment] {
        &self.segments[square.first_segment..square.first_segment + square.segment_count]
    }

    /// Every segment emitted in this pass.
    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Classifies every square of the window and emits its segments.
    ///
    /// Node kinds are promoted as segments touch them.
    pub fn extract(
        &mut self,
        window: &LabelWindow,
        neighbors: &NeighborTable,
        nodes: &mut NodeTable,
        neighborhood: AnomalyNeighborhood,
    ) -> ExtractStats {
        self.squares.fill(FaceSquare::default());
        self.segments.clear();
        let mut stats = ExtractStats::default();

        for plane in 0..2 {
            for site in self.grid.plane_sites(plane) {
                if self.grid.on_far_edge(site) {
                    continue;
                }
                let orientations: &[SquareOrientation] = if plane == 0 {
                    &SquareOrientation::ALL
                } else {
                    &SquareOrientation::ALL[..1]
                };
                for &orientation in orientations {
                    self.emit(site, orientation, window, neighbors, nodes, neighborhood, &mut stats);
                }
            }
        }
        stats
    }

    #[allow(clippy::too_many_arguments)]
    fn emit(
        &mut self,
        site: usize,
        orientation: SquareOrientation,
        window: &LabelWindow,
        neighbors: &NeighborTable,
        nodes: &mut NodeTable,
        neighborhood: AnomalyNeighborhood,
        stats: &mut ExtractStats,
    ) {
        let corners = orientation.corners(&self.grid, site);
        let Some(mut class) = classify_corners(window, neighbors, corners, neighborhood) else {
            return;
        };
        stats.squares += 1;
        let carried = match (orientation, self.grid.plane_of(site)) {
            (SquareOrientation::Xy, 0) => self.carried_split(site),
            _ => None,
        };
        match carried {
            Some(topology) if class.resolved => class.topology = topology,
            _ => stats.resolved_checkerboards += usize::from(class.resolved),
        }

        let placement = match (orientation, self.grid.plane_of(site)) {
            (SquareOrientation::Xy, 0) => EdgePlacement::Lower,
            (SquareOrientation::Xy, _) => EdgePlacement::Upper,
            _ => EdgePlacement::Mid,
        };
        let first_segment = self.segments.len();
        let mut face_center = None;

        for template in class.topology.edges() {
            let labels = template.pixels.map(|p| class.labels[usize::from(p)]);
            if labels[0] <= 0 && labels[1] <= 0 {
                continue;
            }
            let ends = template
                .nodes
                .map(|local| orientation.local_node(&self.grid, site, local));
            for (&local, &node) in template.nodes.iter().zip(&ends) {
                if local == FACE_CENTER {
                    let kind = match class.topology.face_center_materials() {
                        Some(4) => NodeKind::QuadruplePoint,
                        _ => NodeKind::TripleLine,
                    };
                    nodes.set_kind(node, kind);
                    face_center = Some(node);
                } else {
                    nodes.promote(node);
                }
            }
            self.segments.push(Segment {
                tail: ends[0],
                head: ends[1],
                labels,
                placement,
            });
            stats.segments[placement as usize] += 1;
        }

        self.squares[site * 3 + orientation as usize] = FaceSquare {
            topology: Some(class.topology),
            effect: true,
            face_center,
            resolved: class.resolved,
            first_segment,
            segment_count: self.segments.len() - first_segment,
        };
    }
}
