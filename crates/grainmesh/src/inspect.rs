//! # Mesh Inspection
//!
//! Reads a finished pair of record streams back and checks the invariants
//! every mesh must satisfy: dense node IDs and triangle indices, triangles
//! that reference existing nodes, label pairs that separate two materials,
//! and nodes that are actually used.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use grainmesh_core::{MeshResult, NodeKind, NodeRecord, TriangleRecord};
use grainmesh_io::{read_nodes, read_triangles};

/// Defects recorded per report before further ones are only counted.
const MAX_LISTED_DEFECTS: usize = 32;

/// One violated mesh invariant.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Defect {
    /// Node at `position` in the stream does not carry ID `position`.
    NodeIdGap {
        /// Stream position.
        position: usize,
        /// ID found.
        id: i32,
    },
    /// Triangle at `position` does not carry index `position`.
    TriangleIndexGap {
        /// Stream position.
        position: usize,
        /// Index found.
        index: i32,
    },
    /// Triangle references an ID outside the node stream.
    DanglingNode {
        /// Triangle index.
        triangle: i32,
        /// Referenced ID.
        node: i32,
    },
    /// Triangle uses the same node twice.
    RepeatedNode {
        /// Triangle index.
        triangle: i32,
    },
    /// Label pair is not two distinct labels with at least one material.
    BadLabels {
        /// Triangle index.
        triangle: i32,
        /// Labels carried.
        labels: [i32; 2],
    },
    /// Node never referenced by a triangle.
    UnreferencedNode {
        /// Node ID.
        id: i32,
    },
    /// Kind code outside the known set.
    UnknownKind {
        /// Node ID.
        id: i32,
        /// Code found.
        kind: i32,
    },
}

impl fmt::Display for Defect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NodeIdGap { position, id } => {
                write!(f, "node #{position} carries id {id}")
            }
            Self::TriangleIndexGap { position, index } => {
                write!(f, "triangle #{position} carries index {index}")
            }
            Self::DanglingNode { triangle, node } => {
                write!(f, "triangle {triangle} references missing node {node}")
            }
            Self::RepeatedNode { triangle } => {
                write!(f, "triangle {triangle} repeats a node")
            }
            Self::BadLabels { triangle, labels } => {
                write!(f, "triangle {triangle} has labels {labels:?}")
            }
            Self::UnreferencedNode { id } => write!(f, "node {id} is never used"),
            Self::UnknownKind { id, kind } => write!(f, "node {id} has kind {kind}"),
        }
    }
}

/// Summary and invariant check of a mesh.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MeshReport {
    /// Node records read.
    pub nodes: usize,
    /// Triangle records read.
    pub triangles: usize,
    /// Nodes per kind code.
    pub kinds: BTreeMap<i32, usize>,
    /// Triangles per unordered label pair (smaller label first).
    pub label_pairs: BTreeMap<(i32, i32), usize>,
    /// First defects found.
    pub defects: Vec<Defect>,
    /// Total defects, including those not listed.
    pub defect_count: usize,
}

impl MeshReport {
    /// Inspects records already in memory.
    #[must_use]
    pub fn from_records(nodes: &[NodeRecord], triangles: &[TriangleRecord]) -> Self {
        let mut report = Self {
            nodes: nodes.len(),
            triangles: triangles.len(),
            ..Self::default()
        };

        for (position, node) in nodes.iter().enumerate() {
            if usize::try_from(node.id).ok() != Some(position) {
                report.flag(Defect::NodeIdGap {
                    position,
                    id: node.id,
                });
            }
            if NodeKind::from_code(node.kind).map_or(true, |kind| !kind.is_used()) {
                report.flag(Defect::UnknownKind {
                    id: node.id,
                    kind: node.kind,
                });
            }
            *report.kinds.entry(node.kind).or_default() += 1;
        }

        let mut referenced = vec![false; nodes.len()];
        for (position, tri) in triangles.iter().enumerate() {
            if usize::try_from(tri.index).ok() != Some(position) {
                report.flag(Defect::TriangleIndexGap {
                    position,
                    index: tri.index,
                });
            }
            for &node in &tri.nodes {
                match usize::try_from(node).ok().filter(|&n| n < nodes.len()) {
                    Some(n) => referenced[n] = true,
                    None => report.flag(Defect::DanglingNode {
                        triangle: tri.index,
                        node,
                    }),
                }
            }
            let [a, b, c] = tri.nodes;
            if a == b || b == c || a == c {
                report.flag(Defect::RepeatedNode {
                    triangle: tri.index,
                });
            }
            let [l0, l1] = tri.labels;
            if l0 == l1 || (l0 <= 0 && l1 <= 0) {
                report.flag(Defect::BadLabels {
                    triangle: tri.index,
                    labels: tri.labels,
                });
            }
            *report
                .label_pairs
                .entry((l0.min(l1), l0.max(l1)))
                .or_default() += 1;
        }

        for (id, used) in referenced.into_iter().enumerate() {
            if !used {
                report.flag(Defect::UnreferencedNode { id: id as i32 });
            }
        }
        report
    }

    /// Reads and inspects a pair of record files.
    ///
    /// # Errors
    ///
    /// Any error from [`read_nodes`] or [`read_triangles`].
    pub fn from_files(
        nodes_path: impl AsRef<Path>,
        triangles_path: impl AsRef<Path>,
    ) -> MeshResult<Self> {
        let nodes = read_nodes(nodes_path)?;
        let triangles = read_triangles(triangles_path)?;
        Ok(Self::from_records(&nodes, &triangles))
    }

    /// Whether no invariant is violated.
    #[must_use]
    pub const fn is_consistent(&self) -> bool {
        self.defect_count == 0
    }

    /// Distinct material labels appearing on triangles.
    #[must_use]
    pub fn materials(&self) -> Vec<i32> {
        let mut labels: Vec<i32> = self
            .label_pairs
            .keys()
            .flat_map(|&(a, b)| [a, b])
            .filter(|&l| l > 0)
            .collect();
        labels.sort_unstable();
        labels.dedup();
        labels
    }

    fn flag(&mut self, defect: Defect) {
        self.defect_count += 1;
        if self.defects.len() < MAX_LISTED_DEFECTS {
            self.defects.push(defect);
        }
    }
}

impl fmt::Display for MeshReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "nodes:      {}", self.nodes)?;
        writeln!(f, "triangles:  {}", self.triangles)?;
        writeln!(f, "materials:  {}", self.materials().len())?;
        writeln!(f, "interfaces: {}", self.label_pairs.len())?;
        writeln!(f, "node kinds:")?;
        for (kind, count) in &self.kinds {
            writeln!(f, "  {kind:>4}: {count}")?;
        }
        if self.is_consistent() {
            write!(f, "consistent")
        } else {
            writeln!(f, "{} defect(s):", self.defect_count)?;
            for defect in &self.defects {
                writeln!(f, "  {defect}")?;
            }
            if self.defect_count > self.defects.len() {
                write!(f, "  ...")?;
            }
            Ok(())
        }
    }
}
