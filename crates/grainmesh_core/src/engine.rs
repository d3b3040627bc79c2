//! # Slice Engine
//!
//! Owns every per-window structure and runs the fixed per-slice pipeline:
//!
//! ```text
//! advance window ─► extract segments ─► triangulate cells ─► orient
//!       ─► number new nodes ─► build SliceBatch
//! ```
//!
//! A volume of `nz` planes takes `nz + 1` slices: slice `k < nz` loads plane
//! `k` as the current plane, and the final slice loads nothing so the top of
//! the volume is closed against the exterior.

use crate::cube::{CellStats, CubeAssembler};
use crate::edges::{ExtractStats, SquareField};
use crate::error::{MeshError, MeshResult, TopologyFault};
use crate::grid::GridIndex;
use crate::loops::Patch;
use crate::neighbors::NeighborTable;
use crate::nodes::NodeTable;
use crate::options::MeshOptions;
use crate::orient::orient_patches;
use crate::records::{NodeRecord, SliceBatch, TriangleRecord};
use crate::source::VolumeHeader;
use crate::window::LabelWindow;

/// Per-slice counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SliceReport {
    /// Slice index.
    pub slice: usize,
    /// Square and segment counters.
    pub extract: ExtractStats,
    /// Cells per triangulation case.
    pub cells: CellStats,
}

/// Streaming surface extractor over a two-plane window.
pub struct SliceMesher {
    header: VolumeHeader,
    options: MeshOptions,
    window: LabelWindow,
    neighbors: NeighborTable,
    nodes: NodeTable,
    field: SquareField,
    assembler: CubeAssembler,
    patches: Vec<Patch>,
    next_slice: usize,
    next_id: i32,
    next_triangle: i32,
    ghost_layer: bool,
}

impl SliceMesher {
    /// Creates a mesher for a volume.
    ///
    /// # Errors
    ///
    /// [`MeshError::InvalidVolume`] for an invalid header or a window too
    /// large to index.
    pub fn new(header: &VolumeHeader, options: MeshOptions) -> MeshResult<Self> {
        header.validate()?;
        let grid = GridIndex::new(header.dims[0], header.dims[1]);
        Ok(Self {
            header: *header,
            options,
            window: LabelWindow::new(grid),
            neighbors: NeighborTable::new(&grid)?,
            nodes: NodeTable::new(grid, header.frame()),
            field: SquareField::new(grid),
            assembler: CubeAssembler::new(),
            patches: Vec::new(),
            next_slice: 0,
            next_id: 0,
            next_triangle: 0,
            ghost_layer: true,
        })
    }

    /// Total number of slices (`nz + 1`).
    #[must_use]
    pub const fn slice_count(&self) -> usize {
        self.header.dims[2] + 1
    }

    /// Index of the next slice to process.
    #[must_use]
    pub const fn next_slice(&self) -> usize {
        self.next_slice
    }

    /// Whether every slice has been processed.
    #[must_use]
    pub const fn is_finished(&self) -> bool {
        self.next_slice >= self.slice_count()
    }

    /// Whether the next slice expects an input plane.
    #[must_use]
    pub const fn needs_plane(&self) -> bool {
        self.next_slice < self.header.dims[2]
    }

    /// Volume header.
    #[must_use]
    pub const fn header(&self) -> &VolumeHeader {
        &self.header
    }

    /// Nodes numbered so far.
    #[must_use]
    pub const fn nodes_numbered(&self) -> i32 {
        self.next_id
    }

    /// Triangles emitted so far.
    #[must_use]
    pub const fn triangles_emitted(&self) -> i32 {
        self.next_triangle
    }

    /// Whether every input plane seen so far kept the volume's outer shell
    /// exterior.
    ///
    /// Such a volume already carries its own ghost layer. The window pads it
    /// regardless; exterior labels on both sides of the padding produce no
    /// surface, so the mesh is the same one an unpadded pass would give.
    #[must_use]
    pub const fn has_ghost_layer(&self) -> bool {
        self.ghost_layer
    }

    /// Processes the next slice.
    ///
    /// `plane` must hold the next input plane while [`Self::needs_plane`] is
    /// true and be `None` for the closing slice.
    ///
    /// # Errors
    ///
    /// [`MeshError::InvalidVolume`] for a missing, surplus or mis-sized
    /// plane, and [`MeshError::Topology`] for inconsistent cells.
    pub fn mesh_slice(&mut self, plane: Option<&[i32]>) -> MeshResult<(SliceBatch, SliceReport)> {
        let slice = self.next_slice;
        if self.is_finished() {
            return Err(MeshError::InvalidVolume(format!(
                "all {} slices already processed",
                self.slice_count()
            )));
        }
        if plane.is_some() != self.needs_plane() {
            return Err(MeshError::InvalidVolume(format!(
                "slice {slice} {} an input plane",
                if self.needs_plane() { "requires" } else { "takes no" }
            )));
        }

        self.window.advance(plane)?;
        if let Some(plane) = plane {
            self.ghost_layer &= self.header.shell_is_exterior(slice, plane);
        }
        if slice > 0 {
            self.nodes.advance();
            self.field.advance();
        }

        let extract = self.field.extract(
            &self.window,
            &self.neighbors,
            &mut self.nodes,
            self.options.anomaly_neighborhood,
        );
        self.patches.clear();
        let cells = self.assembler.triangulate(
            &self.field,
            &self.window,
            &mut self.nodes,
            &mut self.patches,
            slice,
        )?;
        orient_patches(&mut self.patches, &self.nodes, &self.window, slice)?;

        let first_id = self.next_id;
        self.next_id = self.nodes.assign_ids(first_id);
        let nodes = self
            .nodes
            .numbered_since(first_id)
            .map(|(id, node)| NodeRecord {
                id,
                kind: node.kind.code(),
                position: node.position,
            })
            .collect();

        let mut triangles = Vec::with_capacity(self.patches.len());
        for patch in &self.patches {
            let mut ids = [0; 3];
            for (id, &node) in ids.iter_mut().zip(&patch.nodes) {
                *id = self.nodes.get(node).id.ok_or(MeshError::Topology {
                    slice,
                    site: NodeTable::site_of(node),
                    fault: TopologyFault::UnassignedNode(node),
                })?;
            }
            triangles.push(TriangleRecord {
                index: self.next_triangle,
                nodes: ids,
                labels: patch.labels,
            });
            self.next_triangle += 1;
        }

        self.next_slice += 1;
        Ok((
            SliceBatch {
                slice,
                nodes,
                triangles,
            },
            SliceReport {
                slice,
                extract,
                cells,
            },
        ))
    }
}
