//! # Cube Assembly
//!
//! Walks every cell of the window, gathers the segments of its six faces and
//! dispatches on the number of active face centres:
//!
//! | face centres | treatment |
//! |---|---|
//! | 0 | closed chains, each fanned on its own |
//! | 2 | chains run between the two face centres, fanned open |
//! | 3..=6 | the body centre joins every open chain |
//!
//! A single active face centre cannot be produced by consistent labels and
//! is reported as a topology error.

use crate::edges::{SquareField, SquareOrientation};
use crate::error::{MeshError, MeshResult, TopologyFault};
use crate::grid::{Axis, GridIndex};
use crate::loops::{fan_body_center, fan_closed, fan_open, LoopTracer, Patch};
use crate::nodes::{NodeKind, NodeSlot, NodeTable};
use crate::window::LabelWindow;

/// Cells processed per triangulation case.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CellStats {
    /// Cells without active face centres.
    pub closed: usize,
    /// Cells with two active face centres.
    pub two_centers: usize,
    /// Cells triangulated around their body centre.
    pub body_center: usize,
}

/// Turns extracted segments into triangles, cell by cell.
#[derive(Default)]
pub struct CubeAssembler {
    tracer: LoopTracer,
    centers: Vec<usize>,
}

impl CubeAssembler {
    /// Creates an assembler with empty scratch buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Triangulates every cell anchored in plane 0.
    ///
    /// `slice` only labels errors.
    ///
    /// # Errors
    ///
    /// [`MeshError::Topology`] when a cell's chains cannot be triangulated.
    pub fn triangulate(
        &mut self,
        field: &SquareField,
        window: &LabelWindow,
        nodes: &mut NodeTable,
        patches: &mut Vec<Patch>,
        slice: usize,
    ) -> MeshResult<CellStats> {
        let grid = *window.grid();
        let mut stats = CellStats::default();
        for site in grid.plane_sites(0) {
            if grid.on_far_edge(site) {
                continue;
            }
            self.cell(&grid, site, field, window, nodes, patches, &mut stats)
                .map_err(|fault| MeshError::Topology { slice, site, fault })?;
        }
        Ok(stats)
    }

    #[allow(clippy::too_many_arguments)]
    fn cell(
        &mut self,
        grid: &GridIndex,
        site: usize,
        field: &SquareField,
        window: &LabelWindow,
        nodes: &mut NodeTable,
        patches: &mut Vec<Patch>,
        stats: &mut CellStats,
    ) -> Result<(), TopologyFault> {
        let x = grid.stride(Axis::X);
        let y = grid.stride(Axis::Y);
        let z = grid.stride(Axis::Z);
        let faces = [
            field.square(site, SquareOrientation::Xy),
            field.square(site, SquareOrientation::Xz),
            field.square(site, SquareOrientation::Yz),
            field.square(site + x, SquareOrientation::Yz),
            field.square(site + y, SquareOrientation::Xz),
            field.square(site + z, SquareOrientation::Xy),
        ];
        if !faces.iter().any(|face| face.effect) {
            return Ok(());
        }

        self.tracer.begin();
        self.centers.clear();
        for face in faces {
            self.tracer.extend(field.segments_of(face));
            if let Some(center) = face.face_center {
                self.centers.push(center);
            }
        }
        if self.tracer.len() <= 2 {
            return Ok(());
        }

        match self.centers.len() {
            0 => {
                self.tracer.trace(&[], false)?;
                for (chain, _) in self.tracer.chains() {
                    fan_closed(chain, patches)?;
                }
                stats.closed += 1;
            }
            1 => return Err(TopologyFault::LonelyFaceCenter),
            2 => {
                self.tracer.trace(&self.centers, true)?;
                for (chain, open) in self.tracer.chains() {
                    if open {
                        fan_open(chain, patches)?;
                    } else {
                        fan_closed(chain, patches)?;
                    }
                }
                stats.two_centers += 1;
            }
            _ => {
                self.tracer.trace(&self.centers, true)?;
                let body = NodeTable::index(site, NodeSlot::Body);
                nodes.set_kind(body, NodeKind::BodyCenter(distinct_corner_labels(grid, site, window)));
                for (chain, open) in self.tracer.chains() {
                    if open {
                        fan_body_center(chain, body, patches);
                    } else {
                        fan_closed(chain, patches)?;
                    }
                }
                stats.body_center += 1;
            }
        }
        Ok(())
    }
}

/// Number of distinct labels on the eight corners of a cell.
fn distinct_corner_labels(grid: &GridIndex, site: usize, window: &LabelWindow) -> u8 {
    let bottom = SquareOrientation::Xy.corners(grid, site);
    let top = SquareOrientation::Xy.corners(grid, site + grid.stride(Axis::Z));
    let mut seen = [0i32; 8];
    let mut count = 0;
    for corner in bottom.into_iter().chain(top) {
        let label = window.label(corner);
        if !seen[..count].contains(&label) {
            seen[count] = label;
            count += 1;
        }
    }
    count as u8
}
