//! # GRAINMESH
//!
//! Streaming surface meshing for segmented (multi-label) volumes.
//!
//! [`SurfaceMesher`] pulls z-planes from a [`LabelSource`], pushes them
//! through the two-plane [`SliceMesher`] and hands every slice's records to a
//! [`MeshSink`]. [`run`] wires a VTK reader and the record files together
//! from a [`MesherConfig`].
//!
//! ## Example
//!
//! ```rust,ignore
//! use grainmesh::{MeshOptions, SurfaceMesher};
//! use grainmesh_core::{LabelVolume, MemorySink};
//!
//! let volume = LabelVolume::from_fn([8, 8, 8], |x, _, _| 1 + (x / 4) as i32);
//! let mut sink = MemorySink::new();
//! let stats = SurfaceMesher::new(volume, MeshOptions::default()).run(&mut sink)?;
//! println!("{} triangles", stats.triangles);
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod inspect;
pub mod pipeline;

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use grainmesh_core::{CellStats, SliceBatch, SliceMesher, SliceReport};
use grainmesh_io::{RecordFileSink, VtkLabelReader};

pub use config::MesherConfig;
pub use grainmesh_core::{
    AnomalyNeighborhood, LabelSource, MeshError, MeshOptions, MeshResult, MeshSink,
};
pub use inspect::MeshReport;
pub use pipeline::PipelinedSink;

/// Totals gathered over a whole run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MeshStats {
    /// Slices processed.
    pub slices: usize,
    /// Node records written.
    pub nodes: usize,
    /// Triangle records written.
    pub triangles: usize,
    /// Nodes written per kind code.
    pub node_kinds: BTreeMap<i32, usize>,
    /// Segments per placement (lower, mid, upper).
    pub segments: [usize; 3],
    /// Cells per triangulation case.
    pub cells: CellStats,
    /// Checkerboard squares resolved.
    pub resolved_checkerboards: usize,
    /// Whether the input already carried an exterior shell of its own.
    pub ghost_layer: bool,
}

impl MeshStats {
    fn record(&mut self, batch: &SliceBatch, report: &SliceReport) {
        self.slices += 1;
        self.nodes += batch.nodes.len();
        self.triangles += batch.triangles.len();
        for node in &batch.nodes {
            *self.node_kinds.entry(node.kind).or_default() += 1;
        }
        for (total, count) in self.segments.iter_mut().zip(report.extract.segments) {
            *total += count;
        }
        self.cells.closed += report.cells.closed;
        self.cells.two_centers += report.cells.two_centers;
        self.cells.body_center += report.cells.body_center;
        self.resolved_checkerboards += report.extract.resolved_checkerboards;
    }

    /// Nodes of one kind code.
    #[must_use]
    pub fn nodes_of_kind(&self, code: i32) -> usize {
        self.node_kinds.get(&code).copied().unwrap_or(0)
    }
}

/// Drives a label source through the slice engine into a sink.
pub struct SurfaceMesher<S: LabelSource> {
    source: S,
    options: MeshOptions,
    cancel: Arc<AtomicBool>,
}

impl<S: LabelSource> SurfaceMesher<S> {
    /// Creates a mesher over `source`.
    pub fn new(source: S, options: MeshOptions) -> Self {
        Self {
            source,
            options,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Replaces the cancellation flag with a shared one.
    #[must_use]
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = flag;
        self
    }

    /// Flag that stops the run before the next slice when set.
    #[must_use]
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    /// The wrapped source.
    pub const fn source(&self) -> &S {
        &self.source
    }

    /// Meshes the whole volume, writing each slice to `sink`.
    ///
    /// # Errors
    ///
    /// The first error from the source or the engine, a sink error wrapped
    /// in [`MeshError::Sink`], or [`MeshError::Cancelled`] if the flag was
    /// raised.
    pub fn run<K: MeshSink + ?Sized>(&mut self, sink: &mut K) -> MeshResult<MeshStats> {
        let header = *self.source.header();
        let mut mesher = SliceMesher::new(&header, self.options)?;
        let mut plane = vec![0; header.plane_len()];
        let mut stats = MeshStats::default();
        let started = Instant::now();

        tracing::info!(
            dims = ?header.dims,
            spacing = ?header.spacing,
            slices = mesher.slice_count(),
            anomaly = ?self.options.anomaly_neighborhood,
            "meshing started"
        );

        while !mesher.is_finished() {
            let slice = mesher.next_slice();
            if self.cancel.load(Ordering::Relaxed) {
                tracing::warn!(slice, "meshing cancelled");
                return Err(MeshError::Cancelled { slice });
            }
            let input = if mesher.needs_plane() {
                self.source.read_plane(slice, &mut plane)?;
                Some(plane.as_slice())
            } else {
                None
            };

            let (batch, report) = mesher.mesh_slice(input)?;
            tracing::debug!(
                slice,
                segments = ?report.extract.segments,
                closed = report.cells.closed,
                two_centers = report.cells.two_centers,
                body_center = report.cells.body_center,
                triangles = batch.triangles.len(),
                new_nodes = batch.nodes.len(),
                "slice meshed"
            );
            stats.record(&batch, &report);
            sink.write_slice(batch).map_err(|e| e.in_sink(slice))?;
        }
        sink.finish().map_err(|e| e.in_sink(mesher.slice_count() - 1))?;
        stats.ghost_layer = mesher.has_ghost_layer();

        tracing::info!(
            slices = stats.slices,
            nodes = stats.nodes,
            triangles = stats.triangles,
            ghost_layer = stats.ghost_layer,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "meshing finished"
        );
        Ok(stats)
    }
}

/// Meshes the configured VTK volume into the configured record files.
///
/// The input header is parsed before either output file is touched.
///
/// # Errors
///
/// Configuration, parse, I/O and topology errors as [`MeshError`].
pub fn run(config: &MesherConfig) -> MeshResult<MeshStats> {
    config.validate()?;
    let reader = VtkLabelReader::open(&config.input)?;
    let mut mesher = SurfaceMesher::new(reader, config.meshing);
    let files = RecordFileSink::new(&config.nodes_file, &config.triangles_file);

    if config.pipelined {
        let mut sink = PipelinedSink::spawn(Box::new(files), config.channel_capacity)?;
        mesher.run(&mut sink)
    } else {
        let mut sink = files;
        mesher.run(&mut sink)
    }
}
