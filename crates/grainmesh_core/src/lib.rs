//! # GRAINMESH Core Engine
//!
//! Streaming multi-label marching cubes. Converts a voxel field of material
//! labels into a triangulated interface mesh, resolving the junctions where
//! three or four materials meet.
//!
//! ## Architecture Rules
//!
//! 1. **Two planes in memory** - the window never holds more than the previous
//!    and the current slice
//! 2. **Deterministic output** - identical input yields identical records
//! 3. **Explicit state** - node IDs and triangle indices are threaded through
//!    [`SliceMesher`], never global
//!
//! ## Example
//!
//! ```rust,ignore
//! use grainmesh_core::{LabelSource, LabelVolume, MeshOptions, SliceMesher};
//!
//! let mut volume = LabelVolume::from_fn([4, 4, 4], |_, _, _| 1);
//! let mut mesher = SliceMesher::new(volume.header(), MeshOptions::default())?;
//! // feed planes with mesher.mesh_slice(Some(plane)), then mesh_slice(None)
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod classify;
pub mod cube;
pub mod edges;
pub mod engine;
pub mod error;
pub mod grid;
pub mod loops;
pub mod neighbors;
pub mod nodes;
pub mod options;
pub mod orient;
pub mod records;
pub mod source;
pub mod topology;
pub mod window;

pub use cube::CellStats;
pub use edges::{EdgePlacement, ExtractStats, Segment};
pub use engine::{SliceMesher, SliceReport};
pub use error::{MeshError, MeshResult, TopologyFault};
pub use grid::{GridIndex, LatticeFrame};
pub use nodes::{NodeKind, NodeSlot};
pub use options::{AnomalyNeighborhood, MeshOptions};
pub use records::{
    MemorySink, MeshSink, NodeRecord, SliceBatch, TriangleRecord, NODE_RECORD_SIZE,
    TRIANGLE_RECORD_SIZE,
};
pub use source::{LabelSource, LabelVolume, VolumeHeader};
pub use topology::{classify_square, SquareTopology};
pub use window::EXTERIOR_LABEL;
