//! # GRAINMESH IO
//!
//! File formats around the mesher: the legacy VTK label volumes it reads and
//! the node and triangle record streams it writes.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod record_file;
pub mod vtk;

pub use record_file::{read_nodes, read_triangles, RecordFileSink};
pub use vtk::{write_label_volume, Encoding, ScalarType, VtkHeader, VtkLabelReader};
