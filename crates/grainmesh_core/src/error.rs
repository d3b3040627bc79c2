//! # Mesh Error Types
//!
//! All errors that can occur while reading a label volume, extracting the
//! surface mesh, or writing the node and triangle streams.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur anywhere in the meshing pipeline.
#[derive(Error, Debug)]
pub enum MeshError {
    /// Malformed volume header or payload. Fatal before slicing starts.
    #[error("malformed volume file: {0}")]
    Parse(String),

    /// An I/O operation failed.
    #[error("i/o error on {}: {source}", path.display())]
    Io {
        /// File being read or written.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A record stream accepted fewer bytes than requested.
    #[error("short write on {}: wrote {written} of {expected} bytes", path.display())]
    ShortWrite {
        /// File being written.
        path: PathBuf,
        /// Bytes accepted before the failure.
        written: usize,
        /// Bytes requested.
        expected: usize,
    },

    /// Edge chains inside a cell could not be turned into triangles.
    #[error("topology error in slice {slice} at site {site}: {fault}")]
    Topology {
        /// Slice being processed.
        slice: usize,
        /// Window site index of the offending cell.
        site: usize,
        /// What went wrong.
        fault: TopologyFault,
    },

    /// The label source does not match its own header.
    #[error("invalid volume: {0}")]
    InvalidVolume(String),

    /// Invalid configuration file or option.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The sink failed while taking a slice's records.
    #[error("sink failed at slice {slice}: {source}")]
    Sink {
        /// Slice being written when the failure surfaced.
        slice: usize,
        /// Underlying sink error.
        #[source]
        source: Box<MeshError>,
    },

    /// The run was cancelled between slices.
    #[error("cancelled before slice {slice}")]
    Cancelled {
        /// First slice that was not processed.
        slice: usize,
    },
}

/// Internal inconsistencies detected while triangulating a cell.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopologyFault {
    /// A chain without face-centre anchors did not return to its start.
    #[error("edge chain does not close")]
    UnclosedLoop,
    /// The traversal could not visit every edge of a component.
    #[error("edge chain branches or breaks")]
    BrokenChain,
    /// Exactly one face centre is active in the cell.
    #[error("single active face centre")]
    LonelyFaceCenter,
    /// A loop too short to span a triangle.
    #[error("loop of {0} edges cannot be triangulated")]
    DegenerateLoop(usize),
    /// The lattice sites beside a triangle carry labels other than its pair.
    #[error("triangle labels ({expected:?}) disagree with grid labels ({found:?})")]
    LabelMismatch {
        /// Label pair carried by the triangle.
        expected: [i32; 2],
        /// Labels read from the grid.
        found: [i32; 2],
    },
    /// A triangle references a node that never received an ID.
    #[error("triangle references unnumbered node {0}")]
    UnassignedNode(usize),
}

/// Result type for mesh operations.
pub type MeshResult<T> = Result<T, MeshError>;

impl MeshError {
    /// Wraps an I/O error with the path it occurred on.
    #[must_use]
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Attaches the slice a sink was writing when it failed.
    #[must_use]
    pub fn in_sink(self, slice: usize) -> Self {
        Self::Sink {
            slice,
            source: Box::new(self),
        }
    }
}
