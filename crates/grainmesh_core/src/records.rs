//! # Output Records
//!
//! Fixed-layout node and triangle records, the per-slice batch that carries
//! them, and the [`MeshSink`] seam that consumes batches.
//!
//! Records are `#[repr(C)]` plain-old-data so a batch can be written with a
//! single byte cast. Byte order is the host's.

use bytemuck::{Pod, Zeroable};

use crate::error::MeshResult;

/// One numbered mesh node (32 bytes).
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct NodeRecord {
    /// Global node ID.
    pub id: i32,
    /// Node kind code (2, 3, 4 or `10 + n`).
    pub kind: i32,
    /// Physical position.
    pub position: [f64; 3],
}

/// One triangle (24 bytes).
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct TriangleRecord {
    /// Running triangle index across all slices.
    pub index: i32,
    /// Node IDs in winding order.
    pub nodes: [i32; 3],
    /// Material behind the normal, then material in front.
    pub labels: [i32; 2],
}

/// Size of a node record on disk.
pub const NODE_RECORD_SIZE: usize = std::mem::size_of::<NodeRecord>();

/// Size of a triangle record on disk.
pub const TRIANGLE_RECORD_SIZE: usize = std::mem::size_of::<TriangleRecord>();

const _: () = assert!(NODE_RECORD_SIZE == 32);
const _: () = assert!(TRIANGLE_RECORD_SIZE == 24);

/// Everything one slice contributes to the output streams.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SliceBatch {
    /// Slice index.
    pub slice: usize,
    /// Nodes numbered during this slice.
    pub nodes: Vec<NodeRecord>,
    /// Triangles emitted during this slice.
    pub triangles: Vec<TriangleRecord>,
}

/// Consumer of slice batches, called once per slice in order.
pub trait MeshSink {
    /// Accepts the output of one slice.
    ///
    /// # Errors
    ///
    /// Implementation-specific I/O errors.
    fn write_slice(&mut self, batch: SliceBatch) -> MeshResult<()>;

    /// Flushes and releases resources after the last slice.
    ///
    /// # Errors
    ///
    /// Implementation-specific I/O errors.
    fn finish(&mut self) -> MeshResult<()> {
        Ok(())
    }
}

/// Sink that keeps every batch in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    /// Batches in slice order.
    pub batches: Vec<SliceBatch>,
}

impl MemorySink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All node records in output order.
    pub fn nodes(&self) -> impl Iterator<Item = &NodeRecord> + '_ {
        self.batches.iter().flat_map(|b| &b.nodes)
    }

    /// All triangle records in output order.
    pub fn triangles(&self) -> impl Iterator<Item = &TriangleRecord> + '_ {
        self.batches.iter().flat_map(|b| &b.triangles)
    }
}

impl MeshSink for MemorySink {
    fn write_slice(&mut self, batch: SliceBatch) -> MeshResult<()> {
        self.batches.push(batch);
        Ok(())
    }
}

impl<S: MeshSink + ?Sized> MeshSink for &mut S {
    fn write_slice(&mut self, batch: SliceBatch) -> MeshResult<()> {
        (**self).write_slice(batch)
    }

    fn finish(&mut self) -> MeshResult<()> {
        (**self).finish()
    }
}

impl<S: MeshSink + ?Sized> MeshSink for Box<S> {
    fn write_slice(&mut self, batch: SliceBatch) -> MeshResult<()> {
        (**self).write_slice(batch)
    }

    fn finish(&mut self) -> MeshResult<()> {
        (**self).finish()
    }
}
