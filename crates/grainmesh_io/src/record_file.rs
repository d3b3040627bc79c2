//! # Record Files
//!
//! Writes slice batches to two flat record streams, one for nodes and one for
//! triangles, and reads them back.
//!
//! Both files are truncated when slice 0 arrives and appended afterwards.
//! Each slice goes to the file in one unbuffered write sequence, so the byte
//! count in a [`MeshError::ShortWrite`] is what actually reached the file.

use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};

use grainmesh_core::{
    MeshError, MeshResult, MeshSink, NodeRecord, SliceBatch, TriangleRecord, NODE_RECORD_SIZE,
    TRIANGLE_RECORD_SIZE,
};

/// Writes all of `bytes`, reporting how far a failed write got.
///
/// # Errors
///
/// [`MeshError::ShortWrite`] if the writer stops accepting bytes part-way and
/// [`MeshError::Io`] if it fails before accepting any.
pub fn write_counted<W: Write>(writer: &mut W, bytes: &[u8], path: &Path) -> MeshResult<()> {
    let mut written = 0;
    while written < bytes.len() {
        match writer.write(&bytes[written..]) {
            Ok(0) => {
                return Err(MeshError::ShortWrite {
                    path: path.to_path_buf(),
                    written,
                    expected: bytes.len(),
                })
            }
            Ok(n) => written += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) if written == 0 => return Err(MeshError::io(path, e)),
            Err(_) => {
                return Err(MeshError::ShortWrite {
                    path: path.to_path_buf(),
                    written,
                    expected: bytes.len(),
                })
            }
        }
    }
    Ok(())
}

/// One append-only record stream.
struct RecordStream<W = File> {
    path: PathBuf,
    writer: Option<W>,
    bytes: u64,
}

impl<W: Write> RecordStream<W> {
    fn write(&mut self, bytes: &[u8]) -> MeshResult<()> {
        let Some(writer) = self.writer.as_mut() else {
            return Ok(());
        };
        write_counted(writer, bytes, &self.path)?;
        writer.flush().map_err(|e| MeshError::io(&self.path, e))?;
        self.bytes += bytes.len() as u64;
        Ok(())
    }

    fn close(&mut self) -> MeshResult<()> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush().map_err(|e| MeshError::io(&self.path, e))?;
        }
        Ok(())
    }
}

impl RecordStream {
    fn new(path: PathBuf) -> Self {
        Self {
            path,
            writer: None,
            bytes: 0,
        }
    }

    fn append(&mut self, slice: usize, bytes: &[u8]) -> MeshResult<()> {
        if self.writer.is_none() {
            let file = if slice == 0 {
                File::create(&self.path)
            } else {
                OpenOptions::new().create(true).append(true).open(&self.path)
            }
            .map_err(|e| MeshError::io(&self.path, e))?;
            self.writer = Some(file);
        }
        self.write(bytes)
    }
}

/// [`MeshSink`] writing node and triangle record files.
pub struct RecordFileSink {
    nodes: RecordStream,
    triangles: RecordStream,
}

impl RecordFileSink {
    /// Creates a sink; files are created when the first slice arrives.
    #[must_use]
    pub fn new(nodes_path: impl Into<PathBuf>, triangles_path: impl Into<PathBuf>) -> Self {
        Self {
            nodes: RecordStream::new(nodes_path.into()),
            triangles: RecordStream::new(triangles_path.into()),
        }
    }

    /// Bytes written to the node stream.
    #[must_use]
    pub const fn node_bytes(&self) -> u64 {
        self.nodes.bytes
    }

    /// Bytes written to the triangle stream.
    #[must_use]
    pub const fn triangle_bytes(&self) -> u64 {
        self.triangles.bytes
    }
}

impl MeshSink for RecordFileSink {
    fn write_slice(&mut self, batch: SliceBatch) -> MeshResult<()> {
        self.nodes
            .append(batch.slice, bytemuck::cast_slice(&batch.nodes))?;
        self.triangles
            .append(batch.slice, bytemuck::cast_slice(&batch.triangles))?;
        tracing::trace!(
            slice = batch.slice,
            nodes = batch.nodes.len(),
            triangles = batch.triangles.len(),
            "slice written"
        );
        Ok(())
    }

    fn finish(&mut self) -> MeshResult<()> {
        self.nodes.close()?;
        self.triangles.close()
    }
}

fn read_records<T: bytemuck::Pod>(path: &Path, record_size: usize) -> MeshResult<Vec<T>> {
    let mut bytes = Vec::new();
    File::open(path)
        .and_then(|mut file| file.read_to_end(&mut bytes))
        .map_err(|e| MeshError::io(path, e))?;
    if bytes.len() % record_size != 0 {
        return Err(MeshError::Parse(format!(
            "{}: {} bytes is not a whole number of {record_size}-byte records",
            path.display(),
            bytes.len()
        )));
    }
    Ok(bytemuck::pod_collect_to_vec(&bytes))
}

/// Reads a whole node record file.
///
/// # Errors
///
/// [`MeshError::Io`] on read failure and [`MeshError::Parse`] for a
/// truncated file.
pub fn read_nodes(path: impl AsRef<Path>) -> MeshResult<Vec<NodeRecord>> {
    read_records(path.as_ref(), NODE_RECORD_SIZE)
}

/// Reads a whole triangle record file.
///
/// # Errors
///
/// As for [`read_nodes`].
pub fn read_triangles(path: impl AsRef<Path>) -> MeshResult<Vec<TriangleRecord>> {
    read_records(path.as_ref(), TRIANGLE_RECORD_SIZE)
}
