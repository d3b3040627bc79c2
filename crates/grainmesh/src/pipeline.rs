//! # Pipelined Output
//!
//! Moves record output onto a dedicated writer thread. The mesher pushes each
//! finished [`SliceBatch`] into a bounded channel and carries on with the
//! next slice while the writer drains it.
//!
//! ```text
//! ┌──────────────┐     ┌──────────────┐     ┌──────────────┐
//! │ SliceMesher  │ ──▶ │   Channel    │ ──▶ │ Writer thread│ ──▶ sink
//! │ (slice k+1)  │     │  (Bounded)   │     │  (slice k)   │
//! └──────────────┘     └──────────────┘     └──────────────┘
//! ```
//!
//! Batches are consumed in send order, so the output is identical to writing
//! through the inner sink directly. A writer failure surfaces on the next
//! [`MeshSink::write_slice`] or on [`MeshSink::finish`].

use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, Sender};
use grainmesh_core::{MeshError, MeshResult, MeshSink, SliceBatch};

/// [`MeshSink`] that forwards batches to another sink on a writer thread.
pub struct PipelinedSink {
    sender: Option<Sender<SliceBatch>>,
    writer: Option<JoinHandle<MeshResult<usize>>>,
    sent: usize,
}

impl PipelinedSink {
    /// Spawns the writer thread.
    ///
    /// `capacity` is the number of batches that may wait for the writer
    /// before the mesher blocks.
    ///
    /// # Errors
    ///
    /// [`MeshError::InvalidConfig`] for a zero capacity and
    /// [`MeshError::Io`] if the thread cannot be spawned.
    pub fn spawn(mut inner: Box<dyn MeshSink + Send>, capacity: usize) -> MeshResult<Self> {
        if capacity == 0 {
            return Err(MeshError::InvalidConfig(
                "pipeline capacity must be at least 1".into(),
            ));
        }
        let (sender, receiver) = bounded::<SliceBatch>(capacity);
        let writer = thread::Builder::new()
            .name("grainmesh-writer".into())
            .spawn(move || -> MeshResult<usize> {
                let mut written = 0;
                for batch in &receiver {
                    inner.write_slice(batch)?;
                    written += 1;
                }
                inner.finish()?;
                Ok(written)
            })
            .map_err(|e| MeshError::io("grainmesh-writer", e))?;

        Ok(Self {
            sender: Some(sender),
            writer: Some(writer),
            sent: 0,
        })
    }

    /// Batches handed to the writer so far.
    #[must_use]
    pub const fn sent(&self) -> usize {
        self.sent
    }

    /// Closes the channel and waits for the writer.
    fn join(&mut self) -> MeshResult<usize> {
        self.sender = None;
        match self.writer.take() {
            Some(handle) => match handle.join() {
                Ok(result) => result,
                Err(payload) => std::panic::resume_unwind(payload),
            },
            None => Ok(0),
        }
    }
}

impl MeshSink for PipelinedSink {
    fn write_slice(&mut self, batch: SliceBatch) -> MeshResult<()> {
        let slice = batch.slice;
        let Some(sender) = self.sender.as_ref() else {
            return Err(MeshError::InvalidVolume(format!(
                "slice {slice} written after finish"
            )));
        };
        if sender.send(batch).is_err() {
            // The writer only hangs up after failing.
            self.join()?;
            return Err(MeshError::InvalidVolume(format!(
                "writer stopped before slice {slice}"
            )));
        }
        self.sent += 1;
        Ok(())
    }

    fn finish(&mut self) -> MeshResult<()> {
        let written = self.join()?;
        tracing::debug!(written, "writer thread finished");
        Ok(())
    }
}

impl Drop for PipelinedSink {
    fn drop(&mut self) {
        self.sender = None;
        if let Some(handle) = self.writer.take() {
            match handle.join() {
                Ok(Ok(_)) => {}
                Ok(Err(e)) => {
                    tracing::warn!(error = %e, "writer failed before the sink was finished");
                }
                Err(_) => tracing::warn!("writer thread panicked"),
            }
        }
    }
}
