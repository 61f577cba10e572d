use thiserror::Error;
use std::io;
use std::sync::Arc;

/// Errors surfaced while resolving rows from a store.
///
/// An iterator keeps the first error it observes in a per-iterator slot, and
/// a composing iterator clones that slot when it adopts a child's failure,
/// so the underlying `io::Error` is held behind an `Arc`.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("spill read failed: {0}")]
    SpillRead(#[source] Arc<io::Error>),
    #[error("corrupt spill record for chunk {chunk_idx}: {reason}")]
    CorruptSpill { chunk_idx: usize, reason: String },
    #[error("chunk {0} is neither resident nor spilled")]
    ChunkNotFound(usize),
}

impl From<io::Error> for StoreError {
    fn from(e: io::Error) -> Self {
        StoreError::SpillRead(Arc::new(e))
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
