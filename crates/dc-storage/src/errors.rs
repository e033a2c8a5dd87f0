//! Storage error types.
//!
//! All errors are recoverable. None of these cause panics.

use thiserror::Error;

/// Failure in the underlying key-value backend.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum KvStoreError {
    /// A read could not be served.
    #[error("kv read failed: {0}")]
    ReadFailed(String),

    /// A write or batch could not be applied. The batch contract is
    /// all-or-nothing: nothing from the failed batch is visible.
    #[error("kv write failed: {0}")]
    WriteFailed(String),
}

/// Failure at the block-store layer.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backend failed.
    #[error(transparent)]
    Kv(#[from] KvStoreError),

    /// Stored bytes did not decode as the expected record.
    #[error("corrupt record under key {key}: {reason}")]
    Corrupt { key: String, reason: String },

    /// A save would break the append-only number sequence.
    #[error("non-contiguous block: expected number {expected}, got {got}")]
    NonContiguousBlock { expected: u64, got: u64 },
}
