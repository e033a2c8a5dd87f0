//! Trie error types.
//!
//! All errors are recoverable. None of these cause panics.

use primitive_types::H256;
use thiserror::Error;

/// Errors surfaced by trie operations.
#[derive(Debug, Error)]
pub enum TrieError {
    /// A node referenced by hash is absent from the backend. Either the
    /// root is wrong or the store lost data.
    #[error("missing trie node {0:?}")]
    MissingNode(H256),

    /// Stored bytes do not decode as a trie node.
    #[error("invalid node encoding: {0}")]
    InvalidEncoding(#[from] rlp::DecoderError),

    /// A child reference is neither empty, a 32-byte hash, nor an inline
    /// node.
    #[error("invalid node reference of {length} bytes")]
    InvalidNodeRef { length: usize },

    /// The backend failed to serve a read.
    #[error("node store error: {0}")]
    Backend(String),
}
