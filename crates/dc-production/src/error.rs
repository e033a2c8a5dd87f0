//! Production error types.
//!
//! All errors are recoverable at the slot level: the driver logs, rolls
//! back the frame if one is open, and schedules the next slot.

use thiserror::Error;

/// Errors surfaced by block production.
#[derive(Debug, Error)]
pub enum ProductionError {
    /// No genesis block in the store; the chain was never initialized.
    #[error("no genesis block in the store")]
    NoGenesis,

    /// State layer failure.
    #[error(transparent)]
    State(#[from] dc_state::StateError),

    /// Non-intrinsic executor failure that aborts the block build.
    #[error("execution aborted the block: {0}")]
    Execution(#[from] dc_evm::ExecutionError),

    /// Block store failure.
    #[error(transparent)]
    Storage(#[from] dc_storage::StorageError),

    /// Consensus layer failure.
    #[error(transparent)]
    Consensus(#[from] dc_consensus::ConsensusError),

    /// Trie failure while computing a root.
    #[error(transparent)]
    Trie(#[from] dc_trie::TrieError),

    /// The driver was asked to start twice.
    #[error("the slot driver is already running")]
    AlreadyRunning,
}
