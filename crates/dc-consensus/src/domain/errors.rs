//! Consensus error types.

use thiserror::Error;

/// Errors surfaced by consensus operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConsensusError {
    /// No active validators; nothing can be selected.
    #[error("the active validator set is empty")]
    EmptyValidatorSet,
}
