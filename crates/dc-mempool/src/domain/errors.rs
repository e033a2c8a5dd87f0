//! Mempool error types.
//!
//! All errors are recoverable. None of these cause panics.

use shared_types::Address;
use thiserror::Error;

/// Why a transaction was not admitted to the pool.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MempoolError {
    /// A transaction with this (sender, nonce) pair is already pooled.
    #[error("duplicate nonce {nonce} for sender {sender:?}")]
    DuplicateNonce { sender: Address, nonce: u64 },

    /// The nonce is below the sender's current state nonce and can never
    /// be included.
    #[error("stale nonce {nonce} for sender {sender:?}: state nonce is {state_nonce}")]
    StaleNonce {
        sender: Address,
        nonce: u64,
        state_nonce: u64,
    },

    /// The sender already has the maximum number of pooled transactions.
    #[error("sender {sender:?} reached the pool limit of {limit}")]
    SenderLimitReached { sender: Address, limit: usize },

    /// The pool is at capacity and nothing was evictable.
    #[error("pool full at {capacity} transactions")]
    PoolFull { capacity: usize },
}
