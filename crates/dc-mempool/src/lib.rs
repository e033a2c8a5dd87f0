//! # dc-mempool
//!
//! Transaction pool for Dustin-Chain.
//!
//! ## Data Structures
//!
//! - `pending`: txs whose nonce equals the sender's state nonce or forms a
//!   gap-free chain above it, ordered by (sender, nonce)
//! - `queued`: txs parked above a nonce gap
//! - `by_hash`: O(1) hash lookup for removal
//!
//! ## Invariants Enforced
//!
//! - One transaction per (sender, nonce) pair (`DuplicateNonce` otherwise)
//! - Pending chains are gap-free above the sender's state nonce
//! - The pool is bounded per sender and overall; when full, the oldest
//!   queued transaction is evicted first

pub mod domain;

pub use domain::errors::MempoolError;
pub use domain::pool::{PoolConfig, TransactionPool};
