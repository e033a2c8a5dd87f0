//! # node-runtime
//!
//! The Dustin-Chain node: configuration loading, the two-phase boot that
//! wires the constructor graph, the synchronous query surface handed to
//! the HTTP layer, and the RocksDB storage adapter.
//!
//! ## Boot phases
//!
//! 1. Open the key-value backend
//! 2. Create the genesis block from `genesis.json`, or reopen the state
//!    trie at the latest block's state root (refusing to start if that
//!    root is not durable)
//!
//! After boot the slot driver owns the only write path; everything in
//! [`query`] reads committed state.

pub mod adapters;
pub mod boot;
pub mod config;
pub mod errors;
pub mod query;

pub use boot::{Node, NodeConfig};
pub use errors::RuntimeError;
pub use query::{ChainQuery, ChainStats, SubmitError};
