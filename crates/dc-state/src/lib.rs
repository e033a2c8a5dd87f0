//! # dc-state
//!
//! The journaled state manager: the single source of truth for account
//! state.
//!
//! ## Journal frames
//!
//! Every block executes against a journal frame: an in-memory write-set
//! (address -> pending [`shared_types::Account`]) overlayed on the last
//! committed trie snapshot. Reads during a frame observe pending writes;
//! readers outside the manager observe only committed state.
//!
//! - `start_block()` opens a frame
//! - `commit_block()` encodes every touched account into the trie at
//!   `Keccak-256(address)`, persists the new nodes in one atomic batch,
//!   advances the committed root and clears the frame
//! - `rollback_block()` drops the frame without touching the store
//!
//! A backend failure during commit leaves the committed root unchanged and
//! drops the frame; the caller re-assembles the block.

pub mod domain;

pub use domain::errors::StateError;
pub use domain::manager::StateManager;
