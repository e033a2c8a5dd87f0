//! # dc-trie
//!
//! Merkle Patricia Trie per Ethereum Yellow Paper Appendix D, backed by a
//! pluggable persistent node store.
//!
//! ## Node Types
//!
//! - **Leaf**: remaining path + value
//! - **Extension**: shared prefix + single child
//! - **Branch**: 16-way branch + optional value
//!
//! A node whose RLP encoding is shorter than 32 bytes is embedded inline in
//! its parent; anything larger is referenced by `Keccak-256(RLP(node))` and
//! stored in the backend. The root node is always referenced by hash.
//!
//! ## Sessions
//!
//! A [`Trie`] is a session over a committed snapshot: `get`/`insert`/`remove`
//! mutate only an in-memory overlay. [`Trie::commit`] encodes the overlay,
//! hands the new nodes back for a single batched backend write, and leaves
//! the session positioned at the new root. [`Trie::open`] reopens any
//! previously committed root without copying state.

pub mod domain;
pub mod ports;

pub use domain::errors::TrieError;
pub use domain::nibbles::Nibbles;
pub use domain::trie::{ordered_trie_root, Trie};
pub use ports::backend::{MemoryNodeStore, NodeStore};
