//! # dc-storage
//!
//! Persistence for Dustin-Chain: an opaque byte-key/byte-value store
//! abstraction with atomic batched writes, the chain's key layout, and the
//! append-only block store built on top.
//!
//! ## Key namespaces
//!
//! | Prefix  | Key                        | Value                     |
//! |---------|----------------------------|---------------------------|
//! | `b:n:`  | big-endian u64 number      | block hash (32 bytes)     |
//! | `b:h:`  | block hash                 | RLP(block)                |
//! | `r:`    | tx hash                    | RLP(receipt)              |
//! | `r:`    | block hash `:` be64 index  | tx hash                   |
//! | `s:`    | trie node hash             | RLP(MPT node)             |
//! | `meta:` | `tip`                      | big-endian u64 tip number |
//!
//! The `s:` namespace is owned by the state trie; everything else is owned
//! by [`BlockStore`].

pub mod block_store;
pub mod errors;
pub mod keys;
pub mod kv;

pub use block_store::BlockStore;
pub use errors::{KvStoreError, StorageError};
pub use kv::{BatchOperation, InMemoryKvStore, KeyValueStore};
