//! State management error types.
//!
//! All errors are recoverable. None of these cause panics.

use primitive_types::{H256, U256};
use shared_types::Address;
use thiserror::Error;

/// State management errors.
#[derive(Debug, Error)]
pub enum StateError {
    /// Balance cannot go negative. The mutation is not applied.
    #[error("insufficient balance for {address:?}: required {required}, available {available}")]
    InsufficientBalance {
        address: Address,
        required: U256,
        available: U256,
    },

    /// A balance credit overflowed the 256-bit range.
    #[error("balance overflow for {address:?}")]
    BalanceOverflow { address: Address },

    /// The account nonce cannot be incremented past u64::MAX.
    #[error("nonce overflow for {address:?}")]
    NonceOverflow { address: Address },

    /// `start_block` while a frame is already open. One block at a time.
    #[error("a journal frame is already open")]
    JournalAlreadyOpen,

    /// A mutation or commit without an open frame.
    #[error("no journal frame is open")]
    NoOpenJournal,

    /// The requested root is not present in the backend. Raised at boot
    /// when the store and the block index disagree.
    #[error("state root {0:?} not found in the backend")]
    UnknownStateRoot(H256),

    /// Stored account bytes did not decode.
    #[error("corrupt account record for {address:?}: {reason}")]
    CorruptAccount { address: Address, reason: String },

    /// Trie layer failure.
    #[error(transparent)]
    Trie(#[from] dc_trie::TrieError),

    /// Backend write failure during commit. The journal frame is dropped.
    #[error(transparent)]
    Store(#[from] dc_storage::KvStoreError),
}
