//! Shared error kinds for wire-level validation.

use shared_crypto::CryptoError;
use thiserror::Error;

/// Why a wire transaction was rejected before reaching the pool.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransactionError {
    /// The byte stream is not a well-formed 9-item transaction list.
    #[error("malformed transaction rlp: {0}")]
    MalformedRlp(#[from] rlp::DecoderError),

    /// `v` does not encode this chain's id (EIP-155).
    #[error("v value {v} does not match chain id {chain_id}")]
    BadChainId { v: u64, chain_id: u64 },

    /// The signature is invalid or unrecoverable.
    #[error("bad signature: {0}")]
    Signature(#[from] CryptoError),
}
