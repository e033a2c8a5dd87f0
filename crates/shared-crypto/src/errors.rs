//! Error types for cryptographic operations.
//!
//! All errors are recoverable. None of these cause panics.

use thiserror::Error;

/// Errors surfaced by signing, verification and recovery.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// Secret key bytes do not form a valid secp256k1 scalar.
    #[error("invalid private key")]
    InvalidPrivateKey,

    /// The (r, s) pair is not a valid secp256k1 signature.
    #[error("invalid signature encoding")]
    InvalidSignature,

    /// The `s` component is in the upper half of the curve order.
    /// Rejected per EIP-2 to make signatures non-malleable.
    #[error("signature s-value is not in the lower half of the curve order")]
    HighS,

    /// The recovery id is not 0 or 1.
    #[error("invalid recovery id: {0}")]
    InvalidRecoveryId(u8),

    /// No public key could be recovered from the signature.
    #[error("public key recovery failed")]
    RecoveryFailed,
}
