//! Execution error types.
//!
//! All errors are recoverable. None of these cause panics.

use dc_state::StateError;
use shared_types::Address;
use thiserror::Error;

/// Why execution of a transaction failed.
///
/// Intrinsic failures happen before any state change; the assembler still
/// includes the transaction with status 0, charges intrinsic gas and bumps
/// the sender nonce. Backend failures abort the whole block build.
#[derive(Debug, Error)]
pub enum ExecutionError {
    /// Transaction nonce does not match the sender's account nonce.
    #[error("bad nonce for {address:?}: expected {expected}, got {got}")]
    BadNonce {
        address: Address,
        expected: u64,
        got: u64,
    },

    /// The gas limit does not even cover intrinsic gas.
    #[error("gas limit {gas_limit} below intrinsic cost {intrinsic}")]
    GasLimitTooLow { gas_limit: u64, intrinsic: u64 },

    /// The sender cannot pay for intrinsic gas.
    #[error("insufficient balance for intrinsic gas: {address:?}")]
    InsufficientBalanceForGas { address: Address },

    /// `gas_price * gas` left the 256-bit range.
    #[error("fee computation overflowed for {address:?}")]
    FeeOverflow { address: Address },

    /// The executor does not support this transaction shape (e.g. contract
    /// creation on the transfer-only executor).
    #[error("operation not supported by this executor")]
    UnsupportedOperation,

    /// State backend failure. Aborts the block build.
    #[error(transparent)]
    State(#[from] StateError),
}

impl ExecutionError {
    /// True for failures that occur before any state change and still put
    /// the transaction in the block with status 0.
    pub fn is_intrinsic(&self) -> bool {
        matches!(
            self,
            ExecutionError::BadNonce { .. }
                | ExecutionError::GasLimitTooLow { .. }
                | ExecutionError::InsufficientBalanceForGas { .. }
                | ExecutionError::FeeOverflow { .. }
                | ExecutionError::UnsupportedOperation
        )
    }
}
