//! The restricted value-transfer executor.

use crate::errors::ExecutionError;
use crate::executor::{intrinsic_gas, BlockContext, ExecutionResult, Executor};
use async_trait::async_trait;
use dc_state::{StateError, StateManager};
use primitive_types::U256;
use shared_types::ValidatedTransaction;
use tracing::trace;

/// Minimum viable executor: moves value between externally owned accounts.
///
/// Contract creation (`to = None`) is rejected with
/// [`ExecutionError::UnsupportedOperation`] before any state change, so
/// the assembler's intrinsic-failure path applies. Gas charged is always
/// exactly the intrinsic cost; the fee is burned.
#[derive(Debug, Default)]
pub struct TransferExecutor;

impl TransferExecutor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Executor for TransferExecutor {
    async fn execute(
        &self,
        tx: &ValidatedTransaction,
        state: &mut StateManager,
        _context: &BlockContext,
    ) -> Result<ExecutionResult, ExecutionError> {
        let sender = tx.sender;
        let account = state.get_account(&sender)?;

        if tx.inner.nonce != account.nonce {
            return Err(ExecutionError::BadNonce {
                address: sender,
                expected: account.nonce,
                got: tx.inner.nonce,
            });
        }

        let intrinsic = intrinsic_gas(&tx.inner.data);
        if tx.inner.gas_limit < intrinsic {
            return Err(ExecutionError::GasLimitTooLow {
                gas_limit: tx.inner.gas_limit,
                intrinsic,
            });
        }

        let Some(recipient) = tx.inner.to else {
            return Err(ExecutionError::UnsupportedOperation);
        };

        let fee = tx
            .inner
            .gas_price
            .checked_mul(U256::from(intrinsic))
            .ok_or(ExecutionError::FeeOverflow { address: sender })?;
        match state.sub_balance(sender, fee) {
            Ok(()) => {}
            Err(StateError::InsufficientBalance { .. }) => {
                return Err(ExecutionError::InsufficientBalanceForGas { address: sender });
            }
            Err(other) => return Err(other.into()),
        }
        state.increment_nonce(sender)?;

        // Gas is paid and the nonce consumed; a failed value move from here
        // on is an included-with-status-0 outcome, not an error.
        let status = match state.sub_balance(sender, tx.inner.value) {
            Ok(()) => {
                state.add_balance(recipient, tx.inner.value)?;
                1
            }
            Err(StateError::InsufficientBalance { .. }) => 0,
            Err(other) => return Err(other.into()),
        };

        trace!(
            "[evm] transfer {:?} -> {:?} value {} status {}",
            sender,
            recipient,
            tx.inner.value,
            status
        );
        Ok(if status == 1 {
            ExecutionResult::success(intrinsic)
        } else {
            ExecutionResult::failure(intrinsic)
        })
    }
}
