//! The executor contract.

use crate::errors::ExecutionError;
use async_trait::async_trait;
use dc_state::StateManager;
use rlp::RlpStream;
use shared_crypto::keccak256;
use shared_types::{Address, Bloom, Log, ValidatedTransaction};

/// Base cost of any transaction.
pub const INTRINSIC_GAS_BASE: u64 = 21_000;
/// Per-byte calldata costs (EIP-2028).
pub const CALLDATA_GAS_ZERO: u64 = 4;
pub const CALLDATA_GAS_NONZERO: u64 = 16;

/// Ambient block data visible to execution.
#[derive(Debug, Clone)]
pub struct BlockContext {
    pub number: u64,
    pub timestamp: u64,
    pub proposer: Address,
    pub chain_id: u64,
}

/// Outcome of executing one transaction.
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    /// 1 for success, 0 for a failed-but-included transaction.
    pub status: u8,
    pub gas_used: u64,
    /// Address of the deployed contract, for creation transactions.
    pub contract_address: Option<Address>,
    pub logs: Vec<Log>,
    pub logs_bloom: Bloom,
    pub return_data: Vec<u8>,
}

impl ExecutionResult {
    /// A successful result with no side data.
    pub fn success(gas_used: u64) -> Self {
        Self {
            status: 1,
            gas_used,
            contract_address: None,
            logs: Vec::new(),
            logs_bloom: Bloom::zero(),
            return_data: Vec::new(),
        }
    }

    /// A failed-but-included result that only burned gas.
    pub fn failure(gas_used: u64) -> Self {
        Self {
            status: 0,
            ..Self::success(gas_used)
        }
    }
}

/// Executes one signature-validated transaction against journaled state.
///
/// Implementations own intrinsic gas deduction, the sender nonce
/// increment, value transfer, contract creation and log emission. The
/// state manager guarantees every write lands in the open journal frame.
#[async_trait]
pub trait Executor: Send + Sync {
    async fn execute(
        &self,
        tx: &ValidatedTransaction,
        state: &mut StateManager,
        context: &BlockContext,
    ) -> Result<ExecutionResult, ExecutionError>;
}

/// Intrinsic gas of a transaction: base cost plus calldata bytes.
pub fn intrinsic_gas(data: &[u8]) -> u64 {
    let calldata: u64 = data
        .iter()
        .map(|byte| {
            if *byte == 0 {
                CALLDATA_GAS_ZERO
            } else {
                CALLDATA_GAS_NONZERO
            }
        })
        .sum();
    INTRINSIC_GAS_BASE + calldata
}

/// Deterministic contract address: `Keccak-256(RLP([sender, nonce]))[12..]`.
///
/// `nonce` is the sender's account nonce captured before the increment for
/// the creating transaction.
pub fn contract_address(sender: &Address, nonce: u64) -> Address {
    let mut s = RlpStream::new_list(2);
    s.append(sender).append(&nonce);
    let digest = keccak256(&s.out());
    Address::from_slice(&digest.as_bytes()[12..])
}
