//! Block assembly.

use crate::config::ProductionConfig;
use crate::error::ProductionError;
use dc_evm::{intrinsic_gas, BlockContext, ExecutionResult, Executor};
use dc_mempool::TransactionPool;
use dc_state::{StateError, StateManager};
use dc_storage::BlockStore;
use dc_trie::ordered_trie_root;
use primitive_types::{H256, U256};
use shared_types::{Block, BlockHeader, Receipt, ValidatedTransaction};
use std::sync::Arc;
use tracing::{debug, trace};

/// A built-but-unsaved block together with its receipts.
///
/// Nothing is committed or persisted at this point; the consensus layer
/// decides the block's fate.
#[derive(Debug, Clone)]
pub struct AssembledBlock {
    pub block: Block,
    pub receipts: Vec<Receipt>,
}

impl AssembledBlock {
    pub fn hash(&self) -> H256 {
        self.block.hash()
    }
}

/// Drives execution and turns pool content into a candidate block.
pub struct BlockAssembler {
    config: ProductionConfig,
    executor: Arc<dyn Executor>,
}

impl BlockAssembler {
    pub fn new(config: ProductionConfig, executor: Arc<dyn Executor>) -> Self {
        Self { config, executor }
    }

    /// Build a candidate block on top of the latest stored block.
    ///
    /// The caller must have opened a journal frame. Transactions are
    /// executed strictly sequentially; a transaction failing with an
    /// intrinsic error is still included with status 0, intrinsic gas
    /// charged and the sender nonce bumped. The journal is left open;
    /// commit or rollback is the consensus layer's call.
    pub async fn build_block(
        &self,
        proposer: shared_types::Address,
        state: &mut StateManager,
        pool: &TransactionPool,
        block_store: &BlockStore,
        now_ms: u64,
    ) -> Result<AssembledBlock, ProductionError> {
        let parent = block_store.latest()?.ok_or(ProductionError::NoGenesis)?;
        let number = parent.number() + 1;
        let timestamp = now_ms.max(parent.header.timestamp + 1);
        let context = BlockContext {
            number,
            timestamp,
            proposer,
            chain_id: self.config.chain_id,
        };

        let candidates = pool.drain_pending(self.config.max_txs_per_block);
        trace!(
            "[assembler] building block #{number} on {:?} with {} candidate tx(s)",
            parent.hash(),
            candidates.len()
        );

        let mut transactions = Vec::with_capacity(candidates.len());
        let mut receipts: Vec<Receipt> = Vec::with_capacity(candidates.len());
        let mut cumulative_gas_used = 0u64;

        for tx in candidates {
            let result = match self.executor.execute(&tx, state, &context).await {
                Ok(result) => result,
                Err(error) if error.is_intrinsic() => {
                    debug!("[assembler] including intrinsically failed tx {:?}: {error}", tx.hash);
                    self.charge_intrinsic_failure(&tx, state)?;
                    ExecutionResult::failure(intrinsic_gas(&tx.inner.data))
                }
                Err(error) => return Err(error.into()),
            };

            cumulative_gas_used += result.gas_used;
            receipts.push(Receipt {
                status: result.status,
                cumulative_gas_used,
                logs_bloom: result.logs_bloom,
                logs: result.logs,
                contract_address: result.contract_address,
                tx_hash: tx.hash,
                tx_index: receipts.len() as u64,
                // Stamped once the block hash is known.
                block_hash: H256::zero(),
                block_number: number,
                from: tx.sender,
                to: tx.inner.to,
                gas_used: result.gas_used,
            });
            transactions.push(tx.inner);
        }

        let tx_encodings: Vec<Vec<u8>> = transactions
            .iter()
            .map(|tx| rlp::encode(tx).to_vec())
            .collect();
        let tx_root = ordered_trie_root(&tx_encodings)?;
        let receipt_encodings: Vec<Vec<u8>> = receipts
            .iter()
            .map(|receipt| rlp::encode(receipt).to_vec())
            .collect();
        let receipt_root = ordered_trie_root(&receipt_encodings)?;
        let state_root = state.pending_root()?;

        let header = BlockHeader {
            parent_hash: parent.hash(),
            state_root,
            tx_root,
            receipt_root,
            number,
            timestamp,
            proposer,
        };
        let block_hash = header.hash();
        for receipt in &mut receipts {
            receipt.block_hash = block_hash;
        }

        debug!(
            "[assembler] block #{number} {:?}: {} tx(s), gas {}",
            block_hash,
            transactions.len(),
            cumulative_gas_used
        );
        Ok(AssembledBlock {
            block: Block {
                header,
                transactions,
            },
            receipts,
        })
    }

    /// Bookkeeping for a transaction the executor refused before touching
    /// state: charge intrinsic gas (or whatever the sender can cover) and
    /// consume the nonce.
    fn charge_intrinsic_failure(
        &self,
        tx: &ValidatedTransaction,
        state: &mut StateManager,
    ) -> Result<(), ProductionError> {
        let fee = tx
            .inner
            .gas_price
            .saturating_mul(U256::from(intrinsic_gas(&tx.inner.data)));
        match state.sub_balance(tx.sender, fee) {
            Ok(()) => {}
            Err(StateError::InsufficientBalance { available, .. }) => {
                state.sub_balance(tx.sender, available)?;
            }
            Err(error) => return Err(error.into()),
        }
        state.increment_nonce(tx.sender)?;
        Ok(())
    }
}
