//! The read surface handed to the HTTP layer, plus transaction submission.
//!
//! Every read observes committed state only; an in-flight production
//! cycle is never visible here.

use dc_mempool::{MempoolError, TransactionPool};
use dc_state::{StateError, StateManager};
use dc_storage::{BlockStore, StorageError};
use primitive_types::H256;
use shared_types::{
    Account, Address, Block, Receipt, Transaction, TransactionError, ValidatedTransaction,
};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::debug;

/// Why a submitted transaction was rejected at the door.
#[derive(Debug, Error)]
pub enum SubmitError {
    /// Malformed RLP, wrong chain id, or a bad signature.
    #[error(transparent)]
    Invalid(#[from] TransactionError),

    /// The pool refused it.
    #[error(transparent)]
    Pool(#[from] MempoolError),

    /// Reading the sender's account failed.
    #[error(transparent)]
    State(#[from] StateError),
}

/// Summary counters for the chain stats endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainStats {
    pub chain_id: u64,
    pub tip_number: Option<u64>,
    pub tip_hash: Option<H256>,
    pub block_count: u64,
    pub pool_pending: usize,
    pub pool_queued: usize,
}

/// Synchronous read operations over committed chain state.
pub struct ChainQuery {
    chain_id: u64,
    state: Arc<Mutex<StateManager>>,
    pool: Arc<Mutex<TransactionPool>>,
    block_store: Arc<BlockStore>,
}

impl ChainQuery {
    pub fn new(
        chain_id: u64,
        state: Arc<Mutex<StateManager>>,
        pool: Arc<Mutex<TransactionPool>>,
        block_store: Arc<BlockStore>,
    ) -> Self {
        Self {
            chain_id,
            state,
            pool,
            block_store,
        }
    }

    pub fn get_block_by_number(&self, number: u64) -> Result<Option<Block>, StorageError> {
        self.block_store.find_by_number(number)
    }

    pub fn get_block_by_hash(&self, hash: &H256) -> Result<Option<Block>, StorageError> {
        self.block_store.find_by_hash(hash)
    }

    pub fn get_latest_block(&self) -> Result<Option<Block>, StorageError> {
        self.block_store.latest()
    }

    pub fn get_receipt(&self, tx_hash: &H256) -> Result<Option<Receipt>, StorageError> {
        self.block_store.receipt_by_tx(tx_hash)
    }

    /// Committed account state for an address.
    pub async fn get_account(&self, address: &Address) -> Result<Account, StateError> {
        self.state.lock().await.get_committed_account(address)
    }

    pub async fn get_chain_stats(&self) -> Result<ChainStats, StorageError> {
        let tip = self.block_store.latest()?;
        let pool = self.pool.lock().await;
        Ok(ChainStats {
            chain_id: self.chain_id,
            tip_number: tip.as_ref().map(Block::number),
            tip_hash: tip.as_ref().map(Block::hash),
            block_count: self.block_store.count()?,
            pool_pending: pool.pending_count(),
            pool_queued: pool.queued_count(),
        })
    }

    /// Accept an RLP-encoded signed transaction into the pool.
    ///
    /// Validates the encoding, the EIP-155 chain id and the signature,
    /// recovers the sender, and classifies the nonce against committed
    /// state. Returns the transaction hash.
    pub async fn submit_transaction(&self, raw: &[u8]) -> Result<H256, SubmitError> {
        let decoded: Transaction =
            rlp::decode(raw).map_err(TransactionError::MalformedRlp)?;
        let tx = ValidatedTransaction::recover(decoded, self.chain_id)?;
        let hash = tx.hash;

        let state_nonce = {
            let state = self.state.lock().await;
            state.get_committed_account(&tx.sender)?.nonce
        };
        self.pool.lock().await.insert(tx, state_nonce)?;
        debug!("[query] accepted tx {hash:?}");
        Ok(hash)
    }
}
