//! Append-only block store with number and hash indices.

use crate::errors::StorageError;
use crate::keys;
use crate::kv::{BatchOperation, KeyValueStore};
use primitive_types::H256;
use shared_types::{Block, Receipt};
use std::sync::Arc;
use tracing::debug;

/// Index over committed blocks and their receipts.
///
/// One block's records are written in a single atomic batch, so readers
/// never observe a half-saved block: `latest()` returns the highest block
/// whose batch committed.
pub struct BlockStore {
    kv: Arc<dyn KeyValueStore>,
}

impl BlockStore {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    /// Persist a block and its receipts.
    ///
    /// The block number must extend the chain by exactly one (or be 0 on an
    /// empty store).
    pub fn save(&self, block: &Block, receipts: &[Receipt]) -> Result<(), StorageError> {
        let expected = match self.tip_number()? {
            Some(tip) => tip + 1,
            None => 0,
        };
        if block.number() != expected {
            return Err(StorageError::NonContiguousBlock {
                expected,
                got: block.number(),
            });
        }

        let hash = block.hash();
        let mut batch = Vec::with_capacity(3 + receipts.len() * 2);
        batch.push(BatchOperation::put(
            keys::block_by_hash(&hash),
            rlp::encode(block).to_vec(),
        ));
        batch.push(BatchOperation::put(
            keys::block_by_number(block.number()),
            hash.as_bytes().to_vec(),
        ));
        batch.push(BatchOperation::put(
            keys::META_TIP.to_vec(),
            block.number().to_be_bytes().to_vec(),
        ));
        for receipt in receipts {
            batch.push(BatchOperation::put(
                keys::receipt_by_tx(&receipt.tx_hash),
                rlp::encode(receipt).to_vec(),
            ));
            batch.push(BatchOperation::put(
                keys::receipt_by_block_index(&hash, receipt.tx_index),
                receipt.tx_hash.as_bytes().to_vec(),
            ));
        }

        self.kv.atomic_batch_write(batch)?;
        debug!(
            "[store] saved block #{} {:?} with {} receipt(s)",
            block.number(),
            hash,
            receipts.len()
        );
        Ok(())
    }

    pub fn find_by_number(&self, number: u64) -> Result<Option<Block>, StorageError> {
        let Some(raw) = self.kv.get(&keys::block_by_number(number))? else {
            return Ok(None);
        };
        let hash = decode_hash(&raw, "b:n:")?;
        self.find_by_hash(&hash)
    }

    pub fn find_by_hash(&self, hash: &H256) -> Result<Option<Block>, StorageError> {
        let Some(raw) = self.kv.get(&keys::block_by_hash(hash))? else {
            return Ok(None);
        };
        let block = rlp::decode::<Block>(&raw).map_err(|e| StorageError::Corrupt {
            key: format!("b:h:{hash:?}"),
            reason: e.to_string(),
        })?;
        Ok(Some(block))
    }

    /// Highest committed block, if any.
    pub fn latest(&self) -> Result<Option<Block>, StorageError> {
        match self.tip_number()? {
            Some(tip) => self.find_by_number(tip),
            None => Ok(None),
        }
    }

    /// Number of the highest committed block.
    pub fn tip_number(&self) -> Result<Option<u64>, StorageError> {
        let Some(raw) = self.kv.get(keys::META_TIP)? else {
            return Ok(None);
        };
        let bytes: [u8; 8] = raw.as_slice().try_into().map_err(|_| StorageError::Corrupt {
            key: "meta:tip".into(),
            reason: format!("expected 8 bytes, got {}", raw.len()),
        })?;
        Ok(Some(u64::from_be_bytes(bytes)))
    }

    /// Number of committed blocks (genesis included).
    pub fn count(&self) -> Result<u64, StorageError> {
        Ok(match self.tip_number()? {
            Some(tip) => tip + 1,
            None => 0,
        })
    }

    pub fn receipt_by_tx(&self, tx_hash: &H256) -> Result<Option<Receipt>, StorageError> {
        let Some(raw) = self.kv.get(&keys::receipt_by_tx(tx_hash))? else {
            return Ok(None);
        };
        let receipt = rlp::decode::<Receipt>(&raw).map_err(|e| StorageError::Corrupt {
            key: format!("r:{tx_hash:?}"),
            reason: e.to_string(),
        })?;
        Ok(Some(receipt))
    }

    /// Receipt lookup by position within a block.
    pub fn receipt_in_block(
        &self,
        block_hash: &H256,
        index: u64,
    ) -> Result<Option<Receipt>, StorageError> {
        let Some(raw) = self.kv.get(&keys::receipt_by_block_index(block_hash, index))? else {
            return Ok(None);
        };
        let tx_hash = decode_hash(&raw, "r:<block>:<index>")?;
        self.receipt_by_tx(&tx_hash)
    }
}

fn decode_hash(raw: &[u8], namespace: &str) -> Result<H256, StorageError> {
    if raw.len() != 32 {
        return Err(StorageError::Corrupt {
            key: namespace.into(),
            reason: format!("expected 32-byte hash, got {}", raw.len()),
        });
    }
    Ok(H256::from_slice(raw))
}
