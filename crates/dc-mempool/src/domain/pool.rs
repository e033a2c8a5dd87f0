//! The transaction pool.

use crate::domain::errors::MempoolError;
use primitive_types::H256;
use shared_types::{Address, ValidatedTransaction};
use std::collections::{BTreeMap, HashMap};
use tracing::trace;

/// Pool bounds.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Maximum pooled transactions per sender, pending and queued combined.
    pub max_per_sender: usize,
    /// Maximum pooled transactions overall.
    pub max_total: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_per_sender: 64,
            max_total: 4096,
        }
    }
}

#[derive(Debug, Clone)]
struct PooledTransaction {
    tx: ValidatedTransaction,
    /// Monotonic insertion counter, used for oldest-first eviction.
    seq: u64,
}

/// Transaction pool with pending/queued sets keyed by (sender, nonce).
///
/// `pending` holds transactions executable in order right now; `queued`
/// holds transactions above a nonce gap. A queued transaction is promoted
/// the moment the gap below it closes.
#[derive(Debug, Default)]
pub struct TransactionPool {
    config: PoolConfig,
    pending: BTreeMap<(Address, u64), PooledTransaction>,
    queued: BTreeMap<(Address, u64), PooledTransaction>,
    by_hash: HashMap<H256, (Address, u64)>,
    next_seq: u64,
}

impl TransactionPool {
    pub fn new(config: PoolConfig) -> Self {
        Self {
            config,
            pending: BTreeMap::new(),
            queued: BTreeMap::new(),
            by_hash: HashMap::new(),
            next_seq: 0,
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(PoolConfig::default())
    }

    pub fn len(&self) -> usize {
        self.by_hash.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_hash.is_empty()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn queued_count(&self) -> usize {
        self.queued.len()
    }

    pub fn contains(&self, hash: &H256) -> bool {
        self.by_hash.contains_key(hash)
    }

    /// Admit a transaction.
    ///
    /// `state_nonce` is the sender's nonce in committed state; it decides
    /// whether the transaction is executable (pending) or parked (queued).
    ///
    /// # Errors
    /// - `StaleNonce` if the nonce is already used up in state
    /// - `DuplicateNonce` if the (sender, nonce) slot is taken
    /// - `SenderLimitReached` / `PoolFull` on bounds
    pub fn insert(
        &mut self,
        tx: ValidatedTransaction,
        state_nonce: u64,
    ) -> Result<(), MempoolError> {
        let sender = tx.sender;
        let nonce = tx.inner.nonce;
        let slot = (sender, nonce);

        if nonce < state_nonce {
            return Err(MempoolError::StaleNonce {
                sender,
                nonce,
                state_nonce,
            });
        }
        if self.pending.contains_key(&slot) || self.queued.contains_key(&slot) {
            return Err(MempoolError::DuplicateNonce { sender, nonce });
        }

        let sender_count = self.sender_count(&sender);
        if sender_count >= self.config.max_per_sender {
            return Err(MempoolError::SenderLimitReached {
                sender,
                limit: self.config.max_per_sender,
            });
        }
        if self.by_hash.len() >= self.config.max_total && !self.evict_oldest_queued() {
            return Err(MempoolError::PoolFull {
                capacity: self.config.max_total,
            });
        }

        let pooled = PooledTransaction {
            tx,
            seq: self.next_seq,
        };
        self.next_seq += 1;
        self.by_hash.insert(pooled.tx.hash, slot);

        let executable = nonce == state_nonce || self.pending.contains_key(&(sender, nonce - 1));
        if executable {
            trace!("[pool] pending {:?} nonce {}", sender, nonce);
            self.pending.insert(slot, pooled);
            self.promote_chain(sender, nonce + 1);
        } else {
            trace!("[pool] queued {:?} nonce {} (gap)", sender, nonce);
            self.queued.insert(slot, pooled);
        }
        Ok(())
    }

    /// Executable transactions in ascending (sender, nonce) order, up to
    /// `max`. The pool keeps them; the driver removes what actually lands
    /// in a committed block.
    pub fn drain_pending(&self, max: usize) -> Vec<ValidatedTransaction> {
        self.pending
            .values()
            .take(max)
            .map(|pooled| pooled.tx.clone())
            .collect()
    }

    /// Remove a transaction by hash. O(1) index lookup.
    pub fn remove(&mut self, hash: &H256) -> Option<ValidatedTransaction> {
        let slot = self.by_hash.remove(hash)?;
        self.pending
            .remove(&slot)
            .or_else(|| self.queued.remove(&slot))
            .map(|pooled| pooled.tx)
    }

    /// After a block commits: drop transactions made stale by the sender's
    /// new state nonce and promote queued ones whose gap closed.
    pub fn prune_sender(&mut self, sender: Address, state_nonce: u64) {
        let stale: Vec<(Address, u64)> = self
            .pending
            .range((sender, 0)..(sender, state_nonce))
            .map(|(slot, _)| *slot)
            .chain(
                self.queued
                    .range((sender, 0)..(sender, state_nonce))
                    .map(|(slot, _)| *slot),
            )
            .collect();
        for slot in stale {
            if let Some(pooled) = self.pending.remove(&slot).or_else(|| self.queued.remove(&slot))
            {
                self.by_hash.remove(&pooled.tx.hash);
            }
        }

        // Anything sitting exactly at the new state nonce becomes
        // executable, and pulls its successors along.
        if let Some(pooled) = self.queued.remove(&(sender, state_nonce)) {
            self.pending.insert((sender, state_nonce), pooled);
            self.promote_chain(sender, state_nonce + 1);
        }
    }

    fn promote_chain(&mut self, sender: Address, mut nonce: u64) {
        while let Some(pooled) = self.queued.remove(&(sender, nonce)) {
            self.pending.insert((sender, nonce), pooled);
            nonce += 1;
        }
    }

    fn sender_count(&self, sender: &Address) -> usize {
        let range = (*sender, 0)..=(*sender, u64::MAX);
        self.pending.range(range.clone()).count() + self.queued.range(range).count()
    }

    /// Evict the oldest queued transaction. Returns false when nothing is
    /// queued, in which case the insert fails with `PoolFull`.
    fn evict_oldest_queued(&mut self) -> bool {
        let oldest = self
            .queued
            .iter()
            .min_by_key(|(_, pooled)| pooled.seq)
            .map(|(slot, _)| *slot);
        match oldest {
            Some(slot) => {
                if let Some(pooled) = self.queued.remove(&slot) {
                    trace!("[pool] evicted queued {:?} nonce {}", slot.0, slot.1);
                    self.by_hash.remove(&pooled.tx.hash);
                }
                true
            }
            None => false,
        }
    }
}
