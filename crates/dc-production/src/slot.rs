//! The slot driver.
//!
//! A single task owns the monotonic slot clock anchored at the genesis
//! timestamp and drives one production cycle per slot. It is the only
//! writer to the state manager, the block store and the pool's drain
//! path.

use crate::assembler::{AssembledBlock, BlockAssembler};
use crate::config::ProductionConfig;
use crate::error::ProductionError;
use crate::rewards::distribute_rewards;
use dc_consensus::{has_supermajority, AttestationCollector, ValidatorSet};
use dc_evm::Executor;
use dc_mempool::TransactionPool;
use dc_state::StateManager;
use dc_storage::BlockStore;
use shared_types::{Address, Attestation};
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Wall-clock abstraction, injectable for tests.
pub trait TimeSource: Send + Sync {
    /// Milliseconds since the unix epoch.
    fn now_ms(&self) -> u64;
}

/// Production time source.
#[derive(Debug, Default)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_millis() as u64)
            .unwrap_or(0)
    }
}

/// Driver lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    Uninitialized,
    Starting,
    Running,
    Stopped,
}

/// Owns the slot clock and the per-slot production cycle.
pub struct SlotDriver {
    inner: Arc<DriverInner>,
    shutdown: watch::Sender<bool>,
    handle: StdMutex<Option<JoinHandle<()>>>,
}

struct DriverInner {
    config: ProductionConfig,
    state: Arc<Mutex<StateManager>>,
    pool: Arc<Mutex<TransactionPool>>,
    block_store: Arc<BlockStore>,
    validators: Arc<ValidatorSet>,
    collector: AttestationCollector,
    assembler: BlockAssembler,
    time: Arc<dyn TimeSource>,
    genesis_time_ms: AtomicU64,
    status: StdMutex<DriverState>,
}

impl SlotDriver {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: ProductionConfig,
        state: Arc<Mutex<StateManager>>,
        pool: Arc<Mutex<TransactionPool>>,
        block_store: Arc<BlockStore>,
        validators: Arc<ValidatorSet>,
        collector: AttestationCollector,
        executor: Arc<dyn Executor>,
        time: Arc<dyn TimeSource>,
    ) -> Self {
        let assembler = BlockAssembler::new(config.clone(), executor);
        let (shutdown, _) = watch::channel(false);
        Self {
            inner: Arc::new(DriverInner {
                config,
                state,
                pool,
                block_store,
                validators,
                collector,
                assembler,
                time,
                genesis_time_ms: AtomicU64::new(0),
                status: StdMutex::new(DriverState::Uninitialized),
            }),
            shutdown,
            handle: StdMutex::new(None),
        }
    }

    pub fn status(&self) -> DriverState {
        *self.inner.status.lock().unwrap()
    }

    /// Slot index for a wall-clock instant, once started.
    pub fn slot_at(&self, now_ms: u64) -> u64 {
        self.inner.slot_at(now_ms)
    }

    /// Load the genesis anchor and spawn the slot loop.
    ///
    /// Fails with `NoGenesis` when the store has no block #0; the process
    /// must create genesis first.
    pub fn start(&self) -> Result<(), ProductionError> {
        {
            let mut status = self.inner.status.lock().unwrap();
            if *status == DriverState::Running || *status == DriverState::Starting {
                return Err(ProductionError::AlreadyRunning);
            }
            *status = DriverState::Starting;
        }

        let genesis = match self.inner.block_store.find_by_number(0) {
            Ok(Some(block)) => block,
            Ok(None) => {
                *self.inner.status.lock().unwrap() = DriverState::Uninitialized;
                return Err(ProductionError::NoGenesis);
            }
            Err(error) => {
                *self.inner.status.lock().unwrap() = DriverState::Uninitialized;
                return Err(error.into());
            }
        };
        self.inner
            .genesis_time_ms
            .store(genesis.header.timestamp, Ordering::SeqCst);

        self.shutdown.send_replace(false);
        let inner = Arc::clone(&self.inner);
        let mut shutdown = self.shutdown.subscribe();
        let task = tokio::spawn(async move {
            *inner.status.lock().unwrap() = DriverState::Running;
            info!(
                "[slot] driver running, genesis time {} ms, slot {} ms",
                inner.genesis_time_ms.load(Ordering::SeqCst),
                inner.config.slot_ms
            );
            loop {
                // Always aim at the next absolute slot boundary; missed
                // slots are not retro-produced.
                let now = inner.time.now_ms();
                let next_boundary = inner.next_boundary_ms(now);
                let sleep = Duration::from_millis(next_boundary.saturating_sub(now));
                tokio::select! {
                    _ = tokio::time::sleep(sleep) => {}
                    _ = shutdown.changed() => {}
                }
                if *shutdown.borrow() {
                    break;
                }

                let slot = inner.slot_at(inner.time.now_ms());
                if let Err(error) = inner.produce_slot(slot).await {
                    warn!("[slot] slot {slot} production failed: {error}");
                    // Whatever happened, the next slot starts from a clean
                    // journal frame.
                    inner.state.lock().await.rollback_block();
                }
            }
            *inner.status.lock().unwrap() = DriverState::Stopped;
            info!("[slot] driver stopped");
        });
        *self.handle.lock().unwrap() = Some(task);
        Ok(())
    }

    /// Signal shutdown and wait for the in-flight cycle to finish.
    /// Idempotent.
    pub async fn stop(&self) {
        self.shutdown.send_replace(true);
        let task = self.handle.lock().unwrap().take();
        if let Some(task) = task {
            let _ = task.await;
        }
        *self.inner.status.lock().unwrap() = DriverState::Stopped;
    }

    /// Run one production cycle for `slot` immediately, outside the
    /// timer. This is the loop body; scenario tests drive it directly.
    pub async fn produce_slot(&self, slot: u64) -> Result<(), ProductionError> {
        self.inner.produce_slot(slot).await
    }
}

impl DriverInner {
    fn slot_at(&self, now_ms: u64) -> u64 {
        let genesis = self.genesis_time_ms.load(Ordering::SeqCst);
        now_ms.saturating_sub(genesis) / self.config.slot_ms
    }

    fn next_boundary_ms(&self, now_ms: u64) -> u64 {
        let genesis = self.genesis_time_ms.load(Ordering::SeqCst);
        genesis + (self.slot_at(now_ms) + 1) * self.config.slot_ms
    }

    async fn produce_slot(&self, slot: u64) -> Result<(), ProductionError> {
        let proposer = self.validators.select_proposer(slot)?;
        let committee = self.validators.select_committee(slot)?;
        info!(
            "[slot] slot {slot}: proposer {:?}, committee of {}",
            proposer,
            committee.len()
        );

        let mut state = self.state.lock().await;
        state.start_block()?;

        let assembled = {
            let pool = self.pool.lock().await;
            match self
                .assembler
                .build_block(proposer, &mut state, &pool, &self.block_store, self.time.now_ms())
                .await
            {
                Ok(assembled) => assembled,
                Err(error) => {
                    state.rollback_block();
                    return Err(error);
                }
            }
        };

        let block_hash = assembled.hash();
        let attestations = self
            .collector
            .collect(slot, block_hash, &committee)
            .await;

        if has_supermajority(attestations.len(), committee.len()) {
            self.commit_cycle(
                &mut state,
                slot,
                proposer,
                &assembled,
                &attestations,
                committee.len(),
            )
            .await
        } else {
            info!(
                "[slot] slot {slot}: {}/{} attestations, dropping block {:?}",
                attestations.len(),
                committee.len(),
                block_hash
            );
            state.rollback_block();
            Ok(())
        }
    }

    async fn commit_cycle(
        &self,
        state: &mut StateManager,
        slot: u64,
        proposer: Address,
        assembled: &AssembledBlock,
        attestations: &[Attestation],
        committee_len: usize,
    ) -> Result<(), ProductionError> {
        state.commit_block()?;

        let attesters: Vec<Address> = attestations
            .iter()
            .map(|attestation| attestation.validator)
            .collect();
        distribute_rewards(state, proposer, &attesters)?;

        self.block_store
            .save(&assembled.block, &assembled.receipts)?;

        // Included transactions leave the pool; senders' queued chains are
        // re-evaluated against their new nonces.
        let mut pool = self.pool.lock().await;
        let mut senders: HashSet<Address> = HashSet::new();
        for receipt in &assembled.receipts {
            pool.remove(&receipt.tx_hash);
            senders.insert(receipt.from);
        }
        for sender in senders {
            let nonce = state.get_account(&sender)?.nonce;
            pool.prune_sender(sender, nonce);
        }

        info!(
            "[slot] slot {slot}: committed block #{} {:?} with {}/{} attestations, {} tx(s)",
            assembled.block.number(),
            assembled.hash(),
            attestations.len(),
            committee_len,
            assembled.block.transactions.len()
        );
        Ok(())
    }
}
