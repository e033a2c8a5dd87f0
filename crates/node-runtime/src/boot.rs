//! Two-phase boot: open the backend, then create genesis or reopen the
//! committed state. Wires the constructor graph the driver runs on.

use crate::adapters::{RocksDbConfig, RocksDbStore};
use crate::config;
use crate::errors::RuntimeError;
use crate::query::ChainQuery;
use dc_consensus::{AttestationCollector, LocalAttestor, ValidatorSet};
use dc_evm::TransferExecutor;
use dc_mempool::TransactionPool;
use dc_production::{
    create_genesis_block, GenesisSpec, ProductionConfig, SlotDriver, SystemTimeSource,
};
use dc_state::StateManager;
use dc_storage::{BlockStore, InMemoryKvStore, KeyValueStore};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::info;

/// Fallback validator-set size when no `genesis-accounts.json` exists.
const SYNTHETIC_VALIDATOR_COUNT: usize = 256;

/// Node configuration.
#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// Data directory for the RocksDB backend.
    pub data_dir: String,
    /// Directory searched for `genesis.json` / `genesis-accounts.json`
    /// (that directory, then one up).
    pub config_dir: PathBuf,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            data_dir: "./data/db".to_string(),
            config_dir: PathBuf::from("."),
        }
    }
}

/// A booted node: the wired component graph plus the driver.
pub struct Node {
    pub driver: Arc<SlotDriver>,
    pub query: Arc<ChainQuery>,
    pub state: Arc<Mutex<StateManager>>,
    pub pool: Arc<Mutex<TransactionPool>>,
    pub block_store: Arc<BlockStore>,
    pub validators: Arc<ValidatorSet>,
}

impl Node {
    /// Boot against RocksDB using the on-disk configuration files.
    pub fn boot(config: &NodeConfig) -> Result<Self, RuntimeError> {
        // Phase 1: open the backend.
        let kv: Arc<dyn KeyValueStore> = Arc::new(RocksDbStore::open(
            &config.data_dir,
            RocksDbConfig::default(),
        )?);

        let spec = config::load_genesis_file(&config.config_dir)?.into_spec()?;
        let validators = config::load_validator_config(&config.config_dir)?;
        Self::boot_with(kv, spec, validators)
    }

    /// Boot against an in-memory backend. Test entrypoint.
    pub fn boot_in_memory(
        spec: GenesisSpec,
        validators: Option<config::ValidatorConfig>,
    ) -> Result<Self, RuntimeError> {
        let kv: Arc<dyn KeyValueStore> = Arc::new(InMemoryKvStore::new());
        Self::boot_with(kv, spec, validators)
    }

    /// Phase 2 over an already-open backend: create the genesis block on
    /// an empty store, or reopen the state trie at the latest block's
    /// state root, refusing to start when that root is not durable.
    pub fn boot_with(
        kv: Arc<dyn KeyValueStore>,
        spec: GenesisSpec,
        validators: Option<config::ValidatorConfig>,
    ) -> Result<Self, RuntimeError> {
        let block_store = Arc::new(BlockStore::new(Arc::clone(&kv)));

        let state = match block_store.latest()? {
            Some(tip) => {
                info!(
                    "[boot] resuming at block #{} {:?}, state root {:?}",
                    tip.number(),
                    tip.hash(),
                    tip.header.state_root
                );
                StateManager::open_at(Arc::clone(&kv), tip.header.state_root)?
            }
            None => {
                info!("[boot] empty store, creating genesis");
                let mut state = StateManager::new(Arc::clone(&kv));
                let genesis = create_genesis_block(&spec, &mut state)?;
                block_store.save(&genesis, &[])?;
                state
            }
        };

        let (validator_set, attestor_keys) = match validators {
            Some(config) => (ValidatorSet::new(config.addresses), config.keypairs),
            None => (ValidatorSet::synthetic(SYNTHETIC_VALIDATOR_COUNT), Vec::new()),
        };
        info!(
            "[boot] validator set of {}, {} local signing key(s)",
            validator_set.len(),
            attestor_keys.len()
        );

        let production_config = ProductionConfig {
            chain_id: spec.chain_id,
            slot_ms: shared_types::SLOT_MS,
            ..ProductionConfig::default()
        };
        let collector = AttestationCollector::new(
            Arc::new(LocalAttestor::new(attestor_keys)),
            Duration::from_millis(production_config.attestation_deadline_ms),
        );

        let state = Arc::new(Mutex::new(state));
        let pool = Arc::new(Mutex::new(TransactionPool::with_defaults()));
        let validators = Arc::new(validator_set);

        let driver = Arc::new(SlotDriver::new(
            production_config.clone(),
            Arc::clone(&state),
            Arc::clone(&pool),
            Arc::clone(&block_store),
            Arc::clone(&validators),
            collector,
            Arc::new(TransferExecutor::new()),
            Arc::new(SystemTimeSource),
        ));
        let query = Arc::new(ChainQuery::new(
            production_config.chain_id,
            Arc::clone(&state),
            Arc::clone(&pool),
            Arc::clone(&block_store),
        ));

        Ok(Self {
            driver,
            query,
            state,
            pool,
            block_store,
            validators,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::{Address, U256, CHAIN_ID};

    fn spec() -> GenesisSpec {
        GenesisSpec {
            chain_id: CHAIN_ID,
            timestamp_ms: 1_704_067_200_000,
            extra_data: Vec::new(),
            alloc: vec![
                (Address::repeat_byte(0xAA), U256::from(100u64)),
                (Address::repeat_byte(0xBB), U256::from(50u64)),
            ],
        }
    }

    #[tokio::test]
    async fn test_fresh_boot_creates_genesis() {
        let node = Node::boot_in_memory(spec(), None).unwrap();

        let genesis = node.block_store.find_by_number(0).unwrap().unwrap();
        assert_eq!(genesis.number(), 0);
        assert_eq!(genesis.header.parent_hash, shared_types::GENESIS_PARENT_HASH);
        assert_eq!(genesis.header.tx_root, shared_types::EMPTY_TRIE_ROOT);
        assert_eq!(genesis.header.proposer, Address::repeat_byte(0xAA));

        let account = node.query.get_account(&Address::repeat_byte(0xAA)).await.unwrap();
        assert_eq!(account.balance, U256::from(100u64));
    }

    #[tokio::test]
    async fn test_reboot_resumes_from_committed_state() {
        let kv: Arc<dyn KeyValueStore> = Arc::new(InMemoryKvStore::new());
        {
            let node = Node::boot_with(Arc::clone(&kv), spec(), None).unwrap();
            drop(node);
        }

        // Second boot over the same backend resumes instead of recreating.
        let node = Node::boot_with(Arc::clone(&kv), spec(), None).unwrap();
        assert_eq!(node.block_store.count().unwrap(), 1);
        let account = node.query.get_account(&Address::repeat_byte(0xBB)).await.unwrap();
        assert_eq!(account.balance, U256::from(50u64));
    }

    #[tokio::test]
    async fn test_synthetic_fallback_validator_set() {
        let node = Node::boot_in_memory(spec(), None).unwrap();
        assert_eq!(node.validators.len(), 256);
    }
}
