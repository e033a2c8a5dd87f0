//! Genesis block creation.
//!
//! Bootstraps the chain: allocations are credited inside the first journal
//! frame, the frame commits, and block #0 is assembled over the resulting
//! state root with the zero parent hash.

use crate::error::ProductionError;
use dc_state::StateManager;
use primitive_types::U256;
use shared_types::{
    Address, Block, BlockHeader, EMPTY_TRIE_ROOT, GENESIS_PARENT_HASH,
};
use tracing::info;

/// Parsed genesis configuration, allocation order preserved.
#[derive(Debug, Clone)]
pub struct GenesisSpec {
    pub chain_id: u64,
    /// Genesis time, unix milliseconds. Anchors the slot clock.
    pub timestamp_ms: u64,
    pub extra_data: Vec<u8>,
    /// Initial balances in file order; the first entry is the designated
    /// genesis proposer.
    pub alloc: Vec<(Address, U256)>,
}

impl GenesisSpec {
    pub fn proposer(&self) -> Address {
        self.alloc
            .first()
            .map(|(address, _)| *address)
            .unwrap_or_default()
    }
}

/// Credit the allocations, commit the first journal frame, and build
/// block #0. The caller persists the block.
pub fn create_genesis_block(
    spec: &GenesisSpec,
    state: &mut StateManager,
) -> Result<Block, ProductionError> {
    state.start_block()?;
    for (address, balance) in &spec.alloc {
        state.add_balance(*address, *balance)?;
    }
    let state_root = state.commit_block()?;

    let header = BlockHeader {
        parent_hash: GENESIS_PARENT_HASH,
        state_root,
        tx_root: EMPTY_TRIE_ROOT,
        receipt_root: EMPTY_TRIE_ROOT,
        number: 0,
        timestamp: spec.timestamp_ms,
        proposer: spec.proposer(),
    };
    let block = Block {
        header,
        transactions: Vec::new(),
    };
    info!(
        "[genesis] created block #0 {:?} with {} allocation(s)",
        block.hash(),
        spec.alloc.len()
    );
    Ok(block)
}
