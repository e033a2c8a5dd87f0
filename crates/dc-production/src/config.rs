//! Production configuration.

use shared_types::{CHAIN_ID, SLOT_MS};

/// Tunables of the production pipeline.
#[derive(Debug, Clone)]
pub struct ProductionConfig {
    pub chain_id: u64,
    /// Slot duration in milliseconds.
    pub slot_ms: u64,
    /// Maximum transactions drained into one block.
    pub max_txs_per_block: usize,
    /// Attestation collection deadline, clamped to one slot.
    pub attestation_deadline_ms: u64,
}

impl Default for ProductionConfig {
    fn default() -> Self {
        Self {
            chain_id: CHAIN_ID,
            slot_ms: SLOT_MS,
            max_txs_per_block: 256,
            attestation_deadline_ms: SLOT_MS / 3,
        }
    }
}
