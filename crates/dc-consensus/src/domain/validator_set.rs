//! The validator set and per-slot selection.

use crate::domain::errors::ConsensusError;
use crate::domain::shuffle::{shuffle, SeededRng};
use shared_crypto::keccak256;
use shared_types::{Address, Validator, COMMITTEE_SIZE};
use std::collections::HashMap;

/// The active validator set, fixed at genesis.
///
/// `select_proposer` and `select_committee` are pure in (slot, set): same
/// inputs produce the same output on every invocation and across
/// processes.
#[derive(Debug, Clone)]
pub struct ValidatorSet {
    validators: Vec<Validator>,
    /// Quick membership lookup by address.
    lookup: HashMap<Address, usize>,
}

impl ValidatorSet {
    /// Build the set from genesis addresses, in file order.
    pub fn new(addresses: Vec<Address>) -> Self {
        let validators: Vec<Validator> = addresses.into_iter().map(Validator::genesis).collect();
        let lookup = validators
            .iter()
            .enumerate()
            .map(|(index, validator)| (validator.address, index))
            .collect();
        Self { validators, lookup }
    }

    /// Fallback set of `count` synthetic addresses `0x00..01`, `0x00..02`,
    /// and so on, used when no validator file is present.
    pub fn synthetic(count: usize) -> Self {
        let addresses = (1..=count as u64)
            .map(|value| {
                let mut bytes = [0u8; 20];
                bytes[12..].copy_from_slice(&value.to_be_bytes());
                Address::from(bytes)
            })
            .collect();
        Self::new(addresses)
    }

    pub fn len(&self) -> usize {
        self.validators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }

    pub fn contains(&self, address: &Address) -> bool {
        self.lookup.contains_key(address)
    }

    pub fn get(&self, address: &Address) -> Option<&Validator> {
        self.lookup.get(address).map(|&index| &self.validators[index])
    }

    fn active_addresses(&self) -> Vec<Address> {
        self.validators
            .iter()
            .filter(|validator| validator.active)
            .map(|validator| validator.address)
            .collect()
    }

    /// Deterministic proposer for a slot.
    ///
    /// Seed: `Keccak-256("randao-" || slot || "-proposer")`; the proposer
    /// index is the seed's leading 8 bytes modulo the active set size.
    pub fn select_proposer(&self, slot: u64) -> Result<Address, ConsensusError> {
        let active = self.active_addresses();
        if active.is_empty() {
            return Err(ConsensusError::EmptyValidatorSet);
        }
        let seed = selection_seed(slot, "proposer");
        let index = (u64::from_be_bytes(seed) % active.len() as u64) as usize;
        Ok(active[index])
    }

    /// Deterministic committee for a slot: a seeded Fisher-Yates shuffle
    /// of the active validators, truncated to
    /// `min(|active|, COMMITTEE_SIZE)`.
    ///
    /// Seed: `Keccak-256("randao-" || slot || "-committee")`.
    pub fn select_committee(&self, slot: u64) -> Result<Vec<Address>, ConsensusError> {
        let mut active = self.active_addresses();
        if active.is_empty() {
            return Err(ConsensusError::EmptyValidatorSet);
        }
        let seed = selection_seed(slot, "committee");
        let mut rng = SeededRng::from_seed_bytes(&seed);
        shuffle(&mut active, &mut rng);
        active.truncate(COMMITTEE_SIZE.min(active.len()));
        Ok(active)
    }
}

/// Strict two-thirds supermajority: `3 * attestations >= 2 * committee`.
pub fn has_supermajority(attestation_count: usize, committee_size: usize) -> bool {
    attestation_count * 3 >= committee_size * 2
}

fn selection_seed(slot: u64, role: &str) -> [u8; 8] {
    let digest = keccak256(format!("randao-{slot}-{role}").as_bytes());
    let mut seed = [0u8; 8];
    seed.copy_from_slice(&digest.as_bytes()[0..8]);
    seed
}
