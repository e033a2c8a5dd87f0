//! Attestation gathering.

use async_trait::async_trait;
use primitive_types::H256;
use shared_crypto::Keypair;
use shared_types::{Address, Attestation, SLOT_MS};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace};

/// Source of one committee member's attestation.
///
/// In-process nodes answer from [`LocalAttestor`]; a networked deployment
/// would answer over the wire behind the same trait. `None` means the
/// validator abstains (no key, offline, refuses the block).
#[async_trait]
pub trait Attestor: Send + Sync {
    async fn request_attestation(
        &self,
        validator: Address,
        slot: u64,
        block_hash: H256,
    ) -> Option<Attestation>;
}

/// Attestor backed by locally held validator keys.
pub struct LocalAttestor {
    keys: HashMap<Address, Keypair>,
}

impl LocalAttestor {
    pub fn new(keypairs: Vec<Keypair>) -> Self {
        let keys = keypairs
            .into_iter()
            .map(|keypair| (keypair.address(), keypair))
            .collect();
        Self { keys }
    }

    pub fn key_count(&self) -> usize {
        self.keys.len()
    }
}

#[async_trait]
impl Attestor for LocalAttestor {
    async fn request_attestation(
        &self,
        validator: Address,
        slot: u64,
        block_hash: H256,
    ) -> Option<Attestation> {
        let keypair = self.keys.get(&validator)?;
        Attestation::sign(slot, block_hash, keypair)
    }
}

/// Solicits one attestation per committee member under a per-slot
/// deadline.
///
/// Collected attestations are verified and de-duplicated; a timed-out
/// collection is treated as "collected so far" for the supermajority
/// test.
pub struct AttestationCollector {
    attestor: Arc<dyn Attestor>,
    deadline: Duration,
}

impl AttestationCollector {
    /// `deadline` is clamped to one slot.
    pub fn new(attestor: Arc<dyn Attestor>, deadline: Duration) -> Self {
        let cap = Duration::from_millis(SLOT_MS);
        Self {
            attestor,
            deadline: deadline.min(cap),
        }
    }

    /// Collector with the default deadline of a third of a slot.
    pub fn with_default_deadline(attestor: Arc<dyn Attestor>) -> Self {
        Self::new(attestor, Duration::from_millis(SLOT_MS / 3))
    }

    /// Gather attestations for `block_hash` from the committee.
    ///
    /// Discards: duplicates from the same validator, attestations for a
    /// different slot or block, non-members, and invalid signatures.
    pub async fn collect(
        &self,
        slot: u64,
        block_hash: H256,
        committee: &[Address],
    ) -> Vec<Attestation> {
        let members: HashSet<Address> = committee.iter().copied().collect();
        let mut seen: HashSet<Address> = HashSet::new();
        let mut attestations = Vec::new();

        let deadline = tokio::time::Instant::now() + self.deadline;
        for validator in committee {
            let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
            if remaining.is_zero() {
                debug!(
                    "[consensus] attestation deadline hit with {}/{} collected",
                    attestations.len(),
                    committee.len()
                );
                break;
            }

            let request = self.attestor.request_attestation(*validator, slot, block_hash);
            let response = match tokio::time::timeout(remaining, request).await {
                Ok(response) => response,
                Err(_) => {
                    debug!("[consensus] attestation request to {validator:?} timed out");
                    break;
                }
            };

            let Some(attestation) = response else {
                trace!("[consensus] {validator:?} abstained");
                continue;
            };
            if attestation.slot != slot
                || attestation.block_hash != block_hash
                || !members.contains(&attestation.validator)
                || seen.contains(&attestation.validator)
                || !attestation.verify()
            {
                trace!("[consensus] discarding attestation from {validator:?}");
                continue;
            }
            seen.insert(attestation.validator);
            attestations.push(attestation);
        }
        attestations
    }
}
