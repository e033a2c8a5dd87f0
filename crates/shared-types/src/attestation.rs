//! Validators and attestations.

use crate::{Address, Hash};
use shared_crypto::{keccak256_concat, recover_address_from_bytes, Keypair};

/// A validator known to the chain. The active set is fixed at genesis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validator {
    pub address: Address,
    pub active: bool,
    /// Slot at which the validator entered the set (0 for genesis).
    pub registered_at: u64,
}

impl Validator {
    pub fn genesis(address: Address) -> Self {
        Self {
            address,
            active: true,
            registered_at: 0,
        }
    }
}

/// A committee member's signed endorsement of a proposed block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attestation {
    pub slot: u64,
    pub block_hash: Hash,
    pub validator: Address,
    /// Recoverable signature, `r || s || recovery_id`.
    pub signature: [u8; 65],
}

impl Attestation {
    /// The message committee members sign:
    /// `keccak("attest-" || be64(slot) || blockHash)`.
    pub fn signing_message(slot: u64, block_hash: &Hash) -> Hash {
        keccak256_concat(&[b"attest-", &slot.to_be_bytes(), block_hash.as_bytes()])
    }

    /// Produce an attestation signed by `keypair`.
    pub fn sign(slot: u64, block_hash: Hash, keypair: &Keypair) -> Option<Self> {
        let message = Self::signing_message(slot, &block_hash);
        let signature = keypair.sign_hash(&message).ok()?;
        Some(Self {
            slot,
            block_hash,
            validator: keypair.address(),
            signature: signature.to_bytes(),
        })
    }

    /// True if the signature recovers to the claimed validator address.
    pub fn verify(&self) -> bool {
        let message = Self::signing_message(self.slot, &self.block_hash);
        matches!(
            recover_address_from_bytes(&message, &self.signature),
            Ok(address) if address == self.validator
        )
    }
}
