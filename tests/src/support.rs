//! Shared fixtures: an in-memory node with real validator keys.

use dc_production::GenesisSpec;
use dc_storage::{InMemoryKvStore, KeyValueStore};
use node_runtime::config::ValidatorConfig;
use node_runtime::Node;
use shared_crypto::Keypair;
use shared_types::{Address, Transaction, ValidatedTransaction, CHAIN_ID, U256};
use std::sync::Arc;

pub const GENESIS_TIMESTAMP_MS: u64 = 1_704_067_200_000;

pub fn keypair(tag: u8) -> Keypair {
    let mut secret = [0u8; 32];
    secret[31] = tag;
    Keypair::from_bytes(&secret).unwrap()
}

/// Wallet keys used by scenarios (distinct from validator keys).
pub fn alice() -> Keypair {
    keypair(0xA1)
}

pub fn bob() -> Keypair {
    keypair(0xB1)
}

pub fn genesis_spec(alloc: Vec<(Address, U256)>) -> GenesisSpec {
    GenesisSpec {
        chain_id: CHAIN_ID,
        timestamp_ms: GENESIS_TIMESTAMP_MS,
        extra_data: Vec::new(),
        alloc,
    }
}

/// Three validators; `keyed` of them hold signing keys and can attest.
pub fn validator_config(keyed: usize) -> ValidatorConfig {
    let keypairs: Vec<Keypair> = (1..=3u8).map(keypair).collect();
    ValidatorConfig {
        addresses: keypairs.iter().map(|kp| kp.address()).collect(),
        keypairs: keypairs.into_iter().take(keyed).collect(),
    }
}

/// Boot an in-memory node over a fresh backend. Returns the backend too,
/// so restart scenarios can re-boot over it.
pub fn boot_node(
    alloc: Vec<(Address, U256)>,
    keyed_validators: usize,
) -> (Arc<InMemoryKvStore>, Node) {
    let kv = Arc::new(InMemoryKvStore::new());
    let node = Node::boot_with(
        Arc::clone(&kv) as Arc<dyn KeyValueStore>,
        genesis_spec(alloc),
        Some(validator_config(keyed_validators)),
    )
    .unwrap();
    (kv, node)
}

/// A signed transfer with zero gas price (scenario literals assume no fee
/// burn unless stated).
pub fn free_transfer(from: &Keypair, to: Address, value: u64, nonce: u64) -> Transaction {
    Transaction {
        nonce,
        gas_price: U256::zero(),
        gas_limit: 21_000,
        to: Some(to),
        value: U256::from(value),
        data: Vec::new(),
        v: 0,
        r: U256::zero(),
        s: U256::zero(),
    }
    .sign_with(from, CHAIN_ID)
    .unwrap()
}

/// A signed transfer paying one Wei per gas unit.
pub fn paid_transfer(from: &Keypair, to: Address, value: u64, nonce: u64) -> Transaction {
    Transaction {
        gas_price: U256::from(1u64),
        ..free_transfer(from, to, value, nonce)
    }
    .sign_with(from, CHAIN_ID)
    .unwrap()
}

pub fn validated(tx: Transaction) -> ValidatedTransaction {
    ValidatedTransaction::recover(tx, CHAIN_ID).unwrap()
}
