//! End-to-end slot scenarios over the in-memory stack.

use crate::support::*;
use dc_consensus::ValidatorSet;
use dc_storage::KeyValueStore;
use dc_trie::ordered_trie_root;
use node_runtime::Node;
use primitive_types::H256;
use shared_types::{EMPTY_TRIE_ROOT, GENESIS_PARENT_HASH, U256};
use std::sync::Arc;

#[tokio::test]
async fn test_genesis_startup() {
    let (_, node) = boot_node(
        vec![
            (alice().address(), U256::from(100u64)),
            (bob().address(), U256::from(50u64)),
        ],
        3,
    );

    let genesis = node.query.get_latest_block().unwrap().unwrap();
    assert_eq!(genesis.number(), 0);
    assert_eq!(genesis.header.parent_hash, GENESIS_PARENT_HASH);
    assert_eq!(genesis.header.tx_root, EMPTY_TRIE_ROOT);
    assert_eq!(genesis.header.timestamp, GENESIS_TIMESTAMP_MS);

    let a = node.query.get_account(&alice().address()).await.unwrap();
    let b = node.query.get_account(&bob().address()).await.unwrap();
    assert_eq!(a.balance, U256::from(100u64));
    assert_eq!(b.balance, U256::from(50u64));

    let stats = node.query.get_chain_stats().await.unwrap();
    assert_eq!(stats.tip_number, Some(0));
    assert_eq!(stats.block_count, 1);
}

#[tokio::test]
async fn test_happy_transfer_commits() {
    let (_, node) = boot_node(
        vec![
            (alice().address(), U256::from(100u64)),
            (bob().address(), U256::from(50u64)),
        ],
        3,
    );

    let tx = free_transfer(&alice(), bob().address(), 30, 0);
    let tx_hash = node
        .query
        .submit_transaction(&rlp::encode(&tx))
        .await
        .unwrap();

    node.driver.produce_slot(1).await.unwrap();

    let block = node.query.get_block_by_number(1).unwrap().unwrap();
    assert_eq!(block.transactions.len(), 1);

    let a = node.query.get_account(&alice().address()).await.unwrap();
    let b = node.query.get_account(&bob().address()).await.unwrap();
    assert_eq!(a.balance, U256::from(70u64));
    assert_eq!(a.nonce, 1);
    assert_eq!(b.balance, U256::from(80u64));

    let receipt = node.query.get_receipt(&tx_hash).unwrap().unwrap();
    assert_eq!(receipt.status, 1);
    assert_eq!(receipt.block_number, 1);
    assert_eq!(receipt.block_hash, block.hash());

    // The header's receipt root commits to the receipt before the block
    // hash was stamped into it.
    let mut unstamped = receipt.clone();
    unstamped.block_hash = H256::zero();
    let recomputed = ordered_trie_root(&[rlp::encode(&unstamped).to_vec()]).unwrap();
    assert_eq!(block.header.receipt_root, recomputed);

    // Included transaction left the pool.
    assert!(node.pool.lock().await.is_empty());
}

#[tokio::test]
async fn test_rollback_on_insufficient_attestations() {
    // Only 1 of 3 committee members can attest: no supermajority.
    let (_, node) = boot_node(
        vec![
            (alice().address(), U256::from(100u64)),
            (bob().address(), U256::from(50u64)),
        ],
        1,
    );

    let tx = free_transfer(&alice(), bob().address(), 30, 0);
    let tx_hash = node
        .query
        .submit_transaction(&rlp::encode(&tx))
        .await
        .unwrap();

    node.driver.produce_slot(1).await.unwrap();

    assert!(node.query.get_block_by_number(1).unwrap().is_none());
    let a = node.query.get_account(&alice().address()).await.unwrap();
    let b = node.query.get_account(&bob().address()).await.unwrap();
    assert_eq!(a.balance, U256::from(100u64));
    assert_eq!(a.nonce, 0);
    assert_eq!(b.balance, U256::from(50u64));

    // The transaction survives for the next slot.
    let pool = node.pool.lock().await;
    assert!(pool.contains(&tx_hash));
    assert_eq!(pool.pending_count(), 1);
}

#[tokio::test]
async fn test_intrinsic_failure_included_with_status_zero() {
    let (_, node) = boot_node(
        vec![
            (alice().address(), U256::from(1_000_000u64)),
            (bob().address(), U256::from(50u64)),
        ],
        3,
    );

    // Value exceeds the balance; gas is payable at 1 Wei per unit.
    let tx = paid_transfer(&alice(), bob().address(), 2_000_000, 0);
    let tx_hash = node
        .query
        .submit_transaction(&rlp::encode(&tx))
        .await
        .unwrap();

    node.driver.produce_slot(1).await.unwrap();

    let block = node.query.get_block_by_number(1).unwrap().unwrap();
    assert_eq!(block.transactions.len(), 1);

    let receipt = node.query.get_receipt(&tx_hash).unwrap().unwrap();
    assert_eq!(receipt.status, 0);
    assert_eq!(receipt.gas_used, 21_000);

    let a = node.query.get_account(&alice().address()).await.unwrap();
    let b = node.query.get_account(&bob().address()).await.unwrap();
    // Intrinsic gas charged, nonce consumed, value untouched.
    assert_eq!(a.balance, U256::from(979_000u64));
    assert_eq!(a.nonce, 1);
    assert_eq!(b.balance, U256::from(50u64));
}

#[tokio::test]
async fn test_restart_recovery() {
    let alloc = vec![
        (alice().address(), U256::from(100u64)),
        (bob().address(), U256::from(50u64)),
    ];
    let (kv, node) = boot_node(alloc.clone(), 3);

    let tx = free_transfer(&alice(), bob().address(), 30, 0);
    node.query
        .submit_transaction(&rlp::encode(&tx))
        .await
        .unwrap();
    node.driver.produce_slot(1).await.unwrap();
    drop(node);

    // Process restart: same backend, fresh wiring.
    let node = Node::boot_with(
        Arc::clone(&kv) as Arc<dyn KeyValueStore>,
        genesis_spec(alloc),
        Some(validator_config(3)),
    )
    .unwrap();

    assert_eq!(node.query.get_latest_block().unwrap().unwrap().number(), 1);
    let a = node.query.get_account(&alice().address()).await.unwrap();
    let b = node.query.get_account(&bob().address()).await.unwrap();
    assert_eq!(a.balance, U256::from(70u64));
    assert_eq!(b.balance, U256::from(80u64));

    // The driver resumes slot scheduling on the recovered chain.
    node.driver.start().unwrap();
    node.driver.stop().await;
}

#[tokio::test]
async fn test_deterministic_selection_across_instances() {
    let first = ValidatorSet::synthetic(256);
    let second = ValidatorSet::synthetic(256);

    assert_eq!(
        first.select_proposer(7).unwrap(),
        second.select_proposer(7).unwrap()
    );
    assert_eq!(
        first.select_committee(7).unwrap(),
        second.select_committee(7).unwrap()
    );
}

#[tokio::test]
async fn test_chain_grows_across_slots() {
    let (_, node) = boot_node(vec![(alice().address(), U256::from(1_000u64))], 3);

    node.query
        .submit_transaction(&rlp::encode(&free_transfer(
            &alice(),
            bob().address(),
            10,
            0,
        )))
        .await
        .unwrap();
    node.driver.produce_slot(1).await.unwrap();

    node.query
        .submit_transaction(&rlp::encode(&free_transfer(
            &alice(),
            bob().address(),
            20,
            1,
        )))
        .await
        .unwrap();
    node.driver.produce_slot(2).await.unwrap();

    assert_eq!(node.query.get_chain_stats().await.unwrap().block_count, 3);
    let two = node.query.get_block_by_number(2).unwrap().unwrap();
    let one = node.query.get_block_by_number(1).unwrap().unwrap();
    assert_eq!(two.header.parent_hash, one.hash());
    assert!(two.header.timestamp > one.header.timestamp);

    let b = node.query.get_account(&bob().address()).await.unwrap();
    assert_eq!(b.balance, U256::from(30u64));
}

#[tokio::test]
async fn test_proposer_earns_rewards() {
    let (_, node) = boot_node(vec![(alice().address(), U256::from(100u64))], 3);

    node.driver.produce_slot(1).await.unwrap();

    // Proposer reward plus a committee share: every validator balance in
    // committed state is nonzero after a committed slot.
    let proposer = node.validators.select_proposer(1).unwrap();
    let account = node.query.get_account(&proposer).await.unwrap();
    assert!(account.balance >= shared_types::proposer_reward());

    let share = shared_types::committee_reward_pool() / U256::from(3u64);
    for member in node.validators.select_committee(1).unwrap() {
        let balance = node.query.get_account(&member).await.unwrap().balance;
        assert!(balance >= share);
    }
}
