//! Cross-crate chain invariants checked over real slot flows.

use crate::support::*;
use dc_state::StateManager;
use dc_storage::KeyValueStore;
use dc_trie::{ordered_trie_root, MemoryNodeStore, Trie};
use primitive_types::H256;
use shared_crypto::keccak256;
use shared_types::U256;
use std::sync::Arc;

#[tokio::test]
async fn test_block_hash_recomputes_from_stored_fields() {
    let (_, node) = boot_node(vec![(alice().address(), U256::from(1_000u64))], 3);
    node.query
        .submit_transaction(&rlp::encode(&free_transfer(&alice(), bob().address(), 1, 0)))
        .await
        .unwrap();
    node.driver.produce_slot(1).await.unwrap();

    for number in 0..=1 {
        let block = node.query.get_block_by_number(number).unwrap().unwrap();
        // The hash index must agree with Keccak-256(RLP(header)) recomputed
        // from the stored fields.
        let recomputed = block.header.hash();
        assert_eq!(
            node.query
                .get_block_by_hash(&recomputed)
                .unwrap()
                .unwrap()
                .number(),
            number
        );
    }
}

#[tokio::test]
async fn test_state_root_replays_from_accounts() {
    let (kv, node) = boot_node(
        vec![
            (alice().address(), U256::from(100u64)),
            (bob().address(), U256::from(50u64)),
        ],
        3,
    );
    node.query
        .submit_transaction(&rlp::encode(&free_transfer(&alice(), bob().address(), 30, 0)))
        .await
        .unwrap();
    node.driver.produce_slot(1).await.unwrap();

    let block = node.query.get_block_by_number(1).unwrap().unwrap();

    // Read every account as of the block's state root, then replay them
    // into a fresh trie.
    let at_block =
        StateManager::open_at(Arc::clone(&kv) as Arc<dyn KeyValueStore>, block.header.state_root)
            .unwrap();
    let mut replay = Trie::empty(Arc::new(MemoryNodeStore::new()));
    for address in [alice().address(), bob().address()] {
        let account = at_block.get_account(&address).unwrap();
        replay
            .insert(
                keccak256(address.as_bytes()).as_bytes(),
                rlp::encode(&account).to_vec(),
            )
            .unwrap();
    }
    assert_eq!(replay.root_hash(), block.header.state_root);
}

#[tokio::test]
async fn test_cumulative_gas_and_nonce_run() {
    let (_, node) = boot_node(vec![(alice().address(), U256::from(10_000_000u64))], 3);

    for nonce in 0..3 {
        node.query
            .submit_transaction(&rlp::encode(&paid_transfer(
                &alice(),
                bob().address(),
                100,
                nonce,
            )))
            .await
            .unwrap();
    }
    node.driver.produce_slot(1).await.unwrap();

    let block = node.query.get_block_by_number(1).unwrap().unwrap();
    assert_eq!(block.transactions.len(), 3);

    // Included nonces form a contiguous run from the sender's starting
    // nonce.
    let nonces: Vec<u64> = block.transactions.iter().map(|tx| tx.nonce).collect();
    assert_eq!(nonces, vec![0, 1, 2]);

    // Cumulative gas is nondecreasing and sums per-transaction gas.
    let mut total = 0u64;
    for index in 0..3 {
        let receipt = node
            .query
            .get_receipt(&block.transactions[index].hash())
            .unwrap()
            .unwrap();
        assert_eq!(receipt.tx_index, index as u64);
        total += receipt.gas_used;
        assert_eq!(receipt.cumulative_gas_used, total);
    }
    assert_eq!(total, 3 * 21_000);
}

#[tokio::test]
async fn test_tx_root_law() {
    let (_, node) = boot_node(vec![(alice().address(), U256::from(10_000u64))], 3);
    for nonce in 0..2 {
        node.query
            .submit_transaction(&rlp::encode(&free_transfer(
                &alice(),
                bob().address(),
                5,
                nonce,
            )))
            .await
            .unwrap();
    }
    node.driver.produce_slot(1).await.unwrap();

    let block = node.query.get_block_by_number(1).unwrap().unwrap();
    let encodings: Vec<Vec<u8>> = block
        .transactions
        .iter()
        .map(|tx| rlp::encode(tx).to_vec())
        .collect();
    assert_eq!(
        ordered_trie_root(&encodings).unwrap(),
        block.header.tx_root
    );
}

#[tokio::test]
async fn test_receipt_root_law() {
    let (_, node) = boot_node(vec![(alice().address(), U256::from(10_000u64))], 3);
    for nonce in 0..2 {
        node.query
            .submit_transaction(&rlp::encode(&free_transfer(
                &alice(),
                bob().address(),
                5,
                nonce,
            )))
            .await
            .unwrap();
    }
    node.driver.produce_slot(1).await.unwrap();

    let block = node.query.get_block_by_number(1).unwrap().unwrap();
    let encodings: Vec<Vec<u8>> = block
        .transactions
        .iter()
        .map(|tx| {
            let mut receipt = node.query.get_receipt(&tx.hash()).unwrap().unwrap();
            receipt.block_hash = H256::zero();
            rlp::encode(&receipt).to_vec()
        })
        .collect();
    assert_eq!(
        ordered_trie_root(&encodings).unwrap(),
        block.header.receipt_root
    );
}

#[tokio::test]
async fn test_no_balance_goes_negative_over_random_flow() {
    let (_, node) = boot_node(
        vec![
            (alice().address(), U256::from(500u64)),
            (bob().address(), U256::from(0u64)),
        ],
        3,
    );

    // A mix of affordable and unaffordable transfers across slots.
    let values = [100u64, 900, 50, 800, 25];
    for (nonce, value) in values.iter().enumerate() {
        node.query
            .submit_transaction(&rlp::encode(&free_transfer(
                &alice(),
                bob().address(),
                *value,
                nonce as u64,
            )))
            .await
            .unwrap();
    }
    node.driver.produce_slot(1).await.unwrap();

    let a = node.query.get_account(&alice().address()).await.unwrap();
    let b = node.query.get_account(&bob().address()).await.unwrap();
    // Successful transfers: 100 + 50 + 25; the 900 and 800 fail.
    assert_eq!(a.balance, U256::from(325u64));
    assert_eq!(b.balance, U256::from(175u64));
    assert_eq!(a.nonce, 5);
}

#[tokio::test]
async fn test_commit_reopen_equivalence() {
    let (kv, node) = boot_node(vec![(alice().address(), U256::from(777u64))], 3);
    node.driver.produce_slot(1).await.unwrap();

    let state = node.state.lock().await;
    let root = state.committed_root();
    let reopened =
        StateManager::open_at(Arc::clone(&kv) as Arc<dyn KeyValueStore>, root).unwrap();

    for address in [alice().address(), bob().address()] {
        assert_eq!(
            state.get_account(&address).unwrap(),
            reopened.get_account(&address).unwrap()
        );
    }
    for validator in node.validators.select_committee(1).unwrap() {
        assert_eq!(
            state.get_account(&validator).unwrap(),
            reopened.get_account(&validator).unwrap()
        );
    }
}
