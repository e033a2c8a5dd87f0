//! Process-wide chain constants.

use primitive_types::{H256, U256};

/// EIP-155 chain id.
pub const CHAIN_ID: u64 = 999;

/// Slot duration in milliseconds.
pub const SLOT_MS: u64 = 12_000;

/// Target committee size per slot.
pub const COMMITTEE_SIZE: usize = 128;

/// Wei per whole DSTN token.
pub const WEI_PER_DSTN: u128 = 1_000_000_000_000_000_000;

/// Root hash of the empty trie: Keccak-256 of RLP("").
pub const EMPTY_TRIE_ROOT: H256 = H256([
    0x56, 0xe8, 0x1f, 0x17, 0x1b, 0xcc, 0x55, 0xa6, 0xff, 0x83, 0x45, 0xe6, 0x92, 0xc0, 0xf8,
    0x6e, 0x5b, 0x48, 0xe0, 0x1b, 0x99, 0x6c, 0xad, 0xc0, 0x01, 0x62, 0x2f, 0xb5, 0xe3, 0x63,
    0xb4, 0x21,
]);

/// Keccak-256 of the empty byte string (code hash of externally owned
/// accounts).
pub const EMPTY_CODE_HASH: H256 = H256([
    0xc5, 0xd2, 0x46, 0x01, 0x86, 0xf7, 0x23, 0x3c, 0x92, 0x7e, 0x7d, 0xb2, 0xdc, 0xc7, 0x03,
    0xc0, 0xe5, 0x00, 0xb6, 0x53, 0xca, 0x82, 0x27, 0x3b, 0x7b, 0xfa, 0xd8, 0x04, 0x5d, 0x85,
    0xa4, 0x70,
]);

/// Parent hash of the genesis block (32 zero bytes).
pub const GENESIS_PARENT_HASH: H256 = H256([0u8; 32]);

/// Reward credited to the proposer of every committed block (2 DSTN).
pub fn proposer_reward() -> U256 {
    U256::from(2u64) * U256::from(WEI_PER_DSTN)
}

/// Pool split equally among included attesters per committed block (1 DSTN).
pub fn committee_reward_pool() -> U256 {
    U256::from(WEI_PER_DSTN)
}
