//! Persisted key layout.

use primitive_types::H256;

/// `b:n:<be-u64>` -> block hash.
pub fn block_by_number(number: u64) -> Vec<u8> {
    let mut key = Vec::with_capacity(12);
    key.extend_from_slice(b"b:n:");
    key.extend_from_slice(&number.to_be_bytes());
    key
}

/// `b:h:<hash>` -> RLP(block).
pub fn block_by_hash(hash: &H256) -> Vec<u8> {
    let mut key = Vec::with_capacity(36);
    key.extend_from_slice(b"b:h:");
    key.extend_from_slice(hash.as_bytes());
    key
}

/// `r:<txHash>` -> RLP(receipt).
pub fn receipt_by_tx(tx_hash: &H256) -> Vec<u8> {
    let mut key = Vec::with_capacity(34);
    key.extend_from_slice(b"r:");
    key.extend_from_slice(tx_hash.as_bytes());
    key
}

/// `r:<blockHash>:<be-u64 index>` -> tx hash.
pub fn receipt_by_block_index(block_hash: &H256, index: u64) -> Vec<u8> {
    let mut key = Vec::with_capacity(43);
    key.extend_from_slice(b"r:");
    key.extend_from_slice(block_hash.as_bytes());
    key.push(b':');
    key.extend_from_slice(&index.to_be_bytes());
    key
}

/// `s:<nodeHash>` -> RLP(MPT node). Owned by the state trie backend.
pub fn state_node(hash: &H256) -> Vec<u8> {
    let mut key = Vec::with_capacity(34);
    key.extend_from_slice(b"s:");
    key.extend_from_slice(hash.as_bytes());
    key
}

/// `meta:tip` -> big-endian u64 latest block number.
pub const META_TIP: &[u8] = b"meta:tip";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_keys_sort_in_block_order() {
        assert!(block_by_number(1) < block_by_number(2));
        assert!(block_by_number(255) < block_by_number(256));
        assert!(block_by_number(u32::MAX as u64) < block_by_number(u64::from(u32::MAX) + 1));
    }

    #[test]
    fn test_namespaces_do_not_collide() {
        let hash = H256::repeat_byte(0xAB);
        let keys = [
            block_by_hash(&hash),
            receipt_by_tx(&hash),
            state_node(&hash),
            receipt_by_block_index(&hash, 0),
        ];
        for (i, a) in keys.iter().enumerate() {
            for b in keys.iter().skip(i + 1) {
                assert_ne!(a, b);
            }
        }
    }
}
