//! # Keccak-256 Hashing
//!
//! One-shot helpers over `sha3::Keccak256`. Every content address on the
//! chain (block hashes, transaction hashes, trie node hashes, account keys)
//! is a Keccak-256 digest.

use primitive_types::H256;
use sha3::{Digest, Keccak256};

/// Hash a byte slice with Keccak-256.
pub fn keccak256(data: &[u8]) -> H256 {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    H256::from_slice(&hasher.finalize())
}

/// Hash the concatenation of multiple inputs.
pub fn keccak256_concat(inputs: &[&[u8]]) -> H256 {
    let mut hasher = Keccak256::new();
    for input in inputs {
        hasher.update(input);
    }
    H256::from_slice(&hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keccak_empty_string() {
        // Well-known digest of the empty byte string.
        let expected =
            hex::decode("c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470")
                .unwrap();
        assert_eq!(keccak256(&[]).as_bytes(), expected.as_slice());
    }

    #[test]
    fn test_concat_matches_single_buffer() {
        let joined = keccak256(b"hello world");
        let parts = keccak256_concat(&[b"hello ", b"world"]);
        assert_eq!(joined, parts);
    }
}
