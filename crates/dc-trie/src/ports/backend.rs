//! Node store abstraction.
//!
//! Production: an adapter over the node's key-value store (the `s:`
//! namespace). Testing: [`MemoryNodeStore`] below.

use crate::domain::errors::TrieError;
use primitive_types::H256;
use std::collections::HashMap;
use std::sync::RwLock;

/// Read access to committed trie nodes, keyed by `Keccak-256(RLP(node))`.
///
/// Writes go the other way: [`crate::Trie::commit`] returns the encoded
/// nodes and the host persists them in one atomic batch.
pub trait NodeStore: Send + Sync {
    fn get_node(&self, hash: &H256) -> Result<Option<Vec<u8>>, TrieError>;
}

/// In-memory node store for tests and throwaway root computations.
#[derive(Default)]
pub struct MemoryNodeStore {
    nodes: RwLock<HashMap<H256, Vec<u8>>>,
}

impl MemoryNodeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Persist a committed batch of nodes.
    pub fn apply(&self, nodes: Vec<(H256, Vec<u8>)>) {
        let mut guard = self.nodes.write().unwrap();
        for (hash, encoded) in nodes {
            guard.insert(hash, encoded);
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.read().unwrap().is_empty()
    }
}

impl NodeStore for MemoryNodeStore {
    fn get_node(&self, hash: &H256) -> Result<Option<Vec<u8>>, TrieError> {
        Ok(self.nodes.read().unwrap().get(hash).cloned())
    }
}
