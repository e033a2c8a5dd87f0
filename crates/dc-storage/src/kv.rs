//! Key-value store abstraction.
//!
//! Production: a RocksDB adapter in `node-runtime`.
//! Testing: [`InMemoryKvStore`] below.

use crate::errors::KvStoreError;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

/// Abstract interface for key-value database operations.
///
/// Implementations must make [`KeyValueStore::atomic_batch_write`]
/// all-or-nothing: either every operation in the batch is applied, or none
/// are.
pub trait KeyValueStore: Send + Sync {
    /// Get a value by key.
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, KvStoreError>;

    /// Put a single key-value pair.
    fn put(&self, key: &[u8], value: &[u8]) -> Result<(), KvStoreError>;

    /// Delete a key.
    fn delete(&self, key: &[u8]) -> Result<(), KvStoreError>;

    /// Execute an atomic batch write.
    fn atomic_batch_write(&self, operations: Vec<BatchOperation>) -> Result<(), KvStoreError>;

    /// Check if a key exists.
    fn exists(&self, key: &[u8]) -> Result<bool, KvStoreError> {
        Ok(self.get(key)?.is_some())
    }
}

/// Batch operation for atomic writes.
#[derive(Debug, Clone)]
pub enum BatchOperation {
    /// Put a key-value pair.
    Put { key: Vec<u8>, value: Vec<u8> },
    /// Delete a key.
    Delete { key: Vec<u8> },
}

impl BatchOperation {
    /// Create a Put operation.
    pub fn put(key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Self {
        BatchOperation::Put {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Create a Delete operation.
    pub fn delete(key: impl Into<Vec<u8>>) -> Self {
        BatchOperation::Delete { key: key.into() }
    }
}

/// In-memory store for tests and throwaway nodes.
///
/// Writes can be made to fail on demand to exercise commit-abort paths.
#[derive(Default)]
pub struct InMemoryKvStore {
    map: RwLock<BTreeMap<Vec<u8>, Vec<u8>>>,
    fail_writes: AtomicBool,
}

impl InMemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write fail with `WriteFailed` until reset.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.map.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.read().unwrap().is_empty()
    }

    fn check_writable(&self) -> Result<(), KvStoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(KvStoreError::WriteFailed("injected failure".into()));
        }
        Ok(())
    }
}

impl KeyValueStore for InMemoryKvStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, KvStoreError> {
        Ok(self.map.read().unwrap().get(key).cloned())
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<(), KvStoreError> {
        self.check_writable()?;
        self.map
            .write()
            .unwrap()
            .insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn delete(&self, key: &[u8]) -> Result<(), KvStoreError> {
        self.check_writable()?;
        self.map.write().unwrap().remove(key);
        Ok(())
    }

    fn atomic_batch_write(&self, operations: Vec<BatchOperation>) -> Result<(), KvStoreError> {
        // Fail before touching the map so a failed batch applies nothing.
        self.check_writable()?;
        let mut map = self.map.write().unwrap();
        for operation in operations {
            match operation {
                BatchOperation::Put { key, value } => {
                    map.insert(key, value);
                }
                BatchOperation::Delete { key } => {
                    map.remove(&key);
                }
            }
        }
        Ok(())
    }
}
