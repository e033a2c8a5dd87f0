//! # RocksDB Storage Adapter
//!
//! Production implementation of the `KeyValueStore` trait.
//!
//! ## Features
//!
//! - Atomic batch writes (WriteBatch)
//! - Snappy compression
//! - Write-ahead logging for durability
//!
//! Namespacing is done with key prefixes (`b:`, `r:`, `s:`, `meta:`), so
//! a single column family is enough.

use dc_storage::{BatchOperation, KeyValueStore, KvStoreError};
use rocksdb::{Options, WriteBatch, WriteOptions, DB};
use std::path::Path;
use tracing::info;

/// RocksDB tuning for the node's write pattern: one batch per committed
/// block, point reads otherwise.
#[derive(Debug, Clone)]
pub struct RocksDbConfig {
    /// Write buffer size in bytes.
    pub write_buffer_size: usize,
    /// fsync every batch. Costs latency, buys crash consistency.
    pub sync_writes: bool,
}

impl Default for RocksDbConfig {
    fn default() -> Self {
        Self {
            write_buffer_size: 64 * 1024 * 1024,
            sync_writes: true,
        }
    }
}

/// RocksDB-backed key-value store.
pub struct RocksDbStore {
    db: DB,
    config: RocksDbConfig,
}

impl RocksDbStore {
    /// Open or create the database under `path`.
    pub fn open(path: impl AsRef<Path>, config: RocksDbConfig) -> Result<Self, KvStoreError> {
        let mut options = Options::default();
        options.create_if_missing(true);
        options.set_write_buffer_size(config.write_buffer_size);
        options.set_compression_type(rocksdb::DBCompressionType::Snappy);

        let db = DB::open(&options, path.as_ref())
            .map_err(|e| KvStoreError::ReadFailed(format!("rocksdb open: {e}")))?;
        info!("[storage] rocksdb open at {}", path.as_ref().display());
        Ok(Self { db, config })
    }

    fn write_options(&self) -> WriteOptions {
        let mut options = WriteOptions::default();
        options.set_sync(self.config.sync_writes);
        options
    }
}

impl KeyValueStore for RocksDbStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, KvStoreError> {
        self.db
            .get(key)
            .map_err(|e| KvStoreError::ReadFailed(e.to_string()))
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<(), KvStoreError> {
        let mut batch = WriteBatch::default();
        batch.put(key, value);
        self.db
            .write_opt(batch, &self.write_options())
            .map_err(|e| KvStoreError::WriteFailed(e.to_string()))
    }

    fn delete(&self, key: &[u8]) -> Result<(), KvStoreError> {
        let mut batch = WriteBatch::default();
        batch.delete(key);
        self.db
            .write_opt(batch, &self.write_options())
            .map_err(|e| KvStoreError::WriteFailed(e.to_string()))
    }

    fn atomic_batch_write(&self, operations: Vec<BatchOperation>) -> Result<(), KvStoreError> {
        let mut batch = WriteBatch::default();
        for operation in operations {
            match operation {
                BatchOperation::Put { key, value } => batch.put(key, value),
                BatchOperation::Delete { key } => batch.delete(key),
            }
        }
        self.db
            .write_opt(batch, &self.write_options())
            .map_err(|e| KvStoreError::WriteFailed(e.to_string()))
    }
}
