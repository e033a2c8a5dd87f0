//! Production adapters behind the storage ports.

pub mod rocksdb_store;

pub use rocksdb_store::{RocksDbConfig, RocksDbStore};
