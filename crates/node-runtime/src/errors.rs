//! Runtime error types.

use thiserror::Error;

/// Fatal boot-time failures. The process refuses to start the driver on
/// any of these.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// `genesis.json` is missing from the working directory and its
    /// parent.
    #[error("genesis configuration not found (looked in ./genesis.json and ../genesis.json)")]
    GenesisConfigMissing,

    /// A configuration file exists but cannot be used.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    State(#[from] dc_state::StateError),

    #[error(transparent)]
    Storage(#[from] dc_storage::StorageError),

    #[error(transparent)]
    Kv(#[from] dc_storage::KvStoreError),

    #[error(transparent)]
    Production(#[from] dc_production::ProductionError),
}
