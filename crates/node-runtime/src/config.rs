//! Startup configuration files.
//!
//! `genesis.json` (required) and `genesis-accounts.json` (optional) are
//! looked up in the process working directory, then one directory up.
//! Allocation order in `genesis.json` matters: the first `alloc` entry is
//! the designated genesis proposer, so parsing preserves map order.

use crate::errors::RuntimeError;
use dc_production::GenesisSpec;
use serde::Deserialize;
use shared_crypto::Keypair;
use shared_types::{Address, U256};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// `config` section of `genesis.json`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainConfig {
    pub chain_id: u64,
    /// Slot duration in seconds.
    pub block_time: u64,
    #[serde(default)]
    pub epoch_size: u64,
}

/// `genesis.json` as written on disk.
///
/// `alloc` stays a raw JSON map so the source file's key order survives
/// (serde_json is built with `preserve_order`).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenesisFile {
    pub config: ChainConfig,
    /// RFC 3339 timestamp of genesis.
    pub timestamp: String,
    #[serde(default)]
    pub extra_data: String,
    pub alloc: serde_json::Map<String, serde_json::Value>,
}

impl GenesisFile {
    /// Validate and convert into the production-layer spec.
    pub fn into_spec(self) -> Result<GenesisSpec, RuntimeError> {
        let timestamp = chrono::DateTime::parse_from_rfc3339(&self.timestamp)
            .map_err(|e| RuntimeError::InvalidConfig(format!("bad genesis timestamp: {e}")))?;
        let timestamp_ms = u64::try_from(timestamp.timestamp_millis())
            .map_err(|_| RuntimeError::InvalidConfig("genesis timestamp before 1970".into()))?;

        let extra_data = if self.extra_data.is_empty() {
            Vec::new()
        } else {
            decode_hex("extraData", &self.extra_data)?
        };

        let mut alloc = Vec::with_capacity(self.alloc.len());
        for (address_text, entry) in &self.alloc {
            let address = parse_address(address_text)?;
            let balance_text = entry
                .get("balance")
                .and_then(|value| value.as_str())
                .ok_or_else(|| {
                    RuntimeError::InvalidConfig(format!(
                        "alloc entry {address_text} has no string balance"
                    ))
                })?;
            let balance = U256::from_dec_str(balance_text).map_err(|e| {
                RuntimeError::InvalidConfig(format!("bad balance for {address_text}: {e}"))
            })?;
            alloc.push((address, balance));
        }

        Ok(GenesisSpec {
            chain_id: self.config.chain_id,
            timestamp_ms,
            extra_data,
            alloc,
        })
    }
}

/// One entry of `genesis-accounts.json`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidatorAccount {
    #[serde(default)]
    pub index: u64,
    pub address: String,
    #[serde(default)]
    pub public_key: String,
    #[serde(default)]
    pub private_key: String,
}

/// The validator set plus whatever signing keys the file carried.
#[derive(Debug)]
pub struct ValidatorConfig {
    pub addresses: Vec<Address>,
    pub keypairs: Vec<Keypair>,
}

/// Load `genesis.json` from the working directory or one up.
pub fn load_genesis_file(base: &Path) -> Result<GenesisFile, RuntimeError> {
    let path = locate(base, "genesis.json").ok_or(RuntimeError::GenesisConfigMissing)?;
    info!("[config] loading genesis from {}", path.display());
    let raw = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

/// Load the validator set from `genesis-accounts.json`, in file order.
/// A missing file falls back to the 256 synthetic addresses.
pub fn load_validator_config(base: &Path) -> Result<Option<ValidatorConfig>, RuntimeError> {
    let Some(path) = locate(base, "genesis-accounts.json") else {
        warn!("[config] no genesis-accounts.json, falling back to the synthetic validator set");
        return Ok(None);
    };
    info!("[config] loading validators from {}", path.display());
    let raw = std::fs::read_to_string(path)?;
    let accounts: Vec<ValidatorAccount> = serde_json::from_str(&raw)?;

    let mut addresses = Vec::with_capacity(accounts.len());
    let mut keypairs = Vec::new();
    for account in &accounts {
        let address = parse_address(&account.address)?;
        addresses.push(address);

        if account.private_key.is_empty() {
            continue;
        }
        let secret = decode_hex("privateKey", &account.private_key)?;
        let secret: [u8; 32] = secret.as_slice().try_into().map_err(|_| {
            RuntimeError::InvalidConfig(format!(
                "private key for {} is not 32 bytes",
                account.address
            ))
        })?;
        let keypair = Keypair::from_bytes(&secret).map_err(|e| {
            RuntimeError::InvalidConfig(format!("bad private key for {}: {e}", account.address))
        })?;
        if keypair.address() != address {
            return Err(RuntimeError::InvalidConfig(format!(
                "private key for {} does not derive that address",
                account.address
            )));
        }
        keypairs.push(keypair);
    }
    Ok(Some(ValidatorConfig { addresses, keypairs }))
}

fn locate(base: &Path, name: &str) -> Option<PathBuf> {
    let local = base.join(name);
    if local.is_file() {
        return Some(local);
    }
    let parent = base.join("..").join(name);
    parent.is_file().then_some(parent)
}

fn parse_address(text: &str) -> Result<Address, RuntimeError> {
    let raw = decode_hex("address", text)?;
    if raw.len() != 20 {
        return Err(RuntimeError::InvalidConfig(format!(
            "address {text} is not 20 bytes"
        )));
    }
    Ok(Address::from_slice(&raw))
}

fn decode_hex(field: &str, text: &str) -> Result<Vec<u8>, RuntimeError> {
    hex::decode(text.trim_start_matches("0x"))
        .map_err(|e| RuntimeError::InvalidConfig(format!("bad hex in {field}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    const GENESIS_JSON: &str = r#"{
        "config": { "chainId": 999, "blockTime": 12, "epochSize": 32 },
        "timestamp": "2024-01-01T00:00:00Z",
        "extraData": "0xdeadbeef",
        "alloc": {
            "0x00000000000000000000000000000000000000aa": { "balance": "100" },
            "0x00000000000000000000000000000000000000bb": { "balance": "50" }
        }
    }"#;

    #[test]
    fn test_genesis_parse_preserves_alloc_order() {
        let file: GenesisFile = serde_json::from_str(GENESIS_JSON).unwrap();
        let spec = file.into_spec().unwrap();

        assert_eq!(spec.chain_id, 999);
        assert_eq!(spec.alloc.len(), 2);
        // First key in the source file is the genesis proposer.
        assert_eq!(spec.proposer(), Address::from_low_u64_be(0xAA));
        assert_eq!(spec.alloc[0].1, U256::from(100u64));
        assert_eq!(spec.alloc[1].1, U256::from(50u64));
        assert_eq!(spec.extra_data, vec![0xDE, 0xAD, 0xBE, 0xEF]);
    }

    #[test]
    fn test_genesis_timestamp_to_millis() {
        let file: GenesisFile = serde_json::from_str(GENESIS_JSON).unwrap();
        let spec = file.into_spec().unwrap();
        // 2024-01-01T00:00:00Z.
        assert_eq!(spec.timestamp_ms, 1_704_067_200_000);
    }

    #[test]
    fn test_bad_balance_rejected() {
        let broken = GENESIS_JSON.replace("\"100\"", "\"not-a-number\"");
        let file: GenesisFile = serde_json::from_str(&broken).unwrap();
        assert!(matches!(
            file.into_spec(),
            Err(RuntimeError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_validator_accounts_roundtrip() {
        let mut secret = [0u8; 32];
        secret[31] = 5;
        let keypair = Keypair::from_bytes(&secret).unwrap();
        let json = format!(
            r#"[{{ "index": 0, "address": "0x{}", "publicKey": "", "privateKey": "0x{}" }}]"#,
            hex::encode(keypair.address()),
            hex::encode(secret)
        );

        let accounts: Vec<ValidatorAccount> = serde_json::from_str(&json).unwrap();
        assert_eq!(accounts.len(), 1);
        let parsed = parse_address(&accounts[0].address).unwrap();
        assert_eq!(parsed, keypair.address());
    }

    #[test]
    fn test_address_validation() {
        assert!(parse_address("0x00000000000000000000000000000000000000aa").is_ok());
        assert!(parse_address("0x1234").is_err());
        assert!(parse_address("zz").is_err());
    }
}
