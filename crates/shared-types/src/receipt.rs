//! Execution receipts, logs and the 2048-bit logs bloom.

use crate::{Address, Hash};
use rlp::{Decodable, DecoderError, Encodable, Rlp, RlpStream};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use shared_crypto::keccak256;

/// A log emitted during execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Log {
    pub address: Address,
    pub topics: Vec<Hash>,
    pub data: Vec<u8>,
}

impl Encodable for Log {
    fn rlp_append(&self, s: &mut RlpStream) {
        s.begin_list(3).append(&self.address);
        s.append_list(&self.topics);
        s.append(&self.data);
    }
}

impl Decodable for Log {
    fn decode(rlp: &Rlp<'_>) -> Result<Self, DecoderError> {
        if rlp.item_count()? != 3 {
            return Err(DecoderError::RlpIncorrectListLen);
        }
        Ok(Self {
            address: rlp.val_at(0)?,
            topics: rlp.list_at(1)?,
            data: rlp.val_at(2)?,
        })
    }
}

/// 2048-bit bloom filter over log addresses and topics.
///
/// Each item sets three bits, chosen from the low 11 bits of byte pairs
/// (0,1), (2,3) and (4,5) of the item's Keccak-256 digest.
#[derive(Clone, PartialEq, Eq)]
pub struct Bloom(pub [u8; 256]);

impl Bloom {
    pub fn zero() -> Self {
        Self([0u8; 256])
    }

    /// Fold a log's address and topics into the filter.
    pub fn accrue_log(&mut self, log: &Log) {
        self.accrue(log.address.as_bytes());
        for topic in &log.topics {
            self.accrue(topic.as_bytes());
        }
    }

    /// OR another bloom into this one (per-block fold over receipts).
    pub fn accrue_bloom(&mut self, other: &Bloom) {
        for (byte, other_byte) in self.0.iter_mut().zip(other.0.iter()) {
            *byte |= other_byte;
        }
    }

    /// True if every bit an item would set is present. May false-positive,
    /// never false-negatives.
    pub fn might_contain(&self, item: &[u8]) -> bool {
        let digest = keccak256(item);
        let bytes = digest.as_bytes();
        (0..3).all(|i| {
            let bit = bit_index(bytes, i);
            self.0[255 - bit / 8] & (1 << (bit % 8)) != 0
        })
    }

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|b| *b == 0)
    }

    fn accrue(&mut self, item: &[u8]) {
        let digest = keccak256(item);
        let bytes = digest.as_bytes();
        for i in 0..3 {
            let bit = bit_index(bytes, i);
            self.0[255 - bit / 8] |= 1 << (bit % 8);
        }
    }
}

fn bit_index(digest: &[u8], pair: usize) -> usize {
    let hi = digest[pair * 2] as usize;
    let lo = digest[pair * 2 + 1] as usize;
    ((hi << 8) | lo) % 2048
}

impl Default for Bloom {
    fn default() -> Self {
        Self::zero()
    }
}

impl std::fmt::Debug for Bloom {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Bloom(0x{})", hex::encode(self.0))
    }
}

impl Serialize for Bloom {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("0x{}", hex::encode(self.0)))
    }
}

impl<'de> Deserialize<'de> for Bloom {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        let raw = hex::decode(text.trim_start_matches("0x"))
            .map_err(serde::de::Error::custom)?;
        if raw.len() != 256 {
            return Err(serde::de::Error::custom("bloom must be 256 bytes"));
        }
        let mut bytes = [0u8; 256];
        bytes.copy_from_slice(&raw);
        Ok(Self(bytes))
    }
}

impl Encodable for Bloom {
    fn rlp_append(&self, s: &mut RlpStream) {
        s.append(&self.0.to_vec());
    }
}

impl Decodable for Bloom {
    fn decode(rlp: &Rlp<'_>) -> Result<Self, DecoderError> {
        let data = rlp.data()?;
        if data.len() != 256 {
            return Err(DecoderError::RlpInvalidLength);
        }
        let mut bytes = [0u8; 256];
        bytes.copy_from_slice(data);
        Ok(Self(bytes))
    }
}

/// Receipt of one executed transaction.
///
/// Receipts of a block are ordered by transaction index, and
/// `cumulative_gas_used` is nondecreasing across the block. `block_hash` is
/// stamped after the block hash is known; the receipt root in the header
/// commits to receipts with this field still zeroed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    /// 1 for success, 0 for failure.
    pub status: u8,
    /// Gas used by the block up to and including this transaction.
    pub cumulative_gas_used: u64,
    pub logs_bloom: Bloom,
    pub logs: Vec<Log>,
    /// Address of the created contract, for creation transactions.
    pub contract_address: Option<Address>,
    pub tx_hash: Hash,
    pub tx_index: u64,
    pub block_hash: Hash,
    pub block_number: u64,
    pub from: Address,
    pub to: Option<Address>,
    /// Gas used by this transaction alone.
    pub gas_used: u64,
}

impl Encodable for Receipt {
    fn rlp_append(&self, s: &mut RlpStream) {
        s.begin_list(12);
        s.append(&self.status).append(&self.cumulative_gas_used);
        s.append(&self.logs_bloom);
        s.append_list(&self.logs);
        match &self.contract_address {
            Some(address) => s.append(address),
            None => s.append_empty_data(),
        };
        s.append(&self.tx_hash)
            .append(&self.tx_index)
            .append(&self.block_hash)
            .append(&self.block_number)
            .append(&self.from);
        match &self.to {
            Some(address) => s.append(address),
            None => s.append_empty_data(),
        };
        s.append(&self.gas_used);
    }
}

impl Decodable for Receipt {
    fn decode(rlp: &Rlp<'_>) -> Result<Self, DecoderError> {
        if rlp.item_count()? != 12 {
            return Err(DecoderError::RlpIncorrectListLen);
        }
        let contract_field = rlp.at(4)?;
        let contract_address = if contract_field.is_empty() {
            None
        } else {
            Some(contract_field.as_val()?)
        };
        let to_field = rlp.at(10)?;
        let to = if to_field.is_empty() {
            None
        } else {
            Some(to_field.as_val()?)
        };
        Ok(Self {
            status: rlp.val_at(0)?,
            cumulative_gas_used: rlp.val_at(1)?,
            logs_bloom: rlp.val_at(2)?,
            logs: rlp.list_at(3)?,
            contract_address,
            tx_hash: rlp.val_at(5)?,
            tx_index: rlp.val_at(6)?,
            block_hash: rlp.val_at(7)?,
            block_number: rlp.val_at(8)?,
            from: rlp.val_at(9)?,
            to,
            gas_used: rlp.val_at(11)?,
        })
    }
}
