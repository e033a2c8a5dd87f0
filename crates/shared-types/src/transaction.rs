//! Signed transactions, their canonical RLP form and sender recovery.

use crate::errors::TransactionError;
use crate::{Address, Hash};
use primitive_types::U256;
use rlp::{Decodable, DecoderError, Encodable, Rlp, RlpStream};
use serde::{Deserialize, Serialize};
use shared_crypto::{keccak256, recover_address, Keypair};

/// A signed transaction in its wire form.
///
/// The sender address is not carried on the wire; it is recovered from the
/// EIP-155 signature. `to = None` denotes contract creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub nonce: u64,
    pub gas_price: U256,
    pub gas_limit: u64,
    pub to: Option<Address>,
    pub value: U256,
    pub data: Vec<u8>,
    /// EIP-155 v: `chain_id * 2 + 35 + {0, 1}`.
    pub v: u64,
    pub r: U256,
    pub s: U256,
}

/// Closed union of the shapes a transaction can take, used as the wire
/// discriminator by the query surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum TransactionKind {
    /// Plain value transfer: `to` present, empty calldata.
    Transfer,
    /// Contract deployment: `to` absent, calldata is init code.
    ContractCreate,
    /// Call into existing code: `to` present, nonempty calldata.
    ContractCall,
}

impl Transaction {
    /// Transaction hash: Keccak-256 of the signed wire encoding.
    pub fn hash(&self) -> Hash {
        keccak256(&rlp::encode(self))
    }

    /// Which shape of the wire union this transaction is.
    pub fn kind(&self) -> TransactionKind {
        match (&self.to, self.data.is_empty()) {
            (None, _) => TransactionKind::ContractCreate,
            (Some(_), true) => TransactionKind::Transfer,
            (Some(_), false) => TransactionKind::ContractCall,
        }
    }

    /// EIP-155 signing payload hash:
    /// `keccak(rlp([nonce, gasPrice, gasLimit, to, value, data, chainId, 0, 0]))`.
    pub fn signing_hash(&self, chain_id: u64) -> Hash {
        let mut s = RlpStream::new_list(9);
        s.append(&self.nonce)
            .append(&self.gas_price)
            .append(&self.gas_limit);
        append_optional_address(&mut s, &self.to);
        s.append(&self.value)
            .append(&self.data)
            .append(&chain_id)
            .append(&0u8)
            .append(&0u8);
        keccak256(&s.out())
    }

    /// The y-parity encoded in `v`, or an error if `v` belongs to another
    /// chain.
    pub fn recovery_id(&self, chain_id: u64) -> Result<u8, TransactionError> {
        let base = chain_id
            .checked_mul(2)
            .and_then(|x| x.checked_add(35))
            .ok_or(TransactionError::BadChainId { v: self.v, chain_id })?;
        match self.v.checked_sub(base) {
            Some(parity @ 0..=1) => Ok(parity as u8),
            _ => Err(TransactionError::BadChainId { v: self.v, chain_id }),
        }
    }

    /// Recover the sender address from the signature.
    ///
    /// Fails on wrong chain id, high-s signatures, or unrecoverable points.
    pub fn recover_sender(&self, chain_id: u64) -> Result<Address, TransactionError> {
        let parity = self.recovery_id(chain_id)?;
        let prehash = self.signing_hash(chain_id);
        recover_address(&prehash, &self.r, &self.s, parity).map_err(TransactionError::Signature)
    }

    /// Sign an unsigned transaction in place, filling `v`, `r`, `s`.
    pub fn sign_with(mut self, keypair: &Keypair, chain_id: u64) -> Result<Self, TransactionError> {
        let prehash = self.signing_hash(chain_id);
        let sig = keypair.sign_hash(&prehash).map_err(TransactionError::Signature)?;
        self.v = chain_id * 2 + 35 + u64::from(sig.recovery_id);
        self.r = sig.r;
        self.s = sig.s;
        Ok(self)
    }
}

/// A transaction whose signature has already been checked, with the
/// recovered sender and wire hash cached alongside.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedTransaction {
    pub inner: Transaction,
    pub hash: Hash,
    pub sender: Address,
}

impl ValidatedTransaction {
    /// Validate the signature against `chain_id` and cache the derived
    /// fields.
    pub fn recover(inner: Transaction, chain_id: u64) -> Result<Self, TransactionError> {
        let sender = inner.recover_sender(chain_id)?;
        let hash = inner.hash();
        Ok(Self { inner, hash, sender })
    }
}

fn append_optional_address(s: &mut RlpStream, to: &Option<Address>) {
    match to {
        Some(address) => s.append(address),
        None => s.append_empty_data(),
    };
}

impl Encodable for Transaction {
    fn rlp_append(&self, s: &mut RlpStream) {
        s.begin_list(9);
        s.append(&self.nonce)
            .append(&self.gas_price)
            .append(&self.gas_limit);
        append_optional_address(s, &self.to);
        s.append(&self.value)
            .append(&self.data)
            .append(&self.v)
            .append(&self.r)
            .append(&self.s);
    }
}

impl Decodable for Transaction {
    fn decode(rlp: &Rlp<'_>) -> Result<Self, DecoderError> {
        if rlp.item_count()? != 9 {
            return Err(DecoderError::RlpIncorrectListLen);
        }
        let to_field = rlp.at(3)?;
        let to = if to_field.is_empty() {
            None
        } else {
            Some(to_field.as_val()?)
        };
        Ok(Self {
            nonce: rlp.val_at(0)?,
            gas_price: rlp.val_at(1)?,
            gas_limit: rlp.val_at(2)?,
            to,
            value: rlp.val_at(4)?,
            data: rlp.val_at(5)?,
            v: rlp.val_at(6)?,
            r: rlp.val_at(7)?,
            s: rlp.val_at(8)?,
        })
    }
}
