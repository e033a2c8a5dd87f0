//! Blocks and headers.

use crate::transaction::Transaction;
use crate::{Address, Hash};
use rlp::{Decodable, DecoderError, Encodable, Rlp, RlpStream};
use shared_crypto::keccak256;

/// Block header.
///
/// The block hash is Keccak-256 of the RLP list of the seven fields in
/// declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockHeader {
    pub parent_hash: Hash,
    pub state_root: Hash,
    pub tx_root: Hash,
    pub receipt_root: Hash,
    pub number: u64,
    /// Proposal time, unix milliseconds. Strictly greater than the parent's.
    pub timestamp: u64,
    pub proposer: Address,
}

impl BlockHeader {
    /// `Keccak-256(RLP([parentHash, stateRoot, txRoot, receiptRoot, number,
    /// timestamp, proposer]))`.
    pub fn hash(&self) -> Hash {
        keccak256(&rlp::encode(self))
    }
}

impl Encodable for BlockHeader {
    fn rlp_append(&self, s: &mut RlpStream) {
        s.begin_list(7)
            .append(&self.parent_hash)
            .append(&self.state_root)
            .append(&self.tx_root)
            .append(&self.receipt_root)
            .append(&self.number)
            .append(&self.timestamp)
            .append(&self.proposer);
    }
}

impl Decodable for BlockHeader {
    fn decode(rlp: &Rlp<'_>) -> Result<Self, DecoderError> {
        if rlp.item_count()? != 7 {
            return Err(DecoderError::RlpIncorrectListLen);
        }
        Ok(Self {
            parent_hash: rlp.val_at(0)?,
            state_root: rlp.val_at(1)?,
            tx_root: rlp.val_at(2)?,
            receipt_root: rlp.val_at(3)?,
            number: rlp.val_at(4)?,
            timestamp: rlp.val_at(5)?,
            proposer: rlp.val_at(6)?,
        })
    }
}

/// A block: header plus the ordered transaction list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub header: BlockHeader,
    pub transactions: Vec<Transaction>,
}

impl Block {
    pub fn hash(&self) -> Hash {
        self.header.hash()
    }

    pub fn number(&self) -> u64 {
        self.header.number
    }
}

impl Encodable for Block {
    fn rlp_append(&self, s: &mut RlpStream) {
        s.begin_list(2);
        s.append(&self.header);
        s.append_list(&self.transactions);
    }
}

impl Decodable for Block {
    fn decode(rlp: &Rlp<'_>) -> Result<Self, DecoderError> {
        if rlp.item_count()? != 2 {
            return Err(DecoderError::RlpIncorrectListLen);
        }
        Ok(Self {
            header: rlp.val_at(0)?,
            transactions: rlp.list_at(1)?,
        })
    }
}
