//! # shared-types
//!
//! Core domain entities for Dustin-Chain.
//!
//! ## Clusters
//!
//! - **Chain**: [`Block`], [`BlockHeader`], [`Transaction`],
//!   [`ValidatedTransaction`], [`Receipt`], [`Log`]
//! - **State**: [`Account`]
//! - **Consensus**: [`Validator`], [`Attestation`]
//!
//! Every wire-visible type carries its canonical RLP encoding here, next to
//! the type, so no two subsystems can disagree about bytes. Hashing is
//! always Keccak-256 over the canonical RLP.

pub mod account;
pub mod attestation;
pub mod block;
pub mod constants;
pub mod errors;
pub mod receipt;
pub mod transaction;

pub use account::Account;
pub use attestation::{Attestation, Validator};
pub use block::{Block, BlockHeader};
pub use constants::*;
pub use errors::TransactionError;
pub use receipt::{Bloom, Log, Receipt};
pub use transaction::{Transaction, TransactionKind, ValidatedTransaction};

/// A 20-byte account address.
pub type Address = primitive_types::H160;

/// A 32-byte Keccak-256 digest.
pub type Hash = primitive_types::H256;

/// Unbounded-range nonnegative integer for balances and values (Wei).
pub type U256 = primitive_types::U256;
