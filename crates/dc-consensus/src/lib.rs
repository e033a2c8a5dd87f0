//! # dc-consensus
//!
//! Slot-based proof-of-stake consensus primitives.
//!
//! ## Responsibilities
//!
//! - The static validator set loaded at genesis
//! - Pure, deterministic proposer and committee selection per slot
//! - Attestation gathering with a per-slot deadline and duplicate discard
//! - The strict two-thirds supermajority test that decides commit vs
//!   rollback

pub mod collector;
pub mod domain;

pub use collector::{AttestationCollector, Attestor, LocalAttestor};
pub use domain::errors::ConsensusError;
pub use domain::validator_set::{has_supermajority, ValidatorSet};
