//! # dc-production
//!
//! The block production pipeline.
//!
//! ## Flow per slot
//!
//! 1. The [`slot::SlotDriver`] fires on an absolute slot boundary
//! 2. The validator set picks proposer and committee for the slot
//! 3. A journal frame opens and the [`assembler::BlockAssembler`] drains
//!    the pool, executes sequentially, and computes the block's roots and
//!    hash
//! 4. Attestations are gathered; with a two-thirds supermajority the frame
//!    commits, rewards are credited in a second frame, and the block is
//!    persisted. Otherwise the frame rolls back and the block is dropped
//!
//! Errors inside one slot never cross into the next: every slot starts
//! from a clean journal frame.

pub mod assembler;
pub mod config;
pub mod error;
pub mod genesis;
pub mod rewards;
pub mod slot;

pub use assembler::{AssembledBlock, BlockAssembler};
pub use config::ProductionConfig;
pub use error::ProductionError;
pub use genesis::{create_genesis_block, GenesisSpec};
pub use rewards::distribute_rewards;
pub use slot::{DriverState, SlotDriver, SystemTimeSource, TimeSource};
