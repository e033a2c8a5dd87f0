//! # dc-evm
//!
//! The execution seam of the node.
//!
//! [`Executor`] is the contract the block assembler drives: execute one
//! signature-validated transaction against the journaled state and report
//! a result. The node ships [`TransferExecutor`], a restricted executor
//! that supports value transfers and rejects contract creation; a full EVM
//! can be slotted in behind the same trait.

pub mod errors;
pub mod executor;
pub mod transfer;

pub use errors::ExecutionError;
pub use executor::{contract_address, intrinsic_gas, BlockContext, ExecutionResult, Executor};
pub use transfer::TransferExecutor;
