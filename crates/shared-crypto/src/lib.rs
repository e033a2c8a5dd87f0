//! # shared-crypto
//!
//! Cryptographic primitives shared by all Dustin-Chain subsystems.
//!
//! ## Contents
//!
//! - **Keccak-256** hashing (the only hash the chain uses)
//! - **secp256k1 ECDSA** with recoverable signatures and EIP-155 replay
//!   protection
//!
//! All functions here are pure: same input, same output, no ambient state.

pub mod ecdsa;
pub mod errors;
pub mod hashing;

pub use ecdsa::{recover_address, recover_address_from_bytes, Keypair, RecoverableSignature};
pub use errors::CryptoError;
pub use hashing::{keccak256, keccak256_concat};
