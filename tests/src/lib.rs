//! # dc-tests
//!
//! Unified test suite for Dustin-Chain: end-to-end slot scenarios over the
//! in-memory stack, and cross-crate chain invariants.

#[cfg(test)]
mod support;

#[cfg(test)]
mod scenarios;

#[cfg(test)]
mod invariants;
