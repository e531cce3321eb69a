//! Chaincore - validated block-tree core for a UTXO ledger
//!
//! This library maintains the accepted portion of a block tree and selects
//! the canonical (deepest) branch while keeping memory bounded:
//! - each branch carries its own UTXO set, so sibling branches may spend the
//!   same outputs in mutually exclusive ways
//! - the canonical head is the deepest node, with first-arrival tie-break
//! - branches that can no longer become canonical are pruned once they fall
//!   past a configurable retention horizon
//!
//! Mining, networking and persistence are external collaborators: a caller
//! submits candidate blocks and relay transactions, this crate decides what
//! is accepted and what the canonical state is.

pub mod config;
pub mod consensus;
pub mod core;
pub mod crypto;
pub mod error;

pub use error::{ChainError, RejectReason, Result};
