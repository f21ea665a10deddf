//! # Domain Module
//!
//! Accounts, batches, the payload codec and the payout Merkle tree.

pub mod entities;
pub mod errors;
pub mod merkle;
pub mod payload;

pub use entities::*;
pub use errors::*;
pub use merkle::{leaf_hash, PayoutTree, ProofNode, SiblingPosition, SENTINEL_HASH};
pub use payload::{PayloadError, PayoutEntry};
