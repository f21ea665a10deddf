//! # Hashing
//!
//! Keccak-256 for signed message digests and address derivation, SHA3-256
//! for Merkle tree nodes.

use sha3::{Digest, Keccak256, Sha3_256};
use shared_types::Hash;

/// Keccak256 hash function.
pub fn keccak256(data: &[u8]) -> Hash {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// SHA3-256 hash function.
pub fn sha3_256(data: &[u8]) -> Hash {
    let mut hasher = Sha3_256::new();
    hasher.update(data);
    hasher.finalize().into()
}
