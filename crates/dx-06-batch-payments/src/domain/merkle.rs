//! # Payout Merkle Tree
//!
//! Binary hash tree over the payouts of one batch.
//!
//! ```text
//!                    root
//!                 /        \
//!           H(l0‖l1)      H(l2‖l3)
//!           /    \         /    \
//!         l0     l1      l2    SENTINEL
//! ```
//!
//! - Leaf: `keccak256(recipient_id as u64 BE ‖ amount as u128 BE)`
//! - Inner node: `SHA3-256(left ‖ right)`
//! - Leaves are padded to a power of two (at least two) with the all-zero
//!   sentinel, so the same payouts always give the same root.
//!
//! Nodes are stored in array form with the root at index 0 and the children
//! of node `i` at `2i + 1` and `2i + 2`.

use super::payload::PayoutEntry;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use sha3::{Digest, Sha3_256};
use shared_crypto::keccak256;
use shared_types::{AccountId, Amount, Hash};

/// Padding leaf.
pub const SENTINEL_HASH: Hash = [0u8; 32];

/// Below this many leaves, hashing stays on the calling thread.
pub const PARALLEL_THRESHOLD: usize = 1024;

/// Side of the sibling relative to the node on the path.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SiblingPosition {
    /// Sibling is the left child.
    Left,
    /// Sibling is the right child.
    Right,
}

/// One step of an inclusion proof.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofNode {
    /// Sibling hash.
    pub hash: Hash,
    /// Sibling side.
    pub position: SiblingPosition,
}

/// Leaf hash of one payout.
pub fn leaf_hash(recipient: AccountId, amount: Amount) -> Hash {
    let mut preimage = [0u8; 24];
    preimage[..8].copy_from_slice(&recipient.0.to_be_bytes());
    preimage[8..].copy_from_slice(&amount.to_be_bytes());
    keccak256(&preimage)
}

/// Merkle tree of a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayoutTree {
    nodes: Vec<Hash>,
    leaf_count: usize,
    padded_leaf_count: usize,
    root: Hash,
}

impl PayoutTree {
    /// Build the tree over `entries` in order.
    pub fn build(entries: &[PayoutEntry]) -> Self {
        let leaf_count = entries.len();
        if leaf_count == 0 {
            return Self {
                nodes: vec![SENTINEL_HASH],
                leaf_count: 0,
                padded_leaf_count: 0,
                root: SENTINEL_HASH,
            };
        }

        let padded_leaf_count = leaf_count.next_power_of_two().max(2);
        let leaf_start = padded_leaf_count - 1;
        let mut nodes = vec![SENTINEL_HASH; 2 * padded_leaf_count - 1];

        let hash_entry = |e: &PayoutEntry| leaf_hash(e.recipient, e.amount);
        let leaves: Vec<Hash> = if leaf_count < PARALLEL_THRESHOLD {
            entries.iter().map(hash_entry).collect()
        } else {
            entries.par_iter().map(hash_entry).collect()
        };
        nodes[leaf_start..leaf_start + leaf_count].copy_from_slice(&leaves);

        for i in (0..leaf_start).rev() {
            nodes[i] = hash_pair(&nodes[2 * i + 1], &nodes[2 * i + 2]);
        }

        let root = nodes[0];
        Self {
            nodes,
            leaf_count,
            padded_leaf_count,
            root,
        }
    }

    /// Root hash.
    pub fn root(&self) -> Hash {
        self.root
    }

    /// Number of real leaves.
    pub fn leaf_count(&self) -> usize {
        self.leaf_count
    }

    /// Leaves after padding.
    pub fn padded_leaf_count(&self) -> usize {
        self.padded_leaf_count
    }

    /// Stored hash of a real leaf.
    pub fn leaf(&self, leaf_index: usize) -> Option<Hash> {
        if leaf_index >= self.leaf_count {
            return None;
        }
        self.nodes.get(self.padded_leaf_count - 1 + leaf_index).copied()
    }

    /// Sibling path from leaf `leaf_index` up to the root.
    pub fn proof(&self, leaf_index: usize) -> Option<Vec<ProofNode>> {
        if leaf_index >= self.leaf_count {
            return None;
        }
        let mut current = self.padded_leaf_count - 1 + leaf_index;
        let mut path = Vec::with_capacity(self.padded_leaf_count.trailing_zeros() as usize);

        while current > 0 {
            // Odd array slots are left children.
            let (sibling, position) = if current % 2 == 1 {
                (current + 1, SiblingPosition::Right)
            } else {
                (current - 1, SiblingPosition::Left)
            };
            path.push(ProofNode {
                hash: *self.nodes.get(sibling)?,
                position,
            });
            current = (current - 1) / 2;
        }
        Some(path)
    }

    /// Recompute the root from a leaf and its path.
    ///
    /// Sibling sides must agree with the bits of `leaf_index`, so a valid
    /// path for one leaf never verifies for another.
    pub fn verify(leaf: &Hash, leaf_index: u64, path: &[ProofNode], root: &Hash) -> bool {
        if path.is_empty() || path.len() > 64 {
            return false;
        }
        let mut index = leaf_index;
        let mut current = *leaf;

        for node in path {
            let expected = if index % 2 == 0 {
                SiblingPosition::Right
            } else {
                SiblingPosition::Left
            };
            if node.position != expected {
                return false;
            }
            current = match node.position {
                SiblingPosition::Left => hash_pair(&node.hash, &current),
                SiblingPosition::Right => hash_pair(&current, &node.hash),
            };
            index /= 2;
        }

        index == 0 && current == *root
    }
}

/// Parent hash: `SHA3-256(left ‖ right)`.
fn hash_pair(left: &Hash, right: &Hash) -> Hash {
    let mut hasher = Sha3_256::new();
    hasher.update(left);
    hasher.update(right);
    hasher.finalize().into()
}
