//! # Core Domain Entities
//!
//! Identifiers and scalar types used across the exchange.
//!
//! ## Clusters
//!
//! - **Identity**: [`Address`]
//! - **Orders**: [`OrderId`]
//! - **Batch Ledger**: [`AccountId`], [`BatchIndex`]

use serde::{Deserialize, Serialize};
use std::fmt;

/// A 32-byte hash (Keccak-256 or SHA3-256 depending on context).
pub type Hash = [u8; 32];

/// Token amount in the smallest unit (9 decimals in the reference token).
pub type Amount = u128;

/// Unix timestamp in seconds.
pub type Timestamp = u64;

// =============================================================================
// IDENTITY
// =============================================================================

/// A 20-byte actor identifier.
///
/// Derived from the signer's public key for signature-bearing actors, but the
/// core logic treats it as opaque.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Address(pub [u8; 20]);

impl Address {
    /// The zero address (0x0000...0000).
    pub const ZERO: Self = Self([0u8; 20]);

    /// Creates an address from a 20-byte array.
    #[must_use]
    pub const fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Creates an address from a slice. Returns None if wrong length.
    #[must_use]
    pub fn from_slice(slice: &[u8]) -> Option<Self> {
        let bytes: [u8; 20] = slice.try_into().ok()?;
        Some(Self(bytes))
    }

    /// Returns the underlying bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Returns true if this is the zero address.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }
}

impl From<[u8; 20]> for Address {
    fn from(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Short form keeps log lines readable.
        write!(f, "0x{}..{}", hex::encode(&self.0[..3]), hex::encode(&self.0[18..]))
    }
}

// =============================================================================
// AGGREGATE IDENTIFIERS
// =============================================================================

/// Identifier of a Data Order, assigned sequentially by the exchange.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OrderId(pub u64);

/// Identifier of a batch-ledger account.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AccountId(pub u64);

/// Sequential index of a committed payment batch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BatchIndex(pub u64);

macro_rules! display_id {
    ($($ty:ident => $prefix:literal),* $(,)?) => {
        $(
            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    write!(f, concat!($prefix, "#{}"), self.0)
                }
            }
        )*
    };
}

display_id!(OrderId => "order", AccountId => "account", BatchIndex => "batch");
