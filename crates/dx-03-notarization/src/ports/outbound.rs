//! # Outbound Ports
//!
//! The recovery primitive. Swapping the implementation changes the curve
//! without touching the order state machine.

use shared_crypto::SignatureError;
use shared_types::{Address, Hash};

/// Recoverable signature scheme.
pub trait SignatureScheme: Send + Sync {
    /// Recover the address that signed `digest`.
    ///
    /// Implementations decide how the digest is framed before recovery.
    fn recover(&self, digest: &Hash, signature: &[u8]) -> Result<Address, SignatureError>;
}
