//! # Signature Errors
//!
//! Error types for signature recovery and verification.

use shared_types::{Address, ErrorKind};
use thiserror::Error;

/// Errors that can occur during signature recovery.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SignatureError {
    /// The signature format is invalid (wrong length, zero scalar).
    #[error("Invalid signature format")]
    InvalidFormat,

    /// Signature has high S value (EIP-2 malleability protection).
    #[error("Malleable signature (high S value)")]
    MalleableSignature,

    /// Invalid recovery ID (v must be 0, 1, 27, or 28).
    #[error("Invalid recovery ID: {0}")]
    InvalidRecoveryId(u8),

    /// Failed to recover public key from signature.
    #[error("Failed to recover public key")]
    RecoveryFailed,

    /// Recovered signer does not match expected signer.
    #[error("Signer mismatch: expected {expected:?}, got {actual:?}")]
    SignerMismatch {
        /// Signer the caller claimed.
        expected: Address,
        /// Signer the signature recovers to.
        actual: Address,
    },
}

impl SignatureError {
    /// Every signature failure is reported as `InvalidSignature`.
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::InvalidSignature
    }
}
