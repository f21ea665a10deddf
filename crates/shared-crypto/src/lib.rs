//! # Shared Crypto
//!
//! Cryptographic primitives consumed by the notarization protocol and the
//! batch payment ledger.
//!
//! ## Components
//!
//! | Module | Algorithm | Use Case |
//! |--------|-----------|----------|
//! | `hashing` | Keccak-256, SHA3-256 | Message digests, Merkle nodes |
//! | `ecdsa` | secp256k1 (recoverable) | Consent signatures, signer recovery |
//!
//! ## Security Properties
//!
//! - **secp256k1**: RFC 6979 deterministic nonces, low-S enforced (EIP-2)
//! - **Recovery**: Signer address is recovered, never supplied by the caller

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod ecdsa;
pub mod errors;
pub mod hashing;

// Re-exports
pub use ecdsa::{
    address_from_pubkey, eth_signed_message_hash, recover_address, verify_signer,
    RecoverableSignature, Secp256k1KeyPair,
};
pub use errors::SignatureError;
pub use hashing::{keccak256, sha3_256};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
