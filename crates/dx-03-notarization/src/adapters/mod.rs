//! # Adapters
//!
//! Signature scheme implementations.

pub mod secp256k1;

pub use secp256k1::{MessageSigner, Secp256k1Scheme};
