//! # Adapters
//!
//! In-process implementations of the outbound ports.

pub mod memory_token;

pub use memory_token::InMemoryToken;
