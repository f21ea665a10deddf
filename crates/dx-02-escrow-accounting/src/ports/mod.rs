//! # Ports
//!
//! The token capability consumed by escrow accounting.

pub mod outbound;

pub use outbound::TokenLedger;
