//! # Ports
//!
//! - Inbound: [`ConsentVerifier`], used by the exchange
//! - Outbound: [`SignatureScheme`], the pluggable recovery primitive

pub mod inbound;
pub mod outbound;

pub use inbound::ConsentVerifier;
pub use outbound::SignatureScheme;
