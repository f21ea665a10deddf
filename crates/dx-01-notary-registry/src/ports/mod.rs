//! # Ports
//!
//! Inbound API of the notary registry.

pub mod inbound;

pub use inbound::{NotaryDirectory, NotaryRegistryApi};
