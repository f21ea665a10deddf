//! # Domain Module
//!
//! Consent messages and their canonical encoding.

pub mod errors;
pub mod messages;

pub use errors::*;
pub use messages::*;
