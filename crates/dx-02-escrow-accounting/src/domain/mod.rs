//! # Domain Module
//!
//! Escrow keys, payouts and accounting errors.

pub mod entities;
pub mod errors;

pub use entities::*;
pub use errors::*;
