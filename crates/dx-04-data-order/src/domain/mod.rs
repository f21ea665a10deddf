//! # Domain Module
//!
//! The DataOrder aggregate and its value objects.

pub mod entities;
pub mod errors;
pub mod escrow;
pub mod invariants;
pub mod order;

pub use entities::*;
pub use errors::*;
pub use escrow::*;
pub use invariants::*;
pub use order::*;
