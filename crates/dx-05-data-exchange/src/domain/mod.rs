//! # Domain Module
//!
//! Exchange errors, signed request types and order indices.

pub mod errors;
pub mod index;
pub mod requests;

pub use errors::*;
pub use index::*;
pub use requests::*;
