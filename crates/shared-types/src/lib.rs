//! # Shared Types Crate
//!
//! Types shared by every Data-Exchange subsystem.
//!
//! ## Design Principles
//!
//! - **Opaque Identity**: Actors are identified by an [`Address`]; nothing in
//!   this crate assumes how an address was derived.
//! - **One Taxonomy**: Every subsystem error reports an [`ErrorKind`] so
//!   callers can match on the failure class instead of a message string.
//! - **Aggregate Atomicity**: [`AggregateStore`] gives every order, account
//!   and batch its own exclusive transaction boundary.

pub mod entities;
pub mod errors;
pub mod store;
pub mod time;

pub use entities::*;
pub use errors::*;
pub use store::{AggregateStore, StoreError};
pub use time::{ManualTimeSource, SystemTimeSource, TimeSource};
