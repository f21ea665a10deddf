//! # DX-01 Notary Registry
//!
//! Address to notary profile mapping.
//!
//! ## Rules
//!
//! | Rule | Failure |
//! |------|---------|
//! | One active profile per address | `AlreadyRegistered` |
//! | Update / unregister need an active profile | `NotRegistered` |
//! | Zero address, empty name or URL | `InvalidAddress` |
//! | Mutations by the owner only | `Unauthorized` |
//!
//! Unregistering never deletes: the record is flagged inactive and kept in
//! the address history. Registering the address again starts a new record.
//!
//! ## Module Structure
//!
//! ```text
//! dx-01-notary-registry/
//! ├── domain/          # NotaryProfile, NotaryDetails, RegistryError
//! ├── ports/           # NotaryDirectory, NotaryRegistryApi
//! └── service.rs       # NotaryRegistry
//! ```

#![warn(missing_docs)]

pub mod domain;
pub mod ports;
pub mod service;

pub use domain::{NotaryDetails, NotaryProfile, RegistryError};
pub use ports::{NotaryDirectory, NotaryRegistryApi};
pub use service::NotaryRegistry;
