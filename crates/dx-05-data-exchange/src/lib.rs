//! # DX-05 Data Exchange
//!
//! The order registry. Creates orders, routes every order transition through
//! the order's transaction, keeps the buyer / seller / notary indices and
//! owns the global settings.
//!
//! ## Entry Points
//!
//! | Operation | Caller | Signed by |
//! |-----------|--------|-----------|
//! | `create_order` | buyer | - |
//! | `add_notary` | buyer | notary |
//! | `add_data_response` | buyer | seller |
//! | `close_data_response` | buyer or notary | notary |
//! | `close_order` | buyer or owner | - |
//! | `register_notary` / `update_notary` / `unregister_notary` | owner | - |
//! | `set_minimum_audit_budget` / `transfer_ownership` | owner | - |
//! | `pause` / `unpause` | owner | - |
//!
//! Everything except `pause` / `unpause` fails with `Paused` while the
//! exchange is paused.
//!
//! ## Module Structure
//!
//! ```text
//! dx-05-data-exchange/
//! ├── domain/
//! │   ├── requests.rs  # AddNotaryRequest, DataResponseRequest, CloseResponseRequest
//! │   ├── index.rs     # OrderIndex
//! │   └── errors.rs    # ExchangeError
//! └── service.rs       # DataExchange
//! ```

#![warn(missing_docs)]

pub mod domain;
pub mod service;

pub use domain::{
    AddNotaryRequest, CloseResponseRequest, DataResponseRequest, ExchangeError, OrderIndex,
};
pub use service::{DataExchange, ExchangeDependencies};
