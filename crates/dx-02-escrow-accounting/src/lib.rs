//! # DX-02 Escrow Accounting
//!
//! Atomic fund movement primitive used by every state transition of the
//! exchange and the batch ledger.
//!
//! ## Operations
//!
//! | Operation | Token movement |
//! |-----------|----------------|
//! | `lock` | owner → vault (`transfer_from`, vault is the spender) |
//! | `release` / `settle` | vault → receivers (`transfer`) |
//! | `move_between` | none, escrow attribution only |
//! | `execute` | an `EscrowPlan` of reassignments and payouts, all or nothing |
//!
//! The ledger stays private to the service that owns it. Everyone else gets
//! an `EscrowView`, which only reads.
//!
//! ## Module Structure
//!
//! ```text
//! dx-02-escrow-accounting/
//! ├── domain/          # EscrowKey, Payout, EscrowError, TokenError
//! ├── ports/           # TokenLedger (token capability)
//! ├── adapters/        # InMemoryToken
//! └── service.rs       # EscrowLedger, EscrowView
//! ```

#![warn(missing_docs)]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

pub use adapters::InMemoryToken;
pub use domain::{EscrowError, EscrowKey, EscrowPlan, Payout, TokenError};
pub use ports::TokenLedger;
pub use service::{EscrowLedger, EscrowView};
