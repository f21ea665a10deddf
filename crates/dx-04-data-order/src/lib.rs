//! # DX-04 Data Order
//!
//! The per-order aggregate: buyer parameters, attached notaries, seller
//! responses and the order's escrow split.
//!
//! ## Lifecycle
//!
//! ```text
//!            add_notary / add_data_response / close_data_response
//!                         ┌──────────────┐
//!                         ▼              │
//!   open() ──────────► [Open] ───────────┘
//!                         │
//!                       close()  (buyer or exchange owner)
//!                         ▼
//!                     [Closed]   reads only, balance refunded
//! ```
//!
//! The aggregate never moves tokens itself. Each transition is planned
//! against the current state, the exchange moves the escrowed tokens, then
//! the plan is applied.
//!
//! ## Module Structure
//!
//! ```text
//! dx-04-data-order/
//! └── domain/
//!     ├── entities.rs    # OrderParams, NotaryTerms, DataResponse
//!     ├── escrow.rs      # OrderEscrow, EscrowSummary
//!     ├── order.rs       # DataOrder state machine
//!     ├── invariants.rs  # invariant_* checks
//!     └── errors.rs      # OrderError
//! ```

#![warn(missing_docs)]

pub mod domain;

pub use domain::{
    derive_order_address, invariant_closed_order_drained, invariant_commitments_match,
    invariant_escrow_balanced, invariant_percentage_in_range, invariant_responses_have_notary,
    DataOrder, DataResponse, EscrowSummary, NotaryTerms, OrderError, OrderEscrow, OrderParams,
    OrderStatus, ResponseFunding, ResponseSettlement, ResponseStatus, MAX_RESPONSES_PERCENTAGE,
};
