//! # Data-Exchange Test Suite
//!
//! Cross-crate scenarios. Each crate keeps its unit tests next to the code;
//! this crate wires the real services together.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── fixtures.rs          # Exchange and ledger builders, signers
//! └── integration/
//!     ├── order_flows.rs   # Order lifecycle and money scenarios
//!     ├── settlement.rs    # Batch ledger scenarios
//!     ├── concurrency.rs   # Parallel callers against shared services
//!     └── choreography.rs  # Event log and bus delivery
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p dx-tests
//! cargo test -p dx-tests integration::settlement::
//! ```

#![allow(dead_code)]

pub mod fixtures;
pub mod integration;
