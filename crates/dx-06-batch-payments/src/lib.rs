//! # DX-06 Batch Payments
//!
//! Settlement rail for paying many sellers with one commitment.
//!
//! ## Flow
//!
//! ```text
//! deposit ──► bulk_register ──► assign_slot
//!                                   │
//! transfer(payload) ──► Batch{root, deadline} ──► challenge ──► resolve_challenge
//!                             │
//!                             └── after deadline ──► withdraw(proof) / finalize_batch
//! ```
//!
//! ## Entry Points
//!
//! | Operation | Caller | Effect |
//! |-----------|--------|--------|
//! | `deposit` | payer | lock tokens into a new or owned account |
//! | `bulk_register` | registrar | reserve sequential unowned slots |
//! | `assign_slot` | registrar | bind a slot's owner once |
//! | `transfer` | payer account owner | commit a batch, start the window |
//! | `challenge` | anyone with a bond | dispute one leaf before the deadline |
//! | `resolve_challenge` | adjudicator | uphold (void leaf) or reject |
//! | `withdraw` | recipient account owner | pay one leaf against its proof |
//! | `finalize_batch` | anyone | return the unused payer bond |
//! | `withdraw_balance` | account owner | take unused balance out |
//!
//! ## Payload
//!
//! `varint(count) || { varint(delta) || varint(amount) } × count`, LEB128,
//! recipients strictly ascending. See [`domain::payload`].
//!
//! ## Module Structure
//!
//! ```text
//! dx-06-batch-payments/
//! ├── domain/
//! │   ├── entities.rs  # BatchAccount, Batch, Challenge, BulkRegistration
//! │   ├── payload.rs   # Delta/LEB128 codec
//! │   ├── merkle.rs    # PayoutTree, proofs
//! │   └── errors.rs    # BatchError
//! └── service.rs       # BatchLedger
//! ```

#![warn(missing_docs)]

pub mod domain;
pub mod service;

pub use domain::payload::{decode as decode_payload, encode as encode_payload};
pub use domain::{
    leaf_hash, AccountSnapshot, Batch, BatchAccount, BatchError, BulkRegistration, Challenge,
    ChallengeOutcome, LeafStatus, PayloadError, PayoutEntry, PayoutTree, ProofNode,
    SiblingPosition, WithdrawalProof, SENTINEL_HASH,
};
pub use service::{BatchLedger, LedgerDependencies, LedgerRoles, OPERATOR_FEE_ACCOUNT};
