//! # Error Taxonomy
//!
//! Every subsystem error enum maps onto one [`ErrorKind`]. A rejected call
//! always carries a specific kind; there are no silent no-ops.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Failure classes shared by all entry points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Zero address, or an identity-bearing field is empty.
    InvalidAddress,
    /// Caller is not allowed to perform the operation.
    Unauthorized,
    /// Entity already exists.
    AlreadyExists,
    /// Notary address is already actively registered.
    AlreadyRegistered,
    /// Order or response is already closed.
    AlreadyClosed,
    /// Entity does not exist.
    NotFound,
    /// Notary address is not (or no longer) registered.
    NotRegistered,
    /// Operation is not valid in the aggregate's current phase.
    InvalidState,
    /// Owner's token balance does not cover the transfer.
    InsufficientFunds,
    /// Ledger account or escrow balance does not cover the debit.
    InsufficientBalance,
    /// Spender allowance does not cover the transfer.
    InsufficientAllowance,
    /// Signature does not recover to the expected signer.
    InvalidSignature,
    /// Numeric argument out of its allowed range.
    InvalidRange,
    /// Batch payload could not be decoded.
    MalformedPayload,
    /// Merkle proof does not verify against the committed root.
    InvalidProof,
    /// Challenge window still open for the leaf.
    NotYetWithdrawable,
    /// Leaf already withdrawn.
    AlreadyWithdrawn,
    /// Mutating entry points are suspended.
    Paused,
    /// Neither the remaining audit budget nor a fresh payment covers the fee.
    BudgetExhausted,
    /// Construction arguments are invalid.
    InvalidConstructorArgs,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}
