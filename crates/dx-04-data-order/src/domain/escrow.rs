//! # Order Escrow Bookkeeping
//!
//! Tracks how the funds escrowed for one order are split. The split always
//! accounts for every locked token:
//!
//! ```text
//! locked − paid_out − refunded
//!     == prepaid_price + remaining_budget + committed
//! ```
//!
//! - `prepaid_price`: the price escrowed at creation, reserved for the first
//!   admitted response
//! - `remaining_budget`: what is left of the audit budget
//! - `committed`: price and fee reserved for responses not yet closed

use serde::{Deserialize, Serialize};
use shared_types::Amount;

/// Escrow split of one order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderEscrow {
    /// Everything ever pulled from the buyer.
    pub locked: Amount,
    /// Sent to sellers and notaries.
    pub paid_out: Amount,
    /// Returned to the buyer.
    pub refunded: Amount,
    /// Creation-time price not yet used by a response.
    pub prepaid_price: Amount,
    /// Unspent audit budget.
    pub remaining_budget: Amount,
    /// Reserved for responses still open.
    pub committed: Amount,
}

impl OrderEscrow {
    /// Split right after creation.
    pub fn at_creation(price: Amount, audit_budget: Amount) -> Self {
        Self {
            locked: price + audit_budget,
            prepaid_price: price,
            remaining_budget: audit_budget,
            ..Self::default()
        }
    }

    /// Tokens still held for the order.
    pub fn balance(&self) -> Amount {
        self.locked
            .saturating_sub(self.paid_out)
            .saturating_sub(self.refunded)
    }

    /// True if the split accounts for the balance exactly.
    pub fn is_balanced(&self) -> bool {
        self.paid_out + self.refunded <= self.locked
            && self.balance() == self.prepaid_price + self.remaining_budget + self.committed
    }

    /// Read-only summary.
    pub fn summary(&self) -> EscrowSummary {
        EscrowSummary {
            total_locked: self.locked,
            paid_out: self.paid_out,
            refunded: self.refunded,
            committed: self.committed,
            prepaid_price: self.prepaid_price,
            remaining_budget: self.remaining_budget,
            escrow_balance: self.balance(),
        }
    }
}

/// Snapshot of an order's escrow.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscrowSummary {
    /// Everything ever pulled from the buyer.
    pub total_locked: Amount,
    /// Sent to sellers and notaries.
    pub paid_out: Amount,
    /// Returned to the buyer.
    pub refunded: Amount,
    /// Reserved for open responses.
    pub committed: Amount,
    /// Unused creation-time price.
    pub prepaid_price: Amount,
    /// Unspent audit budget.
    pub remaining_budget: Amount,
    /// `total_locked − paid_out − refunded`.
    pub escrow_balance: Amount,
}
