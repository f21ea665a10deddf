//! # Escrow Entities

use serde::{Deserialize, Serialize};
use shared_types::{AccountId, Address, Amount, BatchIndex, OrderId};
use std::fmt;

/// Owner of an escrow sub-account inside the vault.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EscrowKey {
    /// Funds backing one data order.
    Order(OrderId),
    /// Balance of a batch-ledger account.
    BatchAccount(AccountId),
    /// Payouts committed by a batch plus the payer's bond.
    Batch(BatchIndex),
    /// Bond posted by the challenger of one leaf.
    ChallengeBond(BatchIndex, u64),
}

impl fmt::Display for EscrowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Order(id) => write!(f, "escrow/{id}"),
            Self::BatchAccount(id) => write!(f, "escrow/{id}"),
            Self::Batch(index) => write!(f, "escrow/{index}"),
            Self::ChallengeBond(index, leaf) => write!(f, "escrow/{index}/challenge/{leaf}"),
        }
    }
}

/// One leg of a settlement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payout {
    /// Receiver.
    pub to: Address,
    /// Amount sent.
    pub amount: Amount,
}

impl Payout {
    /// Build a payout.
    pub fn new(to: Address, amount: Amount) -> Self {
        Self { to, amount }
    }
}

/// A set of escrow movements applied together by
/// [`EscrowLedger::execute`](crate::EscrowLedger::execute).
///
/// Reassignments run first, then payouts, so a payout may spend funds a
/// reassignment just moved in.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EscrowPlan {
    /// `(from, to, amount)` attribution changes.
    pub reassignments: Vec<(EscrowKey, EscrowKey, Amount)>,
    /// `(from, payout)` token transfers out of the vault.
    pub payouts: Vec<(EscrowKey, Payout)>,
}

impl EscrowPlan {
    /// Empty plan.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a reassignment. Zero amounts are skipped.
    pub fn reassign(mut self, from: EscrowKey, to: EscrowKey, amount: Amount) -> Self {
        if amount > 0 && from != to {
            self.reassignments.push((from, to, amount));
        }
        self
    }

    /// Add a payout. Zero amounts are skipped.
    pub fn pay(mut self, from: EscrowKey, to: Address, amount: Amount) -> Self {
        if amount > 0 {
            self.payouts.push((from, Payout::new(to, amount)));
        }
        self
    }

    /// True if the plan moves nothing.
    pub fn is_empty(&self) -> bool {
        self.reassignments.is_empty() && self.payouts.is_empty()
    }

    /// Tokens leaving the vault.
    pub fn payout_total(&self) -> Option<Amount> {
        self.payouts
            .iter()
            .try_fold(0u128, |acc, (_, p)| acc.checked_add(p.amount))
    }
}
