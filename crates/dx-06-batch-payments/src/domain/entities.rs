//! # Batch Ledger Entities

use super::merkle::{PayoutTree, ProofNode};
use super::payload::PayoutEntry;
use serde::{Deserialize, Serialize};
use shared_types::{AccountId, Address, Amount, BatchIndex, Hash, Timestamp};
use std::collections::BTreeMap;
use std::sync::Arc;

// =============================================================================
// ACCOUNTS
// =============================================================================

/// A batch-ledger account. Its balance lives in the escrow ledger under
/// `EscrowKey::BatchAccount(id)`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchAccount {
    /// Account id.
    pub id: AccountId,
    /// Controlling address. `None` for a bulk slot not yet assigned.
    pub owner: Option<Address>,
    /// Registrar of the bulk registration the account came from.
    pub registrar: Option<Address>,
    /// Bulk registration id, if any.
    pub registration: Option<u64>,
    /// Creation time.
    pub created_at: Timestamp,
    /// Bumped on every owner-initiated mutation.
    pub version: u64,
}

impl BatchAccount {
    /// Account opened by a deposit.
    pub fn owned(id: AccountId, owner: Address, now: Timestamp) -> Self {
        Self {
            id,
            owner: Some(owner),
            registrar: None,
            registration: None,
            created_at: now,
            version: 1,
        }
    }

    /// Unowned slot from a bulk registration.
    pub fn slot(id: AccountId, registrar: Address, registration: u64, now: Timestamp) -> Self {
        Self {
            id,
            owner: None,
            registrar: Some(registrar),
            registration: Some(registration),
            created_at: now,
            version: 0,
        }
    }

    /// True if `caller` controls the account.
    pub fn is_owned_by(&self, caller: Address) -> bool {
        self.owner == Some(caller)
    }
}

/// Account state together with its escrowed balance.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSnapshot {
    /// Account id.
    pub id: AccountId,
    /// Controlling address.
    pub owner: Option<Address>,
    /// Escrowed balance.
    pub balance: Amount,
    /// Mutation counter.
    pub version: u64,
}

/// A contiguous block of account ids reserved in one call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkRegistration {
    /// Registration id, sequential.
    pub id: u64,
    /// Caller that reserved the block.
    pub registrar: Address,
    /// First account id of the block.
    pub first_id: AccountId,
    /// Number of slots.
    pub count: u64,
    /// Reservation time.
    pub registered_at: Timestamp,
}

impl BulkRegistration {
    /// True if `account` falls inside the block.
    pub fn contains(&self, account: AccountId) -> bool {
        account.0 >= self.first_id.0 && account.0 - self.first_id.0 < self.count
    }
}

// =============================================================================
// BATCHES
// =============================================================================

/// Payout state of one leaf.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LeafStatus {
    /// Committed, not yet paid.
    Committed,
    /// Paid to the recipient.
    Withdrawn,
    /// Removed by an upheld challenge.
    Voided,
}

/// Outcome of a challenge.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChallengeOutcome {
    /// Awaiting the adjudicator.
    Pending,
    /// Leaf voided, challenger compensated.
    Upheld,
    /// Challenger's bond forfeited to the payer.
    Rejected,
}

/// A dispute over one leaf.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Challenge {
    /// Disputed batch.
    pub batch_index: BatchIndex,
    /// Disputed leaf.
    pub leaf_index: u64,
    /// Challenger address.
    pub challenger: Address,
    /// Opaque evidence.
    pub evidence: Vec<u8>,
    /// Bond posted by the challenger.
    pub bond: Amount,
    /// Current outcome.
    pub outcome: ChallengeOutcome,
    /// When the challenge was raised.
    pub raised_at: Timestamp,
    /// When the adjudicator decided.
    pub resolved_at: Option<Timestamp>,
}

impl Challenge {
    /// True until the adjudicator decides.
    pub fn is_pending(&self) -> bool {
        self.outcome == ChallengeOutcome::Pending
    }
}

/// A committed batch transfer.
#[derive(Clone, Debug)]
pub struct Batch {
    /// Batch index.
    pub index: BatchIndex,
    /// Paying account.
    pub payer_account: AccountId,
    /// Merkle root over the payouts.
    pub root: Hash,
    /// Commit time.
    pub committed_at: Timestamp,
    /// End of the challenge window.
    pub challenge_deadline: Timestamp,
    /// Set once the payer's bond was returned.
    pub finalized: bool,
    /// Sum of all payouts.
    pub total: Amount,
    /// Flat fee credited to the operator.
    pub fee: Amount,
    /// Opaque metadata tag.
    pub metadata: u64,
    /// Payer bond still held.
    pub bond: Amount,
    /// Paid to recipients so far.
    pub withdrawn_total: Amount,
    /// Returned to the payer by upheld challenges.
    pub voided_total: Amount,
    /// Decoded payouts in leaf order.
    pub entries: Arc<Vec<PayoutEntry>>,
    /// Tree over `entries`.
    pub tree: Arc<PayoutTree>,
    /// Per-leaf payout state.
    pub leaf_status: Vec<LeafStatus>,
    /// Challenges by leaf index.
    pub challenges: BTreeMap<u64, Challenge>,
}

impl Batch {
    /// Number of leaves.
    pub fn leaf_count(&self) -> u64 {
        self.entries.len() as u64
    }

    /// Payout of a leaf.
    pub fn entry(&self, leaf_index: u64) -> Option<&PayoutEntry> {
        usize::try_from(leaf_index)
            .ok()
            .and_then(|i| self.entries.get(i))
    }

    /// Payout state of a leaf.
    pub fn status(&self, leaf_index: u64) -> Option<LeafStatus> {
        usize::try_from(leaf_index)
            .ok()
            .and_then(|i| self.leaf_status.get(i).copied())
    }

    /// Mutable payout state of a leaf.
    pub fn status_mut(&mut self, leaf_index: u64) -> Option<&mut LeafStatus> {
        let i = usize::try_from(leaf_index).ok()?;
        self.leaf_status.get_mut(i)
    }

    /// True while challenges are accepted.
    pub fn in_challenge_window(&self, now: Timestamp) -> bool {
        now < self.challenge_deadline
    }

    /// Number of undecided challenges.
    pub fn pending_challenges(&self) -> usize {
        self.challenges.values().filter(|c| c.is_pending()).count()
    }

    /// Funds the escrow must still hold for the batch.
    pub fn outstanding(&self) -> Amount {
        self.total - self.withdrawn_total - self.voided_total + self.bond
    }

    /// Inclusion proof for a leaf.
    pub fn proof(&self, leaf_index: u64) -> Option<WithdrawalProof> {
        let entry = self.entry(leaf_index)?;
        let path = self.tree.proof(usize::try_from(leaf_index).ok()?)?;
        Some(WithdrawalProof {
            amount: entry.amount,
            path,
        })
    }
}

/// What a recipient presents to withdraw a leaf.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawalProof {
    /// Amount of the leaf.
    pub amount: Amount,
    /// Sibling path to the root.
    pub path: Vec<ProofNode>,
}
