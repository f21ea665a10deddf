//! # Domain Errors

use super::payload::PayloadError;
use dx_02_escrow_accounting::EscrowError;
use shared_types::{AccountId, Address, Amount, BatchIndex, ErrorKind, StoreError, Timestamp};
use thiserror::Error;

/// Batch ledger errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BatchError {
    /// Escrow or token movement failed.
    #[error(transparent)]
    Escrow(#[from] EscrowError),

    /// Account or batch lookup failed.
    #[error("Ledger store: {0}")]
    Store(#[from] StoreError),

    /// Payload could not be decoded.
    #[error("Malformed payload: {0}")]
    Payload(#[from] PayloadError),

    /// Payload names an account that does not exist.
    #[error("Unknown recipient {0}")]
    UnknownRecipient(AccountId),

    /// Zero address supplied.
    #[error("Zero address")]
    ZeroAddress,

    /// Zero deposit, withdrawal or registration size.
    #[error("Zero amount")]
    ZeroAmount,

    /// Caller does not control the account or lacks the role.
    #[error("Unauthorized caller: {0:?}")]
    Unauthorized(Address),

    /// Account does not exist.
    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    /// Payer account cannot cover the batch.
    #[error("{account} holds {available}, needs {needed}")]
    InsufficientBalance {
        /// Payer account.
        account: AccountId,
        /// Required amount.
        needed: Amount,
        /// Escrowed balance.
        available: Amount,
    },

    /// Bulk registration did not start at the next free id.
    #[error("Registration offset {actual} does not match next free id {expected}")]
    OffsetMismatch {
        /// Next free id.
        expected: AccountId,
        /// Offset supplied.
        actual: AccountId,
    },

    /// Bulk registration larger than the ledger allows.
    #[error("Registration of {count} slots exceeds limit {max}")]
    RegistrationTooLarge {
        /// Requested slots.
        count: u64,
        /// Limit.
        max: u64,
    },

    /// Account is not a bulk slot.
    #[error("{0} is not a bulk slot")]
    NotASlot(AccountId),

    /// Slot already has an owner.
    #[error("{0} already assigned")]
    SlotAlreadyAssigned(AccountId),

    /// Expected batch index is not the next one.
    #[error("Expected {actual}, next batch is {expected}")]
    BatchIndexMismatch {
        /// Next batch index.
        expected: BatchIndex,
        /// Index supplied.
        actual: BatchIndex,
    },

    /// Leaf index out of range.
    #[error("{batch_index} has no leaf {leaf_index}")]
    LeafNotFound {
        /// Batch.
        batch_index: BatchIndex,
        /// Leaf.
        leaf_index: u64,
    },

    /// Challenge window has closed.
    #[error("Challenge window of {batch_index} closed at {deadline}")]
    ChallengeWindowClosed {
        /// Batch.
        batch_index: BatchIndex,
        /// Deadline.
        deadline: Timestamp,
    },

    /// Leaf was already challenged.
    #[error("Leaf {leaf_index} of {batch_index} already challenged")]
    ChallengeExists {
        /// Batch.
        batch_index: BatchIndex,
        /// Leaf.
        leaf_index: u64,
    },

    /// No challenge on the leaf.
    #[error("No challenge on leaf {leaf_index} of {batch_index}")]
    ChallengeNotFound {
        /// Batch.
        batch_index: BatchIndex,
        /// Leaf.
        leaf_index: u64,
    },

    /// Challenge was already decided.
    #[error("Challenge on leaf {leaf_index} of {batch_index} already resolved")]
    ChallengeAlreadyResolved {
        /// Batch.
        batch_index: BatchIndex,
        /// Leaf.
        leaf_index: u64,
    },

    /// Challenge window still open.
    #[error("{batch_index} withdrawable from {deadline}")]
    NotYetWithdrawable {
        /// Batch.
        batch_index: BatchIndex,
        /// Deadline.
        deadline: Timestamp,
    },

    /// Leaf has an undecided challenge.
    #[error("Leaf {leaf_index} of {batch_index} has a pending challenge")]
    ChallengePending {
        /// Batch.
        batch_index: BatchIndex,
        /// Leaf.
        leaf_index: u64,
    },

    /// Leaf was voided by an upheld challenge.
    #[error("Leaf {leaf_index} of {batch_index} was voided")]
    LeafVoided {
        /// Batch.
        batch_index: BatchIndex,
        /// Leaf.
        leaf_index: u64,
    },

    /// Leaf was already paid.
    #[error("Leaf {leaf_index} of {batch_index} already withdrawn")]
    AlreadyWithdrawn {
        /// Batch.
        batch_index: BatchIndex,
        /// Leaf.
        leaf_index: u64,
    },

    /// Proof does not lead to the batch root.
    #[error("Invalid proof for leaf {leaf_index} of {batch_index}")]
    InvalidProof {
        /// Batch.
        batch_index: BatchIndex,
        /// Leaf.
        leaf_index: u64,
    },

    /// Batch cannot be finalized yet.
    #[error("{batch_index} not finalizable: {reason}")]
    NotFinalizable {
        /// Batch.
        batch_index: BatchIndex,
        /// Reason.
        reason: &'static str,
    },

    /// Batch was already finalized.
    #[error("{0} already finalized")]
    AlreadyFinalized(BatchIndex),

    /// Constructor arguments rejected.
    #[error("Invalid constructor arguments: {0}")]
    InvalidConstructorArgs(&'static str),

    /// Amount arithmetic overflowed.
    #[error("Amount overflow")]
    Overflow,
}

impl BatchError {
    /// Taxonomy class of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Escrow(e) => e.kind(),
            Self::Store(StoreError::NotFound) => ErrorKind::NotFound,
            Self::Store(StoreError::AlreadyExists) => ErrorKind::AlreadyExists,
            Self::Payload(_) | Self::UnknownRecipient(_) => ErrorKind::MalformedPayload,
            Self::ZeroAddress => ErrorKind::InvalidAddress,
            Self::Unauthorized(_) => ErrorKind::Unauthorized,
            Self::AccountNotFound(_)
            | Self::LeafNotFound { .. }
            | Self::ChallengeNotFound { .. } => ErrorKind::NotFound,
            Self::InsufficientBalance { .. } => ErrorKind::InsufficientBalance,
            Self::RegistrationTooLarge { .. } => ErrorKind::InvalidRange,
            Self::ZeroAmount
            | Self::OffsetMismatch { .. }
            | Self::NotASlot(_)
            | Self::BatchIndexMismatch { .. }
            | Self::ChallengeWindowClosed { .. }
            | Self::ChallengeAlreadyResolved { .. }
            | Self::LeafVoided { .. }
            | Self::NotFinalizable { .. }
            | Self::Overflow => ErrorKind::InvalidState,
            Self::SlotAlreadyAssigned(_) | Self::ChallengeExists { .. } => ErrorKind::AlreadyExists,
            Self::NotYetWithdrawable { .. } | Self::ChallengePending { .. } => {
                ErrorKind::NotYetWithdrawable
            }
            Self::AlreadyWithdrawn { .. } => ErrorKind::AlreadyWithdrawn,
            Self::InvalidProof { .. } => ErrorKind::InvalidProof,
            Self::AlreadyFinalized(_) => ErrorKind::AlreadyClosed,
            Self::InvalidConstructorArgs(_) => ErrorKind::InvalidConstructorArgs,
        }
    }
}
