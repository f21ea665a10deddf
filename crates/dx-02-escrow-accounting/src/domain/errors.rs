//! # Domain Errors

use super::entities::EscrowKey;
use shared_types::{Address, Amount, ErrorKind};
use thiserror::Error;

/// Token capability failures.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TokenError {
    /// Owner's balance does not cover the transfer.
    #[error("Insufficient balance for {owner:?}: need {needed}, have {available}")]
    InsufficientBalance {
        /// Debited address.
        owner: Address,
        /// Requested amount.
        needed: Amount,
        /// Current balance.
        available: Amount,
    },

    /// Spender's allowance does not cover the transfer.
    #[error("Insufficient allowance from {owner:?} to {spender:?}: need {needed}, have {available}")]
    InsufficientAllowance {
        /// Token owner.
        owner: Address,
        /// Approved spender.
        spender: Address,
        /// Requested amount.
        needed: Amount,
        /// Current allowance.
        available: Amount,
    },

    /// Transfer to or from the zero address.
    #[error("Zero address")]
    ZeroAddress,

    /// Credit would overflow a balance.
    #[error("Balance overflow")]
    Overflow,
}

impl TokenError {
    /// Taxonomy class of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InsufficientBalance { .. } => ErrorKind::InsufficientFunds,
            Self::InsufficientAllowance { .. } => ErrorKind::InsufficientAllowance,
            Self::ZeroAddress => ErrorKind::InvalidAddress,
            Self::Overflow => ErrorKind::InvalidState,
        }
    }
}

/// Escrow accounting errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EscrowError {
    /// The token capability rejected a movement.
    #[error("Token transfer failed: {0}")]
    Token(#[from] TokenError),

    /// The escrow sub-account does not hold enough.
    #[error("Insufficient escrow in {key}: need {needed}, have {available}")]
    InsufficientEscrow {
        /// Escrow sub-account.
        key: EscrowKey,
        /// Requested amount.
        needed: Amount,
        /// Current escrow balance.
        available: Amount,
    },

    /// Vault constructed over the zero address.
    #[error("Invalid vault address")]
    InvalidVault,

    /// Amount arithmetic overflowed.
    #[error("Escrow arithmetic overflow")]
    Overflow,
}

impl EscrowError {
    /// Taxonomy class of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Token(e) => e.kind(),
            Self::InsufficientEscrow { .. } => ErrorKind::InsufficientBalance,
            Self::InvalidVault => ErrorKind::InvalidConstructorArgs,
            Self::Overflow => ErrorKind::InvalidState,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_error_kinds() {
        let e = TokenError::InsufficientBalance {
            owner: Address::ZERO,
            needed: 2,
            available: 1,
        };
        assert_eq!(e.kind(), ErrorKind::InsufficientFunds);
        assert_eq!(EscrowError::from(e).kind(), ErrorKind::InsufficientFunds);
    }

    #[test]
    fn test_escrow_error_kinds() {
        let e = EscrowError::InsufficientEscrow {
            key: EscrowKey::Order(shared_types::OrderId(1)),
            needed: 5,
            available: 0,
        };
        assert_eq!(e.kind(), ErrorKind::InsufficientBalance);
        assert!(e.to_string().contains("order#1"));
    }
}
