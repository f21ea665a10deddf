//! # Domain Errors

use dx_01_notary_registry::RegistryError;
use dx_02_escrow_accounting::EscrowError;
use dx_03_notarization::NotarizationError;
use dx_04_data_order::OrderError;
use shared_types::{Address, Amount, ErrorKind, OrderId, StoreError};
use thiserror::Error;

/// Errors returned by the exchange entry points.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExchangeError {
    /// Order state machine rejected the call.
    #[error(transparent)]
    Order(#[from] OrderError),

    /// Escrow or token movement failed.
    #[error(transparent)]
    Escrow(#[from] EscrowError),

    /// Notary registry rejected the call.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Consent signature did not verify.
    #[error(transparent)]
    Notarization(#[from] NotarizationError),

    /// Order lookup failed.
    #[error("Order store: {0}")]
    Store(#[from] StoreError),

    /// Mutations are suspended.
    #[error("Exchange is paused")]
    Paused,

    /// Caller is not the exchange owner.
    #[error("Unauthorized caller: {0:?}")]
    Unauthorized(Address),

    /// Notary attached to the order is no longer registered.
    #[error("Notary not registered: {0:?}")]
    NotaryNotRegistered(Address),

    /// Buyer can pay the price but not the fee on top of it.
    #[error("Audit budget of {order_id} exhausted: need {needed} more")]
    BudgetExhausted {
        /// Order id.
        order_id: OrderId,
        /// Fresh amount the response needed.
        needed: Amount,
    },

    /// New owner is zero or the current owner.
    #[error("Invalid owner: {0:?}")]
    InvalidOwner(Address),

    /// Pause or unpause requested in the state the exchange is already in.
    #[error("Pause flag already {0}")]
    PauseUnchanged(bool),

    /// Constructor arguments rejected.
    #[error("Invalid constructor arguments: {0}")]
    InvalidConstructorArgs(&'static str),
}

impl ExchangeError {
    /// Taxonomy class of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Order(e) => e.kind(),
            Self::Escrow(e) => e.kind(),
            Self::Registry(e) => e.kind(),
            Self::Notarization(e) => e.kind(),
            Self::Store(StoreError::NotFound) => ErrorKind::NotFound,
            Self::Store(StoreError::AlreadyExists) => ErrorKind::AlreadyExists,
            Self::Paused => ErrorKind::Paused,
            Self::Unauthorized(_) => ErrorKind::Unauthorized,
            Self::NotaryNotRegistered(_) => ErrorKind::NotRegistered,
            Self::BudgetExhausted { .. } => ErrorKind::BudgetExhausted,
            Self::InvalidOwner(_) => ErrorKind::InvalidAddress,
            Self::PauseUnchanged(_) => ErrorKind::InvalidState,
            Self::InvalidConstructorArgs(_) => ErrorKind::InvalidConstructorArgs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_kinds_pass_through() {
        let e: ExchangeError = OrderError::AlreadyClosed(OrderId(3)).into();
        assert_eq!(e.kind(), ErrorKind::AlreadyClosed);

        let e: ExchangeError = StoreError::NotFound.into();
        assert_eq!(e.kind(), ErrorKind::NotFound);

        let e: ExchangeError = RegistryError::NotRegistered(Address::ZERO).into();
        assert_eq!(e.kind(), ErrorKind::NotRegistered);
    }
}
