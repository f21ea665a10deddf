//! # Domain Errors

use shared_types::{Address, ErrorKind, OrderId};
use thiserror::Error;

/// Order state machine errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum OrderError {
    /// Buyer is the zero address.
    #[error("Invalid buyer address")]
    InvalidBuyer,

    /// Buyer URL or public key is empty.
    #[error("Empty order field: {0}")]
    EmptyField(&'static str),

    /// Initial audit budget below the exchange minimum.
    #[error("Audit budget {budget} below minimum {minimum}")]
    BudgetBelowMinimum {
        /// Offered budget.
        budget: u128,
        /// Required minimum.
        minimum: u128,
    },

    /// Caller is not allowed to perform the operation.
    #[error("Unauthorized caller {caller:?} on {order_id}")]
    Unauthorized {
        /// Order id.
        order_id: OrderId,
        /// Rejected caller.
        caller: Address,
    },

    /// Order is closed; only reads are allowed.
    #[error("{0} is not open")]
    NotOpen(OrderId),

    /// `close` on an order that is already closed.
    #[error("{0} already closed")]
    AlreadyClosed(OrderId),

    /// Responses percentage outside 0..=100.
    #[error("Responses percentage {0} out of range")]
    PercentageOutOfRange(u8),

    /// Notary already attached to the order.
    #[error("Notary {notary:?} already attached to {order_id}")]
    NotaryAlreadyAttached {
        /// Order id.
        order_id: OrderId,
        /// Notary.
        notary: Address,
    },

    /// Notary is not attached to the order.
    #[error("Notary {notary:?} not attached to {order_id}")]
    NotaryNotAttached {
        /// Order id.
        order_id: OrderId,
        /// Notary.
        notary: Address,
    },

    /// Seller is zero, the order address or the exchange address.
    #[error("Invalid seller {0:?}")]
    InvalidSeller(Address),

    /// Seller already responded to the order.
    #[error("Seller {seller:?} already responded to {order_id}")]
    ResponseExists {
        /// Order id.
        order_id: OrderId,
        /// Seller.
        seller: Address,
    },

    /// No response from the seller.
    #[error("No response from {seller:?} on {order_id}")]
    ResponseNotFound {
        /// Order id.
        order_id: OrderId,
        /// Seller.
        seller: Address,
    },

    /// Response was already closed.
    #[error("Response from {seller:?} on {order_id} already closed")]
    ResponseAlreadyClosed {
        /// Order id.
        order_id: OrderId,
        /// Seller.
        seller: Address,
    },

    /// Amount arithmetic overflowed.
    #[error("Amount overflow")]
    Overflow,
}

impl OrderError {
    /// Taxonomy class of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidBuyer | Self::EmptyField(_) | Self::InvalidSeller(_) => {
                ErrorKind::InvalidAddress
            }
            Self::BudgetBelowMinimum { .. } | Self::PercentageOutOfRange(_) => {
                ErrorKind::InvalidRange
            }
            Self::Unauthorized { .. } => ErrorKind::Unauthorized,
            Self::NotOpen(_) | Self::Overflow => ErrorKind::InvalidState,
            Self::AlreadyClosed(_) | Self::ResponseAlreadyClosed { .. } => ErrorKind::AlreadyClosed,
            Self::NotaryAlreadyAttached { .. } | Self::ResponseExists { .. } => {
                ErrorKind::AlreadyExists
            }
            Self::NotaryNotAttached { .. } | Self::ResponseNotFound { .. } => ErrorKind::NotFound,
        }
    }
}
