//! # Domain Errors

use shared_types::{Address, ErrorKind};
use thiserror::Error;

/// Notary registry error types.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// Zero address supplied.
    #[error("Zero address")]
    ZeroAddress,

    /// A required profile field is empty.
    #[error("Empty field: {0}")]
    EmptyField(&'static str),

    /// Caller is not the registry owner.
    #[error("Unauthorized caller: {0:?}")]
    Unauthorized(Address),

    /// Address already has an active profile.
    #[error("Notary already registered: {0:?}")]
    AlreadyRegistered(Address),

    /// Address has no active profile.
    #[error("Notary not registered: {0:?}")]
    NotRegistered(Address),
}

impl RegistryError {
    /// Taxonomy class of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ZeroAddress | Self::EmptyField(_) => ErrorKind::InvalidAddress,
            Self::Unauthorized(_) => ErrorKind::Unauthorized,
            Self::AlreadyRegistered(_) => ErrorKind::AlreadyRegistered,
            Self::NotRegistered(_) => ErrorKind::NotRegistered,
        }
    }
}
