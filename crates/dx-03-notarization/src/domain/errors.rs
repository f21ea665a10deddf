//! # Domain Errors

use shared_crypto::SignatureError;
use shared_types::{Address, ErrorKind};
use thiserror::Error;

/// Consent verification failures. All map to `InvalidSignature`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NotarizationError {
    /// The signature bytes could not be recovered.
    #[error("Invalid {message} signature: {source}")]
    Unrecoverable {
        /// Message kind.
        message: &'static str,
        /// Underlying failure.
        #[source]
        source: SignatureError,
    },

    /// The signature recovers to someone other than the claimed signer.
    #[error("{message} signed by {actual:?}, expected {expected:?}")]
    WrongSigner {
        /// Message kind.
        message: &'static str,
        /// Claimed signer.
        expected: Address,
        /// Recovered signer.
        actual: Address,
    },
}

impl NotarizationError {
    /// Taxonomy class of this error.
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::InvalidSignature
    }
}
