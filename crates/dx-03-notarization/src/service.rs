//! # Notarization Service
//!
//! Implements [`ConsentVerifier`] on top of any [`SignatureScheme`].

use crate::adapters::Secp256k1Scheme;
use crate::domain::{ConsentMessage, NotarizationError};
use crate::ports::{ConsentVerifier, SignatureScheme};
use shared_types::Address;
use tracing::{debug, warn};

/// Consent verification service.
pub struct NotarizationService<S: SignatureScheme = Secp256k1Scheme> {
    scheme: S,
}

impl<S: SignatureScheme> NotarizationService<S> {
    /// Create a service over `scheme`.
    pub fn new(scheme: S) -> Self {
        Self { scheme }
    }

    /// Recover the signer of `message` without comparing it to anyone.
    pub fn recover_signer(
        &self,
        message: &ConsentMessage,
        signature: &[u8],
    ) -> Result<Address, NotarizationError> {
        self.scheme
            .recover(&message.digest(), signature)
            .map_err(|source| NotarizationError::Unrecoverable {
                message: message.kind_name(),
                source,
            })
    }
}

impl Default for NotarizationService<Secp256k1Scheme> {
    fn default() -> Self {
        Self::new(Secp256k1Scheme)
    }
}

impl<S: SignatureScheme> ConsentVerifier for NotarizationService<S> {
    fn verify_consent(
        &self,
        message: &ConsentMessage,
        signature: &[u8],
        signer: Address,
    ) -> Result<(), NotarizationError> {
        let actual = self.recover_signer(message, signature).inspect_err(|e| {
            warn!(kind = message.kind_name(), signer = %signer, error = %e, "Unrecoverable consent signature");
        })?;

        if actual != signer {
            warn!(
                kind = message.kind_name(),
                expected = %signer,
                actual = %actual,
                "Consent signed by wrong party"
            );
            return Err(NotarizationError::WrongSigner {
                message: message.kind_name(),
                expected: signer,
                actual,
            });
        }

        debug!(kind = message.kind_name(), signer = %signer, "Consent verified");
        Ok(())
    }
}
