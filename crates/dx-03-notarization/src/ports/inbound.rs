//! # Inbound Ports
//!
//! API the exchange uses to authenticate consent.

use crate::domain::{ConsentMessage, NotarizationError};
use shared_types::Address;

/// Consent verification API - inbound port.
pub trait ConsentVerifier: Send + Sync {
    /// Succeeds only if `signature` over `message` recovers to `signer`.
    fn verify_consent(
        &self,
        message: &ConsentMessage,
        signature: &[u8],
        signer: Address,
    ) -> Result<(), NotarizationError>;
}
