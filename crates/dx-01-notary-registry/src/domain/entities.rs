//! # Notary Entities

use super::errors::RegistryError;
use serde::{Deserialize, Serialize};
use shared_types::{Address, Timestamp};

/// Profile details supplied on register / update.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotaryDetails {
    /// Display name.
    pub name: String,
    /// Public URL where the notary publishes its terms.
    pub public_url: String,
    /// Public key used for encrypted data exchange.
    pub public_key: String,
}

impl NotaryDetails {
    /// Build details from borrowed strings.
    pub fn new(name: &str, public_url: &str, public_key: &str) -> Self {
        Self {
            name: name.to_string(),
            public_url: public_url.to_string(),
            public_key: public_key.to_string(),
        }
    }

    /// Name and URL are identity-bearing and must be non-empty.
    pub fn validate(&self) -> Result<(), RegistryError> {
        if self.name.trim().is_empty() {
            return Err(RegistryError::EmptyField("name"));
        }
        if self.public_url.trim().is_empty() {
            return Err(RegistryError::EmptyField("public_url"));
        }
        Ok(())
    }
}

/// A notary's registry record.
///
/// Re-registering an unregistered address creates a fresh record; the old
/// one is kept in the address history.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotaryProfile {
    /// Notary address.
    pub address: Address,
    /// Current details.
    pub details: NotaryDetails,
    /// When this record was created.
    pub registered_at: Timestamp,
    /// Last modification (registration, update or unregistration).
    pub updated_at: Timestamp,
    /// False once unregistered.
    pub active: bool,
}

impl NotaryProfile {
    /// Fresh active record.
    pub fn new(address: Address, details: NotaryDetails, now: Timestamp) -> Self {
        Self {
            address,
            details,
            registered_at: now,
            updated_at: now,
            active: true,
        }
    }
}
