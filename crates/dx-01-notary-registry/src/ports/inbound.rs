//! # Inbound Ports
//!
//! API traits defining what the notary registry can do. Reads and
//! mutations are split so that holders of a read handle cannot mutate.

use crate::domain::{NotaryDetails, NotaryProfile, RegistryError};
use shared_types::Address;

/// Read side of the notary registry.
///
/// A `&dyn NotaryDirectory` cannot reach the mutations:
///
/// ```compile_fail
/// use dx_01_notary_registry::{NotaryDetails, NotaryDirectory, NotaryRegistry};
/// use shared_bus::NullSink;
/// use shared_types::{Address, ManualTimeSource};
/// use std::sync::Arc;
///
/// let owner = Address([0x01; 20]);
/// let registry =
///     NotaryRegistry::new(owner, Arc::new(ManualTimeSource::new(0)), Arc::new(NullSink)).unwrap();
/// let directory: &dyn NotaryDirectory = &registry;
/// directory
///     .register(owner, Address([0xA1; 20]), NotaryDetails::new("n", "u", "k"))
///     .unwrap();
/// ```
pub trait NotaryDirectory: Send + Sync {
    /// Current owner.
    fn owner(&self) -> Address;

    /// Active profile of `notary`.
    fn get(&self, notary: &Address) -> Option<NotaryProfile>;

    /// True if `notary` has an active profile.
    fn is_registered(&self, notary: &Address) -> bool;

    /// Active notaries in registration order.
    fn list(&self) -> Vec<Address>;

    /// Every record ever created for `notary`, oldest first.
    fn history(&self, notary: &Address) -> Vec<NotaryProfile>;
}

/// Notary registry API - inbound port.
///
/// Mutations take the calling address and are restricted to the owner.
pub trait NotaryRegistryApi: NotaryDirectory {
    /// Register a notary, or re-register a previously unregistered one.
    fn register(
        &self,
        caller: Address,
        notary: Address,
        details: NotaryDetails,
    ) -> Result<NotaryProfile, RegistryError>;

    /// Replace the details of an active notary.
    fn update(
        &self,
        caller: Address,
        notary: Address,
        details: NotaryDetails,
    ) -> Result<NotaryProfile, RegistryError>;

    /// Deactivate a notary, returning the profile as it was before.
    fn unregister(&self, caller: Address, notary: Address) -> Result<NotaryProfile, RegistryError>;
}
