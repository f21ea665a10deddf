//! # Notary Registry Service
//!
//! In-memory implementation of [`NotaryRegistryApi`].
//!
//! Every record ever created is kept; only the last record of an address
//! can be active.

use crate::domain::{NotaryDetails, NotaryProfile, RegistryError};
use crate::ports::{NotaryDirectory, NotaryRegistryApi};
use parking_lot::RwLock;
use shared_bus::{EventSink, ExchangeEvent};
use shared_types::{Address, TimeSource};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

struct RegistryState {
    owner: Address,
    /// All records per address, oldest first.
    records: HashMap<Address, Vec<NotaryProfile>>,
    /// Active addresses in registration order.
    order: Vec<Address>,
}

impl RegistryState {
    fn active(&self, notary: &Address) -> Option<&NotaryProfile> {
        self.records
            .get(notary)
            .and_then(|r| r.last())
            .filter(|p| p.active)
    }

    fn active_mut(&mut self, notary: &Address) -> Option<&mut NotaryProfile> {
        self.records
            .get_mut(notary)
            .and_then(|r| r.last_mut())
            .filter(|p| p.active)
    }

    fn ensure_owner(&self, caller: Address) -> Result<(), RegistryError> {
        if caller != self.owner {
            warn!(caller = %caller, "Registry mutation by non-owner rejected");
            return Err(RegistryError::Unauthorized(caller));
        }
        Ok(())
    }
}

/// Notary registry service.
pub struct NotaryRegistry {
    state: RwLock<RegistryState>,
    clock: Arc<dyn TimeSource>,
    events: Arc<dyn EventSink>,
}

impl NotaryRegistry {
    /// Create an empty registry administered by `owner`.
    pub fn new(
        owner: Address,
        clock: Arc<dyn TimeSource>,
        events: Arc<dyn EventSink>,
    ) -> Result<Self, RegistryError> {
        if owner.is_zero() {
            return Err(RegistryError::ZeroAddress);
        }
        Ok(Self {
            state: RwLock::new(RegistryState {
                owner,
                records: HashMap::new(),
                order: Vec::new(),
            }),
            clock,
            events,
        })
    }

    /// Hand administration over to `new_owner`.
    pub fn transfer_ownership(
        &self,
        caller: Address,
        new_owner: Address,
    ) -> Result<(), RegistryError> {
        let mut state = self.state.write();
        state.ensure_owner(caller)?;
        if new_owner.is_zero() {
            return Err(RegistryError::ZeroAddress);
        }
        state.owner = new_owner;
        debug!(new_owner = %new_owner, "Registry ownership transferred");
        Ok(())
    }

    /// Number of active notaries.
    pub fn active_count(&self) -> usize {
        self.state.read().order.len()
    }
}

impl NotaryRegistryApi for NotaryRegistry {
    fn register(
        &self,
        caller: Address,
        notary: Address,
        details: NotaryDetails,
    ) -> Result<NotaryProfile, RegistryError> {
        if notary.is_zero() {
            return Err(RegistryError::ZeroAddress);
        }
        details.validate()?;

        let profile = {
            let mut state = self.state.write();
            state.ensure_owner(caller)?;
            if state.active(&notary).is_some() {
                return Err(RegistryError::AlreadyRegistered(notary));
            }

            let profile = NotaryProfile::new(notary, details, self.clock.now());
            state.records.entry(notary).or_default().push(profile.clone());
            state.order.push(notary);
            profile
        };

        info!(notary = %notary, name = %profile.details.name, "Notary registered");
        self.events.emit(ExchangeEvent::NotaryRegistered {
            notary,
            name: profile.details.name.clone(),
        });
        Ok(profile)
    }

    fn update(
        &self,
        caller: Address,
        notary: Address,
        details: NotaryDetails,
    ) -> Result<NotaryProfile, RegistryError> {
        details.validate()?;
        let now = self.clock.now();

        let profile = {
            let mut state = self.state.write();
            state.ensure_owner(caller)?;
            let profile = state
                .active_mut(&notary)
                .ok_or(RegistryError::NotRegistered(notary))?;
            profile.details = details;
            profile.updated_at = now;
            profile.clone()
        };

        info!(notary = %notary, "Notary updated");
        self.events.emit(ExchangeEvent::NotaryUpdated { notary });
        Ok(profile)
    }

    fn unregister(&self, caller: Address, notary: Address) -> Result<NotaryProfile, RegistryError> {
        let now = self.clock.now();

        let prior = {
            let mut state = self.state.write();
            state.ensure_owner(caller)?;
            let profile = state
                .active_mut(&notary)
                .ok_or(RegistryError::NotRegistered(notary))?;
            let prior = profile.clone();
            profile.active = false;
            profile.updated_at = now;
            state.order.retain(|a| *a != notary);
            prior
        };

        info!(notary = %notary, "Notary unregistered");
        self.events.emit(ExchangeEvent::NotaryUnregistered { notary });
        Ok(prior)
    }
}

impl NotaryDirectory for NotaryRegistry {
    fn owner(&self) -> Address {
        self.state.read().owner
    }

    fn get(&self, notary: &Address) -> Option<NotaryProfile> {
        self.state.read().active(notary).cloned()
    }

    fn is_registered(&self, notary: &Address) -> bool {
        self.state.read().active(notary).is_some()
    }

    fn list(&self) -> Vec<Address> {
        self.state.read().order.clone()
    }

    fn history(&self, notary: &Address) -> Vec<NotaryProfile> {
        self.state
            .read()
            .records
            .get(notary)
            .cloned()
            .unwrap_or_default()
    }
}

