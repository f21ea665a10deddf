//! # Data Exchange Service
//!
//! Entry points of the order registry. Every order mutation runs as one
//! transaction on that order:
//!
//! ```text
//! admission ─► order.check/plan ─► registry + consent checks
//!            ─► escrow movement ─► order.apply ─► commit
//!                                                  │
//!                       indices + event + log ◄────┘
//! ```
//!
//! The escrow movement is the last fallible step, so a failed call leaves
//! both the order and the escrow exactly as they were.
//!
//! Admission holds a read lock on the admin state until the call returns,
//! so `pause` waits for in-flight mutations and none starts after it.

use crate::domain::{
    AddNotaryRequest, CloseResponseRequest, DataResponseRequest, ExchangeError, OrderIndex,
};
use dx_01_notary_registry::{
    NotaryDetails, NotaryDirectory, NotaryProfile, NotaryRegistry, NotaryRegistryApi,
};
use dx_02_escrow_accounting::{EscrowKey, EscrowLedger, EscrowView, Payout, TokenLedger};
use dx_03_notarization::ConsentVerifier;
use dx_04_data_order::{
    DataOrder, DataResponse, EscrowSummary, NotaryTerms, OrderParams, ResponseFunding,
};
use dx_telemetry::{log_order_event, ExchangeConfig};
use parking_lot::{Mutex, RwLock, RwLockReadGuard};
use shared_bus::{EventSink, ExchangeEvent};
use shared_types::{Address, AggregateStore, Amount, OrderId, TimeSource};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Collaborators injected into the exchange.
pub struct ExchangeDependencies {
    /// Address of the exchange. Escrowed tokens are held here.
    pub address: Address,
    /// Token capability.
    pub token: Arc<dyn TokenLedger>,
    /// Consent signature verification.
    pub verifier: Arc<dyn ConsentVerifier>,
    /// Event sink.
    pub events: Arc<dyn EventSink>,
    /// Clock.
    pub clock: Arc<dyn TimeSource>,
}

struct AdminState {
    owner: Address,
    paused: bool,
    minimum_audit_budget: Amount,
}

impl AdminState {
    fn ensure_running(&self) -> Result<(), ExchangeError> {
        if self.paused {
            warn!("Mutation rejected while paused");
            return Err(ExchangeError::Paused);
        }
        Ok(())
    }

    fn ensure_owner(&self, caller: Address) -> Result<(), ExchangeError> {
        if caller != self.owner {
            warn!(caller = %caller, "Owner-only call rejected");
            return Err(ExchangeError::Unauthorized(caller));
        }
        Ok(())
    }
}

/// The order registry.
pub struct DataExchange {
    address: Address,
    admin: RwLock<AdminState>,
    orders: AggregateStore<OrderId, DataOrder>,
    index: RwLock<OrderIndex>,
    next_order_id: Mutex<u64>,
    registry: NotaryRegistry,
    escrow: EscrowLedger,
    verifier: Arc<dyn ConsentVerifier>,
    events: Arc<dyn EventSink>,
    clock: Arc<dyn TimeSource>,
}

impl DataExchange {
    /// Create an exchange administered by `owner`.
    ///
    /// # Errors
    /// - `InvalidConstructorArgs` if the exchange address is zero, the owner
    ///   is zero or equal to the exchange address, or `config` is invalid
    pub fn new(
        deps: ExchangeDependencies,
        owner: Address,
        config: &ExchangeConfig,
    ) -> Result<Self, ExchangeError> {
        if deps.address.is_zero() {
            return Err(ExchangeError::InvalidConstructorArgs("zero exchange address"));
        }
        if owner.is_zero() || owner == deps.address {
            return Err(ExchangeError::InvalidConstructorArgs("invalid owner"));
        }
        config
            .validate()
            .map_err(|_| ExchangeError::InvalidConstructorArgs("invalid configuration"))?;

        let escrow = EscrowLedger::new(deps.address, deps.token)
            .map_err(|_| ExchangeError::InvalidConstructorArgs("invalid vault"))?;
        let registry = NotaryRegistry::new(owner, Arc::clone(&deps.clock), Arc::clone(&deps.events))
            .map_err(|_| ExchangeError::InvalidConstructorArgs("invalid owner"))?;

        info!(
            exchange = %deps.address,
            owner = %owner,
            minimum_audit_budget = config.minimum_audit_budget,
            "Data exchange created"
        );

        Ok(Self {
            address: deps.address,
            admin: RwLock::new(AdminState {
                owner,
                paused: false,
                minimum_audit_budget: config.minimum_audit_budget,
            }),
            orders: AggregateStore::new(),
            index: RwLock::new(OrderIndex::default()),
            next_order_id: Mutex::new(1),
            registry,
            escrow,
            verifier: deps.verifier,
            events: deps.events,
            clock: deps.clock,
        })
    }

    // =========================================================================
    // GUARDS
    // =========================================================================

    /// Admit a mutation. The returned guard must live until the mutation
    /// has committed; nothing under it may lock `admin` again.
    fn admit(&self) -> Result<RwLockReadGuard<'_, AdminState>, ExchangeError> {
        let admin = self.admin.read();
        admin.ensure_running()?;
        Ok(admin)
    }

    // =========================================================================
    // ORDERS
    // =========================================================================

    /// Create an order and escrow `price + initial_audit_budget` from the
    /// buyer.
    pub fn create_order(&self, buyer: Address, params: OrderParams) -> Result<OrderId, ExchangeError> {
        let admin = self.admit()?;
        let minimum = admin.minimum_audit_budget;
        DataOrder::validate_params(buyer, &params, minimum)?;

        // The id is only consumed once the funds are in escrow.
        let mut next_id = self.next_order_id.lock();
        let order_id = OrderId(*next_id);
        let order = DataOrder::open(order_id, self.address, buyer, params, minimum, self.clock.now())?;
        self.escrow.ensure_can_lock(buyer, order.creation_lock())?;
        self.escrow
            .lock(buyer, EscrowKey::Order(order_id), order.creation_lock())?;

        let price = order.price();
        let audit_budget = order.params().initial_audit_budget;
        self.orders.insert(order_id, order)?;
        *next_id += 1;
        drop(next_id);
        self.index.write().on_created(order_id, buyer);

        log_order_event!(info, "Order created", order_id, buyer = %buyer, price, audit_budget);
        self.events.emit(ExchangeEvent::OrderCreated {
            order_id,
            buyer,
            price,
            audit_budget,
        });
        Ok(order_id)
    }

    /// Attach a notary whose signed terms verify.
    pub fn add_notary(
        &self,
        caller: Address,
        order_id: OrderId,
        request: AddNotaryRequest,
    ) -> Result<(), ExchangeError> {
        let _admitted = self.admit()?;
        let notary = request.notary;
        let now = self.clock.now();

        self.orders.transaction(&order_id, |order| {
            order.check_add_notary(caller, notary, request.responses_percentage)?;
            if !self.registry.is_registered(&notary) {
                return Err(ExchangeError::NotaryNotRegistered(notary));
            }
            self.verifier
                .verify_consent(&request.consent(order_id), &request.signature, notary)?;

            order.attach_notary(
                notary,
                NotaryTerms {
                    responses_percentage: request.responses_percentage,
                    notarization_fee: request.notarization_fee,
                    terms_of_service_hash: request.terms_of_service_hash,
                    signature: request.signature.clone(),
                    attached_at: now,
                },
            );
            Ok::<_, ExchangeError>(())
        })?;

        self.index.write().on_notary_added(order_id, notary);
        log_order_event!(
            info,
            "Notary added",
            order_id,
            notary = %notary,
            percentage = request.responses_percentage,
            fee = request.notarization_fee
        );
        self.events.emit(ExchangeEvent::NotaryAdded {
            order_id,
            notary,
            responses_percentage: request.responses_percentage,
            notarization_fee: request.notarization_fee,
        });
        Ok(())
    }

    /// Admit a seller's response on the seller's behalf.
    pub fn add_data_response(
        &self,
        caller: Address,
        order_id: OrderId,
        request: DataResponseRequest,
    ) -> Result<(), ExchangeError> {
        let _admitted = self.admit()?;
        let DataResponseRequest {
            seller,
            notary,
            data_hash,
            signature,
        } = request.clone();
        let now = self.clock.now();

        let funding = self.orders.transaction(&order_id, |order| {
            let funding = order.plan_data_response(caller, seller, notary, self.address)?;
            if !self.registry.is_registered(&notary) {
                return Err(ExchangeError::NotaryNotRegistered(notary));
            }
            self.verifier
                .verify_consent(&request.consent(order_id), &signature, seller)?;

            self.pull_fresh_funds(order, &funding)?;
            order.record_data_response(seller, notary, data_hash, signature.clone(), funding, now);
            Ok::<_, ExchangeError>(funding)
        })?;

        self.index.write().on_response_added(order_id, seller);
        log_order_event!(
            info,
            "Data response added",
            order_id,
            seller = %seller,
            notary = %notary,
            fresh = funding.fresh_total()
        );
        self.events.emit(ExchangeEvent::DataAdded {
            order_id,
            seller,
            notary,
        });
        Ok(())
    }

    fn pull_fresh_funds(&self, order: &DataOrder, funding: &ResponseFunding) -> Result<(), ExchangeError> {
        let fresh = funding.fresh_total();
        if fresh == 0 {
            return Ok(());
        }
        let buyer = order.buyer();
        if let Err(e) = self.escrow.ensure_can_lock(buyer, fresh) {
            // Price alone is affordable, so the fee is what ran out.
            if funding.fresh_fee > 0 && self.escrow.ensure_can_lock(buyer, funding.fresh_price).is_ok() {
                warn!(order_id = %order.id(), needed = fresh, "Audit budget exhausted");
                return Err(ExchangeError::BudgetExhausted {
                    order_id: order.id(),
                    needed: fresh,
                });
            }
            return Err(e.into());
        }
        self.escrow.lock(buyer, EscrowKey::Order(order.id()), fresh)?;
        debug!(order_id = %order.id(), amount = fresh, "Fresh response funds locked");
        Ok(())
    }

    /// Settle a response with the notary's signed outcome.
    pub fn close_data_response(
        &self,
        caller: Address,
        order_id: OrderId,
        request: CloseResponseRequest,
    ) -> Result<(), ExchangeError> {
        let _admitted = self.admit()?;
        let CloseResponseRequest {
            seller,
            was_audited,
            is_data_valid,
            ..
        } = request;
        let now = self.clock.now();

        let settlement = self.orders.transaction(&order_id, |order| {
            let settlement = order.plan_close_response(caller, seller, was_audited, is_data_valid)?;
            self.verifier.verify_consent(
                &request.consent(order_id),
                &request.signature,
                settlement.notary,
            )?;

            self.escrow.settle(
                EscrowKey::Order(order_id),
                &[
                    Payout::new(settlement.seller, settlement.to_seller),
                    Payout::new(order.buyer(), settlement.to_buyer),
                    Payout::new(settlement.notary, settlement.to_notary),
                ],
            )?;
            order.apply_close_response(&settlement, was_audited, is_data_valid, now);
            Ok::<_, ExchangeError>(settlement)
        })?;

        log_order_event!(
            info,
            "Data response closed",
            order_id,
            seller = %seller,
            to_seller = settlement.to_seller,
            to_notary = settlement.to_notary,
            to_buyer = settlement.to_buyer
        );
        self.events.emit(ExchangeEvent::ResponseClosed {
            order_id,
            seller,
            was_audited,
            is_data_valid,
        });
        Ok(())
    }

    /// Close an order and refund its remaining escrow to the buyer.
    ///
    /// Returns the refund.
    pub fn close_order(&self, caller: Address, order_id: OrderId) -> Result<Amount, ExchangeError> {
        let admin = self.admit()?;
        let caller_is_owner = caller == admin.owner;
        let now = self.clock.now();

        let (refund, dangling) = self.orders.transaction(&order_id, |order| {
            let refund = order.plan_close(caller, caller_is_owner)?;
            self.escrow
                .release(EscrowKey::Order(order_id), order.buyer(), refund)?;
            order.apply_close(refund, now);
            Ok::<_, ExchangeError>((refund, order.dangling_responses().len()))
        })?;

        self.index.write().on_closed(order_id);
        if dangling > 0 {
            warn!(order_id = %order_id, dangling, "Order closed with unsettled responses");
        }
        log_order_event!(info, "Order closed", order_id, refund);
        self.events.emit(ExchangeEvent::OrderClosed { order_id, refund });
        Ok(refund)
    }

    // =========================================================================
    // NOTARIES
    // =========================================================================

    /// Register a notary. Owner only.
    pub fn register_notary(
        &self,
        caller: Address,
        notary: Address,
        details: NotaryDetails,
    ) -> Result<NotaryProfile, ExchangeError> {
        let _admitted = self.admit()?;
        Ok(self.registry.register(caller, notary, details)?)
    }

    /// Update an active notary. Owner only.
    pub fn update_notary(
        &self,
        caller: Address,
        notary: Address,
        details: NotaryDetails,
    ) -> Result<NotaryProfile, ExchangeError> {
        let _admitted = self.admit()?;
        Ok(self.registry.update(caller, notary, details)?)
    }

    /// Unregister a notary, returning its last profile. Owner only.
    pub fn unregister_notary(
        &self,
        caller: Address,
        notary: Address,
    ) -> Result<NotaryProfile, ExchangeError> {
        let _admitted = self.admit()?;
        Ok(self.registry.unregister(caller, notary)?)
    }

    /// Read-only view of the notary registry. Mutations go through the
    /// pause-checked entry points above.
    pub fn registry(&self) -> &dyn NotaryDirectory {
        &self.registry
    }

    // =========================================================================
    // ADMINISTRATION
    // =========================================================================

    /// Current owner.
    pub fn owner(&self) -> Address {
        self.admin.read().owner
    }

    /// Hand the exchange and its notary registry to `new_owner`.
    pub fn transfer_ownership(&self, caller: Address, new_owner: Address) -> Result<(), ExchangeError> {
        {
            let mut admin = self.admin.write();
            admin.ensure_running()?;
            admin.ensure_owner(caller)?;
            if new_owner.is_zero() || new_owner == caller || new_owner == self.address {
                return Err(ExchangeError::InvalidOwner(new_owner));
            }
            self.registry.transfer_ownership(caller, new_owner)?;
            admin.owner = new_owner;
        }

        info!(previous = %caller, new_owner = %new_owner, "Ownership transferred");
        self.events.emit(ExchangeEvent::OwnershipTransferred {
            previous: caller,
            new_owner,
        });
        Ok(())
    }

    /// Floor for the audit budget of orders created from now on.
    pub fn set_minimum_audit_budget(&self, caller: Address, value: Amount) -> Result<(), ExchangeError> {
        {
            let mut admin = self.admin.write();
            admin.ensure_running()?;
            admin.ensure_owner(caller)?;
            admin.minimum_audit_budget = value;
        }

        info!(value, "Minimum audit budget changed");
        self.events
            .emit(ExchangeEvent::MinimumAuditBudgetChanged { value });
        Ok(())
    }

    /// Current audit budget floor.
    pub fn minimum_audit_budget(&self) -> Amount {
        self.admin.read().minimum_audit_budget
    }

    /// Suspend all mutations except `unpause`.
    pub fn pause(&self, caller: Address) -> Result<(), ExchangeError> {
        self.set_paused(caller, true)
    }

    /// Resume mutations.
    pub fn unpause(&self, caller: Address) -> Result<(), ExchangeError> {
        self.set_paused(caller, false)
    }

    fn set_paused(&self, caller: Address, paused: bool) -> Result<(), ExchangeError> {
        {
            let mut admin = self.admin.write();
            admin.ensure_owner(caller)?;
            if admin.paused == paused {
                return Err(ExchangeError::PauseUnchanged(paused));
            }
            admin.paused = paused;
        }
        info!(paused, "Pause flag changed");
        self.events.emit(ExchangeEvent::PauseChanged { paused });
        Ok(())
    }

    /// True while mutations are suspended.
    pub fn is_paused(&self) -> bool {
        self.admin.read().paused
    }

    // =========================================================================
    // READS
    // =========================================================================

    /// Exchange address.
    pub fn address(&self) -> Address {
        self.address
    }

    /// Read-only view of the escrow holding order funds.
    pub fn escrow(&self) -> EscrowView<'_> {
        self.escrow.view()
    }

    /// Snapshot of an order.
    pub fn get_order(&self, order_id: OrderId) -> Option<DataOrder> {
        self.orders.get(&order_id)
    }

    /// Number of orders ever created.
    pub fn order_count(&self) -> usize {
        self.orders.len()
    }

    /// Orders created by `buyer`.
    pub fn orders_by_buyer(&self, buyer: &Address) -> Vec<OrderId> {
        self.index.read().by_buyer(buyer)
    }

    /// Orders `seller` responded to.
    pub fn orders_by_seller(&self, seller: &Address) -> Vec<OrderId> {
        self.index.read().by_seller(seller)
    }

    /// Orders `notary` is attached to.
    pub fn orders_by_notary(&self, notary: &Address) -> Vec<OrderId> {
        self.index.read().by_notary(notary)
    }

    /// Open orders in id order.
    pub fn open_orders(&self) -> Vec<OrderId> {
        self.index.read().open()
    }

    /// A seller's response to an order.
    pub fn get_data_response(&self, order_id: OrderId, seller: &Address) -> Option<DataResponse> {
        self.orders
            .get(&order_id)
            .and_then(|order| order.response(seller).cloned())
    }

    /// Notaries attached to an order, in attachment order.
    pub fn notaries_of(&self, order_id: OrderId) -> Vec<Address> {
        self.orders
            .get(&order_id)
            .map(|order| order.notaries().to_vec())
            .unwrap_or_default()
    }

    /// Terms of an attached notary.
    pub fn notary_terms(&self, order_id: OrderId, notary: &Address) -> Option<NotaryTerms> {
        self.orders
            .get(&order_id)
            .and_then(|order| order.notary_terms(notary).cloned())
    }

    /// Escrow snapshot of an order.
    pub fn escrow_summary(&self, order_id: OrderId) -> Option<EscrowSummary> {
        self.orders.get(&order_id).map(|order| order.escrow_summary())
    }

    /// Escrow balance the ledger attributes to an order.
    pub fn escrowed(&self, order_id: OrderId) -> Amount {
        self.escrow.balance(&EscrowKey::Order(order_id))
    }
}
