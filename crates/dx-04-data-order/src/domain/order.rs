//! # DataOrder Aggregate
//!
//! Per-order state machine. Every transition is split in two:
//!
//! - `check_*` / `plan_*` validate against the current state and compute the
//!   token movements the transition needs, without mutating anything
//! - `attach_*` / `record_*` / `apply_*` commit the transition and cannot fail
//!
//! The exchange runs external checks (registry, signatures) and the escrow
//! movement between the two halves, inside the order's transaction.
//!
//! ## Money Model
//!
//! ```text
//! create        : lock price + audit budget
//! add response  : price ← prepaid price (first response) | fresh pull
//!                 fee   ← remaining budget (if it covers) | fresh pull
//! close response: valid → price to seller, invalid → price to buyer
//!                 audited → fee to notary, not audited → fee back to budget
//! close order   : whole remaining balance back to buyer
//! ```

use super::entities::{
    derive_order_address, DataResponse, NotaryTerms, OrderParams, OrderStatus, ResponseStatus,
};
use super::errors::OrderError;
use super::escrow::{EscrowSummary, OrderEscrow};
use super::invariants::invariant_percentage_in_range;
use shared_types::{Address, Amount, Hash, OrderId, Timestamp};
use std::collections::HashMap;

/// How a new response is funded.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ResponseFunding {
    /// Price taken from the creation-time prepaid price.
    pub price_from_prepaid: Amount,
    /// Price pulled fresh from the buyer.
    pub fresh_price: Amount,
    /// Fee taken from the remaining audit budget.
    pub fee_from_budget: Amount,
    /// Fee pulled fresh from the buyer.
    pub fresh_fee: Amount,
}

impl ResponseFunding {
    /// Amount that must be pulled from the buyer.
    pub fn fresh_total(&self) -> Amount {
        self.fresh_price + self.fresh_fee
    }

    /// Price plus fee reserved for the response.
    pub fn committed(&self) -> Amount {
        self.price_from_prepaid + self.fresh_price + self.fee_from_budget + self.fresh_fee
    }
}

/// Payouts of a response close.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResponseSettlement {
    /// Seller of the response.
    pub seller: Address,
    /// Notary of the response.
    pub notary: Address,
    /// Price paid to the seller (valid data).
    pub to_seller: Amount,
    /// Price refunded to the buyer (invalid data).
    pub to_buyer: Amount,
    /// Fee paid to the notary (audited).
    pub to_notary: Amount,
    /// Fee returned to the audit budget (not audited).
    pub fee_to_budget: Amount,
}

/// The DataOrder aggregate.
#[derive(Clone, Debug)]
pub struct DataOrder {
    id: OrderId,
    address: Address,
    buyer: Address,
    params: OrderParams,
    created_at: Timestamp,
    closed_at: Option<Timestamp>,
    status: OrderStatus,
    notary_terms: HashMap<Address, NotaryTerms>,
    notary_order: Vec<Address>,
    responses: HashMap<Address, DataResponse>,
    seller_order: Vec<Address>,
    escrow: OrderEscrow,
}

impl DataOrder {
    // =========================================================================
    // CREATION
    // =========================================================================

    /// Validate parameters and build an open order.
    ///
    /// The caller must lock [`DataOrder::creation_lock`] from the buyer
    /// before publishing the order.
    pub fn open(
        id: OrderId,
        exchange: Address,
        buyer: Address,
        params: OrderParams,
        minimum_audit_budget: Amount,
        now: Timestamp,
    ) -> Result<Self, OrderError> {
        Self::validate_params(buyer, &params, minimum_audit_budget)?;
        let escrow = OrderEscrow::at_creation(params.price, params.initial_audit_budget);

        Ok(Self {
            id,
            address: derive_order_address(exchange, id),
            buyer,
            params,
            created_at: now,
            closed_at: None,
            status: OrderStatus::Open,
            notary_terms: HashMap::new(),
            notary_order: Vec::new(),
            responses: HashMap::new(),
            seller_order: Vec::new(),
            escrow,
        })
    }

    /// Parameter checks applied by [`DataOrder::open`].
    pub fn validate_params(
        buyer: Address,
        params: &OrderParams,
        minimum_audit_budget: Amount,
    ) -> Result<(), OrderError> {
        if buyer.is_zero() {
            return Err(OrderError::InvalidBuyer);
        }
        if params.buyer_url.trim().is_empty() {
            return Err(OrderError::EmptyField("buyer_url"));
        }
        if params.buyer_public_key.trim().is_empty() {
            return Err(OrderError::EmptyField("buyer_public_key"));
        }
        if params.initial_audit_budget < minimum_audit_budget {
            return Err(OrderError::BudgetBelowMinimum {
                budget: params.initial_audit_budget,
                minimum: minimum_audit_budget,
            });
        }
        params
            .price
            .checked_add(params.initial_audit_budget)
            .ok_or(OrderError::Overflow)?;
        Ok(())
    }

    /// Amount escrowed at creation: price plus initial audit budget.
    pub fn creation_lock(&self) -> Amount {
        self.escrow.locked
    }

    // =========================================================================
    // ACCESSORS
    // =========================================================================

    /// Order id.
    pub fn id(&self) -> OrderId {
        self.id
    }

    /// Derived order address.
    pub fn address(&self) -> Address {
        self.address
    }

    /// Buyer address.
    pub fn buyer(&self) -> Address {
        self.buyer
    }

    /// Buyer-supplied parameters.
    pub fn params(&self) -> &OrderParams {
        &self.params
    }

    /// Price per response.
    pub fn price(&self) -> Amount {
        self.params.price
    }

    /// Creation time.
    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    /// Close time, set exactly once.
    pub fn closed_at(&self) -> Option<Timestamp> {
        self.closed_at
    }

    /// Current status.
    pub fn status(&self) -> OrderStatus {
        self.status
    }

    /// True while the order accepts notaries and responses.
    pub fn is_open(&self) -> bool {
        self.status == OrderStatus::Open
    }

    /// Terms of an attached notary.
    pub fn notary_terms(&self, notary: &Address) -> Option<&NotaryTerms> {
        self.notary_terms.get(notary)
    }

    /// Attached notaries in attachment order.
    pub fn notaries(&self) -> &[Address] {
        &self.notary_order
    }

    /// Response of `seller`.
    pub fn response(&self, seller: &Address) -> Option<&DataResponse> {
        self.responses.get(seller)
    }

    /// Sellers in submission order.
    pub fn sellers(&self) -> &[Address] {
        &self.seller_order
    }

    /// Responses in submission order.
    pub fn responses(&self) -> impl Iterator<Item = &DataResponse> {
        self.seller_order
            .iter()
            .filter_map(move |seller| self.responses.get(seller))
    }

    /// Escrow bookkeeping.
    pub fn escrow(&self) -> &OrderEscrow {
        &self.escrow
    }

    /// Escrow snapshot.
    pub fn escrow_summary(&self) -> EscrowSummary {
        self.escrow.summary()
    }

    // =========================================================================
    // GUARDS
    // =========================================================================

    /// Fails unless the order is open.
    pub fn ensure_open(&self) -> Result<(), OrderError> {
        if !self.is_open() {
            return Err(OrderError::NotOpen(self.id));
        }
        Ok(())
    }

    /// Fails unless `caller` is the buyer.
    pub fn ensure_buyer(&self, caller: Address) -> Result<(), OrderError> {
        if caller != self.buyer {
            return Err(OrderError::Unauthorized {
                order_id: self.id,
                caller,
            });
        }
        Ok(())
    }

    // =========================================================================
    // NOTARIES
    // =========================================================================

    /// Order-local checks for attaching `notary`.
    pub fn check_add_notary(
        &self,
        caller: Address,
        notary: Address,
        responses_percentage: u8,
    ) -> Result<(), OrderError> {
        self.ensure_buyer(caller)?;
        self.ensure_open()?;
        invariant_percentage_in_range(responses_percentage)?;
        if self.notary_terms.contains_key(&notary) {
            return Err(OrderError::NotaryAlreadyAttached {
                order_id: self.id,
                notary,
            });
        }
        Ok(())
    }

    /// Attach a notary whose terms were checked and authenticated.
    pub fn attach_notary(&mut self, notary: Address, terms: NotaryTerms) {
        if self.notary_terms.insert(notary, terms).is_none() {
            self.notary_order.push(notary);
        }
    }

    // =========================================================================
    // DATA RESPONSES
    // =========================================================================

    /// Order-local checks for a new response and its funding plan.
    pub fn plan_data_response(
        &self,
        caller: Address,
        seller: Address,
        notary: Address,
        exchange: Address,
    ) -> Result<ResponseFunding, OrderError> {
        self.ensure_buyer(caller)?;
        self.ensure_open()?;
        if seller.is_zero() || seller == self.address || seller == exchange {
            return Err(OrderError::InvalidSeller(seller));
        }
        let terms = self
            .notary_terms
            .get(&notary)
            .ok_or(OrderError::NotaryNotAttached {
                order_id: self.id,
                notary,
            })?;
        if self.responses.contains_key(&seller) {
            return Err(OrderError::ResponseExists {
                order_id: self.id,
                seller,
            });
        }

        let price = self.params.price;
        let fee = terms.notarization_fee;
        let mut funding = ResponseFunding::default();

        if self.escrow.prepaid_price >= price {
            funding.price_from_prepaid = price;
        } else {
            funding.fresh_price = price;
        }
        if self.escrow.remaining_budget >= fee {
            funding.fee_from_budget = fee;
        } else {
            funding.fresh_fee = fee;
        }
        funding
            .fresh_total()
            .checked_add(self.escrow.locked)
            .ok_or(OrderError::Overflow)?;

        Ok(funding)
    }

    /// Commit an admitted response. `funding.fresh_total()` must already
    /// have been locked.
    pub fn record_data_response(
        &mut self,
        seller: Address,
        notary: Address,
        data_hash: Hash,
        submission_signature: Vec<u8>,
        funding: ResponseFunding,
        now: Timestamp,
    ) {
        let escrow = &mut self.escrow;
        escrow.prepaid_price -= funding.price_from_prepaid;
        escrow.remaining_budget -= funding.fee_from_budget;
        escrow.locked += funding.fresh_total();
        escrow.committed += funding.committed();

        self.responses.insert(
            seller,
            DataResponse {
                seller,
                notary,
                data_hash,
                submission_signature,
                status: ResponseStatus::Submitted,
                was_audited: false,
                is_data_valid: false,
                committed_price: funding.price_from_prepaid + funding.fresh_price,
                committed_fee: funding.fee_from_budget + funding.fresh_fee,
                submitted_at: now,
                closed_at: None,
            },
        );
        self.seller_order.push(seller);
    }

    /// Order-local checks for closing `seller`'s response and its payouts.
    pub fn plan_close_response(
        &self,
        caller: Address,
        seller: Address,
        was_audited: bool,
        is_data_valid: bool,
    ) -> Result<ResponseSettlement, OrderError> {
        self.ensure_open()?;
        let response = self
            .responses
            .get(&seller)
            .ok_or(OrderError::ResponseNotFound {
                order_id: self.id,
                seller,
            })?;
        if caller != self.buyer && caller != response.notary {
            return Err(OrderError::Unauthorized {
                order_id: self.id,
                caller,
            });
        }
        if response.is_closed() {
            return Err(OrderError::ResponseAlreadyClosed {
                order_id: self.id,
                seller,
            });
        }

        let price = response.committed_price;
        let fee = response.committed_fee;
        Ok(ResponseSettlement {
            seller,
            notary: response.notary,
            to_seller: if is_data_valid { price } else { 0 },
            to_buyer: if is_data_valid { 0 } else { price },
            to_notary: if was_audited { fee } else { 0 },
            fee_to_budget: if was_audited { 0 } else { fee },
        })
    }

    /// Commit a response close whose payouts were sent.
    pub fn apply_close_response(
        &mut self,
        settlement: &ResponseSettlement,
        was_audited: bool,
        is_data_valid: bool,
        now: Timestamp,
    ) {
        let escrow = &mut self.escrow;
        escrow.committed -= settlement.to_seller
            + settlement.to_buyer
            + settlement.to_notary
            + settlement.fee_to_budget;
        escrow.paid_out += settlement.to_seller + settlement.to_notary;
        escrow.refunded += settlement.to_buyer;
        escrow.remaining_budget += settlement.fee_to_budget;

        if let Some(response) = self.responses.get_mut(&settlement.seller) {
            response.status = ResponseStatus::Closed;
            response.was_audited = was_audited;
            response.is_data_valid = is_data_valid;
            response.closed_at = Some(now);
        }
    }

    // =========================================================================
    // CLOSING
    // =========================================================================

    /// Checks for closing the order. Returns the refund owed to the buyer.
    pub fn plan_close(&self, caller: Address, caller_is_owner: bool) -> Result<Amount, OrderError> {
        if caller != self.buyer && !caller_is_owner {
            return Err(OrderError::Unauthorized {
                order_id: self.id,
                caller,
            });
        }
        if !self.is_open() {
            return Err(OrderError::AlreadyClosed(self.id));
        }
        Ok(self.escrow.balance())
    }

    /// Close the order after `refund` went back to the buyer.
    ///
    /// Responses still `Submitted` stay that way; their reserved funds are
    /// part of the refund.
    pub fn apply_close(&mut self, refund: Amount, now: Timestamp) {
        let escrow = &mut self.escrow;
        escrow.refunded += refund;
        escrow.prepaid_price = 0;
        escrow.remaining_budget = 0;
        escrow.committed = 0;

        self.status = OrderStatus::Closed;
        self.closed_at = Some(now);
    }

    /// Responses that were never closed.
    pub fn dangling_responses(&self) -> Vec<Address> {
        self.responses()
            .filter(|r| !r.is_closed())
            .map(|r| r.seller)
            .collect()
    }
}
