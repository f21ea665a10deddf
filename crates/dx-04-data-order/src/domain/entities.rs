//! # Order Entities
//!
//! Value objects owned by a [`DataOrder`](super::order::DataOrder).

use serde::{Deserialize, Serialize};
use shared_crypto::keccak256;
use shared_types::{Address, Amount, Hash, OrderId, Timestamp};

/// Lifecycle of an order. `Open → Closed`, nothing else.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    /// Accepting notaries and responses.
    Open,
    /// Terminal.
    Closed,
}

/// Lifecycle of a data response. `Submitted → Closed`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResponseStatus {
    /// Admitted, awaiting the notary's outcome.
    Submitted,
    /// Settled.
    Closed,
}

/// Buyer-supplied order parameters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderParams {
    /// Price paid per accepted response.
    pub price: Amount,
    /// Budget set aside for notarization fees.
    pub initial_audit_budget: Amount,
    /// Hash of the order terms and data filters.
    pub terms_hash: Hash,
    /// Where sellers deliver data.
    pub buyer_url: String,
    /// Key sellers encrypt data to.
    pub buyer_public_key: String,
}

/// A notary's terms for one order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotaryTerms {
    /// Share of responses the notary audits, 0..=100.
    pub responses_percentage: u8,
    /// Fee per audited response.
    pub notarization_fee: Amount,
    /// Hash of the notary's terms of service.
    pub terms_of_service_hash: Hash,
    /// Notary's signature over the terms.
    pub signature: Vec<u8>,
    /// When the notary was attached.
    pub attached_at: Timestamp,
}

/// A seller's submission to an order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataResponse {
    /// Seller address.
    pub seller: Address,
    /// Notary responsible for the outcome.
    pub notary: Address,
    /// Hash of the delivered data.
    pub data_hash: Hash,
    /// Seller's signature over the response.
    pub submission_signature: Vec<u8>,
    /// Current status.
    pub status: ResponseStatus,
    /// Set on close.
    pub was_audited: bool,
    /// Set on close.
    pub is_data_valid: bool,
    /// Price reserved in the order escrow for this response.
    pub committed_price: Amount,
    /// Fee reserved in the order escrow for this response.
    pub committed_fee: Amount,
    /// Admission time.
    pub submitted_at: Timestamp,
    /// Settlement time.
    pub closed_at: Option<Timestamp>,
}

impl DataResponse {
    /// True once settled.
    pub fn is_closed(&self) -> bool {
        self.status == ResponseStatus::Closed
    }
}

/// Address of an order, derived from the exchange address and the order id.
///
/// Sellers may not use it.
pub fn derive_order_address(exchange: Address, order_id: OrderId) -> Address {
    let mut preimage = Vec::with_capacity(28);
    preimage.extend_from_slice(exchange.as_bytes());
    preimage.extend_from_slice(&order_id.0.to_be_bytes());
    let hash = keccak256(&preimage);
    let mut bytes = [0u8; 20];
    bytes.copy_from_slice(&hash[12..]);
    Address(bytes)
}
