//! # Request Types
//!
//! Arguments of the signed entry points. Each request carries the consent
//! signature the exchange checks before any funds move.

use dx_03_notarization::ConsentMessage;
use serde::{Deserialize, Serialize};
use shared_types::{Address, Amount, Hash, OrderId};

/// Attach a notary to an order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddNotaryRequest {
    /// Notary address.
    pub notary: Address,
    /// Share of responses the notary audits, 0..=100.
    pub responses_percentage: u8,
    /// Fee per audited response.
    pub notarization_fee: Amount,
    /// Hash of the notary's terms of service.
    pub terms_of_service_hash: Hash,
    /// Notary's signature over the terms.
    pub signature: Vec<u8>,
}

impl AddNotaryRequest {
    /// The message the notary signed.
    pub fn consent(&self, order_id: OrderId) -> ConsentMessage {
        ConsentMessage::NotaryTerms {
            order_id,
            responses_percentage: self.responses_percentage,
            notarization_fee: self.notarization_fee,
            terms_of_service_hash: self.terms_of_service_hash,
        }
    }
}

/// Admit a seller's data response.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataResponseRequest {
    /// Seller address.
    pub seller: Address,
    /// Attached notary chosen for the response.
    pub notary: Address,
    /// Hash of the delivered data.
    pub data_hash: Hash,
    /// Seller's signature.
    pub signature: Vec<u8>,
}

impl DataResponseRequest {
    /// The message the seller signed.
    pub fn consent(&self, order_id: OrderId) -> ConsentMessage {
        ConsentMessage::DataResponse {
            order_id,
            seller: self.seller,
            notary: self.notary,
            data_hash: self.data_hash,
        }
    }
}

/// Close a data response with the notary's outcome.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloseResponseRequest {
    /// Seller whose response is closed.
    pub seller: Address,
    /// Whether the notary audited the data.
    pub was_audited: bool,
    /// Audit outcome.
    pub is_data_valid: bool,
    /// Notary's signature.
    pub signature: Vec<u8>,
}

impl CloseResponseRequest {
    /// The message the notary signed.
    pub fn consent(&self, order_id: OrderId) -> ConsentMessage {
        ConsentMessage::CloseResponse {
            order_id,
            seller: self.seller,
            was_audited: self.was_audited,
            is_data_valid: self.is_data_valid,
        }
    }
}
