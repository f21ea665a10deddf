//! # Consent Messages
//!
//! Off-band consent is given by signing the digest of one of these messages.
//!
//! ## Canonical Encoding
//!
//! ```text
//! digest = keccak256( tag || field_1 || field_2 || ... )
//! ```
//!
//! | Field type | Encoding |
//! |------------|----------|
//! | `OrderId` | 8 bytes, big-endian |
//! | percentage | 1 byte |
//! | `Amount` | 16 bytes, big-endian |
//! | `Address` | 20 bytes |
//! | `Hash` | 32 bytes |
//! | `bool` | 1 byte (`0x00` / `0x01`) |
//!
//! Every field is fixed-width, so two different tuples can never encode to
//! the same bytes. The leading tag keeps a signature for one message kind
//! from being replayed as another.

use serde::{Deserialize, Serialize};
use shared_crypto::keccak256;
use shared_types::{Address, Amount, Hash, OrderId};

/// Message kind tags.
pub mod tags {
    /// Notary accepts to serve an order.
    pub const NOTARY_TERMS: u8 = 0x01;
    /// Seller submits data to an order.
    pub const DATA_RESPONSE: u8 = 0x02;
    /// Notary reports the audit outcome of a response.
    pub const CLOSE_RESPONSE: u8 = 0x03;
}

/// A message whose digest is signed to give consent.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConsentMessage {
    /// Signed by the notary when it is attached to an order.
    NotaryTerms {
        /// Order the notary serves.
        order_id: OrderId,
        /// Share of responses the notary audits, 0..=100.
        responses_percentage: u8,
        /// Fee per audited response.
        notarization_fee: Amount,
        /// Hash of the notary's terms of service.
        terms_of_service_hash: Hash,
    },

    /// Signed by the seller for each data response.
    DataResponse {
        /// Order the data answers.
        order_id: OrderId,
        /// Seller address.
        seller: Address,
        /// Notary chosen for the response.
        notary: Address,
        /// Hash of the delivered data.
        data_hash: Hash,
    },

    /// Signed by the notary to close a response.
    CloseResponse {
        /// Order id.
        order_id: OrderId,
        /// Seller whose response is closed.
        seller: Address,
        /// Whether the notary audited the data.
        was_audited: bool,
        /// Audit outcome.
        is_data_valid: bool,
    },
}

impl ConsentMessage {
    /// Kind tag prefixed to the encoding.
    pub fn tag(&self) -> u8 {
        match self {
            Self::NotaryTerms { .. } => tags::NOTARY_TERMS,
            Self::DataResponse { .. } => tags::DATA_RESPONSE,
            Self::CloseResponse { .. } => tags::CLOSE_RESPONSE,
        }
    }

    /// Short name for logs.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::NotaryTerms { .. } => "notary_terms",
            Self::DataResponse { .. } => "data_response",
            Self::CloseResponse { .. } => "close_response",
        }
    }

    /// Canonical byte encoding.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(1 + 8 + 20 + 20 + 32);
        out.push(self.tag());
        match self {
            Self::NotaryTerms {
                order_id,
                responses_percentage,
                notarization_fee,
                terms_of_service_hash,
            } => {
                out.extend_from_slice(&order_id.0.to_be_bytes());
                out.push(*responses_percentage);
                out.extend_from_slice(&notarization_fee.to_be_bytes());
                out.extend_from_slice(terms_of_service_hash);
            }
            Self::DataResponse {
                order_id,
                seller,
                notary,
                data_hash,
            } => {
                out.extend_from_slice(&order_id.0.to_be_bytes());
                out.extend_from_slice(seller.as_bytes());
                out.extend_from_slice(notary.as_bytes());
                out.extend_from_slice(data_hash);
            }
            Self::CloseResponse {
                order_id,
                seller,
                was_audited,
                is_data_valid,
            } => {
                out.extend_from_slice(&order_id.0.to_be_bytes());
                out.extend_from_slice(seller.as_bytes());
                out.push(u8::from(*was_audited));
                out.push(u8::from(*is_data_valid));
            }
        }
        out
    }

    /// Keccak-256 of the canonical encoding.
    pub fn digest(&self) -> Hash {
        keccak256(&self.encode())
    }
}
