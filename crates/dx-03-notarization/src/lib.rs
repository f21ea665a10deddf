//! # DX-03 Notarization Protocol
//!
//! Verifies off-band-signed consent: notary terms, seller data responses
//! and closing attestations.
//!
//! ## Flow
//!
//! ```text
//! ConsentMessage ──encode──► tag || fixed-width fields ──keccak──► digest
//!                                                                   │
//!                         signed-message prefix ◄───────────────────┘
//!                                   │
//!                 SignatureScheme::recover ──► Address == claimed signer?
//! ```
//!
//! Any tuple or field-order mismatch changes the digest and is rejected as
//! `InvalidSignature`.
//!
//! ## Module Structure
//!
//! ```text
//! dx-03-notarization/
//! ├── domain/          # ConsentMessage, NotarizationError
//! ├── ports/           # ConsentVerifier (in), SignatureScheme (out)
//! ├── adapters/        # Secp256k1Scheme, MessageSigner
//! └── service.rs       # NotarizationService
//! ```

#![warn(missing_docs)]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

pub use adapters::{MessageSigner, Secp256k1Scheme};
pub use domain::{tags, ConsentMessage, NotarizationError};
pub use ports::{ConsentVerifier, SignatureScheme};
pub use service::NotarizationService;
