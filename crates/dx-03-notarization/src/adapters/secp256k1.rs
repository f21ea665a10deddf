//! # secp256k1 Scheme
//!
//! Recovers signers from 65-byte `r || s || v` signatures over the
//! signed-message digest of a consent message.

use crate::domain::ConsentMessage;
use crate::ports::SignatureScheme;
use shared_crypto::{
    eth_signed_message_hash, recover_address, RecoverableSignature, Secp256k1KeyPair,
    SignatureError,
};
use shared_types::{Address, Hash};

/// secp256k1 recovery over prefixed digests.
#[derive(Debug, Default, Clone, Copy)]
pub struct Secp256k1Scheme;

impl SignatureScheme for Secp256k1Scheme {
    fn recover(&self, digest: &Hash, signature: &[u8]) -> Result<Address, SignatureError> {
        let signature = RecoverableSignature::from_bytes(signature)?;
        recover_address(&eth_signed_message_hash(digest), &signature)
    }
}

/// Off-band signer producing signatures [`Secp256k1Scheme`] accepts.
pub struct MessageSigner {
    keypair: Secp256k1KeyPair,
}

impl MessageSigner {
    /// Signer with a fresh random key.
    pub fn random() -> Self {
        Self {
            keypair: Secp256k1KeyPair::generate(),
        }
    }

    /// Signer over a known secret key.
    pub fn from_secret(secret: [u8; 32]) -> Result<Self, SignatureError> {
        Ok(Self {
            keypair: Secp256k1KeyPair::from_bytes(secret)?,
        })
    }

    /// Address the signatures recover to.
    pub fn address(&self) -> Address {
        self.keypair.address()
    }

    /// Sign a consent message.
    pub fn sign(&self, message: &ConsentMessage) -> Result<Vec<u8>, SignatureError> {
        let signature = self.keypair.sign_message(&message.digest())?;
        Ok(signature.to_bytes().to_vec())
    }
}
