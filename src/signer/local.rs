//! In-process Ed25519 signer

use async_trait::async_trait;
use bytes::Bytes;
use ed25519_dalek::{Signer as _, SigningKey};

use super::{Signer, SignerError};
use crate::key::{KeyPair, KeyError, ed25519};

/// Signs with a private key held in memory
pub struct LocalSigner {
    signing_key: SigningKey,
}

impl LocalSigner {
    /// Build a signer from a key pair
    ///
    /// Fails if the stored public key does not belong to the private key.
    pub fn new(pair: &KeyPair) -> Result<Self, KeyError> {
        let signing_key = SigningKey::from_bytes(pair.secret());
        if signing_key.verifying_key().as_bytes() != pair.public() {
            return Err(KeyError::InconsistentPublicKey);
        }
        Ok(Self { signing_key })
    }

    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(seed),
        }
    }

    pub fn public_key(&self) -> [u8; ed25519::PUBLIC_KEY_SIZE] {
        self.signing_key.verifying_key().to_bytes()
    }

    /// SSH wire blob of the public key
    pub fn public_key_blob(&self) -> Bytes {
        ed25519::serialize_public_key(&self.public_key())
    }
}

impl std::fmt::Debug for LocalSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalSigner")
            .field("public_key", &self.public_key())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Signer for LocalSigner {
    async fn sign(&self, message: &[u8]) -> Result<Bytes, SignerError> {
        let signature = self.signing_key.sign(message);
        Ok(ed25519::serialize_signature(&signature.to_bytes()))
    }
}
