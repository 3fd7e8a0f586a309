//! Signers that check every signature before releasing it
//!
//! A faulty or tampered signing device can emit bad signatures that leak
//! private key material. Signatures from such backends are verified against
//! the known public key and dropped on mismatch.

use async_trait::async_trait;
use bytes::Bytes;
use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use tracing::error;

use super::{Signer, SignerError};
use crate::key::{KeyError, ed25519};

/// A backend producing raw 64-byte Ed25519 signatures, e.g. an HSM
#[async_trait]
pub trait RawSigner: Send + Sync {
    /// The raw 32-byte public key of the device key
    fn public_key(&self) -> [u8; ed25519::PUBLIC_KEY_SIZE];

    /// Sign `message`, returning the raw signature bytes
    async fn sign_raw(&self, message: &[u8]) -> Result<Vec<u8>, SignerError>;
}

fn verifying_key(public: &[u8; ed25519::PUBLIC_KEY_SIZE]) -> Result<VerifyingKey, KeyError> {
    VerifyingKey::from_bytes(public).map_err(|_| KeyError::InconsistentPublicKey)
}

fn check(key: &VerifyingKey, message: &[u8], raw: &[u8; ed25519::SIGNATURE_SIZE]) -> bool {
    key.verify(message, &Signature::from_bytes(raw)).is_ok()
}

/// Wraps a [`RawSigner`], enforcing length and validity of its output
pub struct DeviceSigner<D> {
    device: D,
    key: VerifyingKey,
}

impl<D: RawSigner> DeviceSigner<D> {
    /// Fails if the device reports a point that is not a valid public key
    pub fn new(device: D) -> Result<Self, KeyError> {
        let key = verifying_key(&device.public_key())?;
        Ok(Self { device, key })
    }

    pub fn public_key_blob(&self) -> Bytes {
        ed25519::serialize_public_key(self.key.as_bytes())
    }
}

#[async_trait]
impl<D: RawSigner> Signer for DeviceSigner<D> {
    async fn sign(&self, message: &[u8]) -> Result<Bytes, SignerError> {
        let raw = self.device.sign_raw(message).await?;
        let raw: [u8; ed25519::SIGNATURE_SIZE] = raw
            .as_slice()
            .try_into()
            .map_err(|_| SignerError::BadSignatureLength(raw.len()))?;
        if !check(&self.key, message, &raw) {
            error!("Signing device returned an invalid signature");
            return Err(SignerError::InvalidSignature);
        }
        Ok(ed25519::serialize_signature(&raw))
    }
}

/// Wraps any [`Signer`] and verifies its signature blobs
pub struct VerifyingSigner<S> {
    inner: S,
    key: VerifyingKey,
}

impl<S: Signer> VerifyingSigner<S> {
    /// `key_blob` is the SSH public key blob the inner signer signs for
    pub fn new(inner: S, key_blob: &[u8]) -> Result<Self, KeyError> {
        let public = ed25519::parse_public_key(key_blob)?;
        Ok(Self {
            inner,
            key: verifying_key(&public)?,
        })
    }
}

#[async_trait]
impl<S: Signer> Signer for VerifyingSigner<S> {
    async fn sign(&self, message: &[u8]) -> Result<Bytes, SignerError> {
        let blob = self.inner.sign(message).await?;
        let raw = ed25519::parse_signature(&blob).map_err(|e| {
            error!(error = %e, "Signer returned a malformed signature blob");
            SignerError::InvalidSignature
        })?;
        if !check(&self.key, message, &raw) {
            error!("Signer returned an invalid signature");
            return Err(SignerError::InvalidSignature);
        }
        Ok(blob)
    }
}
