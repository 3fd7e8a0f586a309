//! Signing capabilities
//!
//! A [`Signer`] turns a message into an SSH signature blob
//! (`string("ssh-ed25519") || string(sig)`). The agent engine only sees this
//! trait, so it cannot tell whether the key lives in process memory, in an
//! external device or behind another agent.

mod local;
mod verify;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

pub use local::LocalSigner;
pub use verify::{DeviceSigner, RawSigner, VerifyingSigner};

/// Errors from a signing backend
#[derive(Error, Debug)]
pub enum SignerError {
    #[error("signing backend failed: {0}")]
    Backend(String),

    #[error("not an Ed25519 signature, bad length {0}")]
    BadSignatureLength(usize),

    #[error("invalid signature from signing backend")]
    InvalidSignature,

    #[error("request refused by agent")]
    Refused,

    #[error("agent error: {0}")]
    Agent(String),
}

/// Produces SSH signature blobs for one fixed key
#[async_trait]
pub trait Signer: Send + Sync {
    /// Sign `message`, returning the serialized signature blob
    async fn sign(&self, message: &[u8]) -> Result<Bytes, SignerError>;
}
