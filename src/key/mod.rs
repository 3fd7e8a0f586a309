//! Ed25519 key material and its SSH encodings
//!
//! - `ed25519`: public key and signature wire blobs
//! - `openssh`: the unencrypted `openssh-key-v1` private key container
//! - `pem`: PEM armor used by private key files
//! - `public`: single-line `ssh-ed25519 AAAA... comment` public keys
//!
//! Only unencrypted, single-key Ed25519 containers are supported.

pub mod ed25519;
pub mod openssh;
pub mod pem;
pub mod public;

use bytes::Bytes;
use ed25519_dalek::SigningKey;
use std::path::PathBuf;
use thiserror::Error;
use zeroize::Zeroizing;

use crate::protocol::WireError;

pub use openssh::{
    parse_private_key_file, read_private_key_file, serialize_private_key_file,
    write_private_key_file,
};
pub use public::{format_public_key_line, parse_public_key_line};

/// Errors from decoding key material
#[derive(Error, Debug)]
pub enum KeyError {
    #[error("not a PEM file")]
    NotPem,

    #[error("unexpected PEM tag: {0:?}")]
    PemTag(String),

    #[error("invalid or encrypted private key: {0}")]
    UnsupportedContainer(WireError),

    #[error("invalid private key, pubkey missing: {0}")]
    MissingPublicKey(WireError),

    #[error("invalid private key: {0}")]
    PrivateSection(WireError),

    #[error("invalid private key length: {0}")]
    BadLength(usize),

    #[error("invalid public key blob prefix: {0}")]
    PublicKeyPrefix(WireError),

    #[error("invalid signature blob prefix: {0}")]
    SignaturePrefix(WireError),

    #[error("invalid private key, bad nonce")]
    NonceMismatch,

    #[error("invalid private key, inconsistent public key")]
    InconsistentPublicKey,

    #[error("invalid private key, private key missing: {0}")]
    MissingPrivateKey(WireError),

    #[error("unexpected private key size: {0}")]
    PrivateKeySize(usize),

    #[error("comment string missing")]
    MissingComment,

    #[error("unsupported public key type: {0}")]
    UnsupportedKeyType(String),

    #[error("invalid public key line: {0}")]
    InvalidPublicKeyLine(String),

    #[error("{0}")]
    Wire(#[from] WireError),

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl KeyError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        KeyError::Io {
            path: path.into(),
            source,
        }
    }
}

/// An Ed25519 private key together with its public key
///
/// The private half is wiped from memory when the pair is dropped.
pub struct KeyPair {
    secret: Zeroizing<[u8; 32]>,
    public: [u8; 32],
}

impl KeyPair {
    /// Build a pair from parsed parts; no consistency check is made
    pub fn from_parts(secret: [u8; 32], public: [u8; 32]) -> Self {
        Self {
            secret: Zeroizing::new(secret),
            public,
        }
    }

    /// Derive the pair from a 32-byte Ed25519 seed
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        let signing_key = SigningKey::from_bytes(seed);
        Self::from_parts(*seed, signing_key.verifying_key().to_bytes())
    }

    /// Generate a fresh random key
    pub fn generate() -> Self {
        let signing_key = SigningKey::generate(&mut rand::rngs::OsRng);
        Self::from_parts(signing_key.to_bytes(), signing_key.verifying_key().to_bytes())
    }

    pub fn secret(&self) -> &[u8; 32] {
        &self.secret
    }

    pub fn public(&self) -> &[u8; 32] {
        &self.public
    }

    /// The SSH wire blob of the public key
    pub fn public_key_blob(&self) -> Bytes {
        ed25519::serialize_public_key(&self.public)
    }
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("public", &self.public)
            .finish_non_exhaustive()
    }
}
