//! Identity registry
//!
//! Built once at startup and shared read-only by all connections.

use bytes::Bytes;
use std::collections::HashMap;
use std::sync::Arc;

use crate::signer::Signer;

/// Comment announced for identities that have none configured
pub const DEFAULT_COMMENT: &str = "oracle key";

/// A key the agent can sign with
#[derive(Clone)]
pub struct Identity {
    pub key_blob: Bytes,
    pub comment: String,
    pub signer: Arc<dyn Signer>,
}

impl Identity {
    pub fn new(key_blob: Bytes, comment: impl Into<String>, signer: Arc<dyn Signer>) -> Self {
        Self {
            key_blob,
            comment: comment.into(),
            signer,
        }
    }
}

impl std::fmt::Debug for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Identity")
            .field("key_blob", &self.key_blob)
            .field("comment", &self.comment)
            .finish_non_exhaustive()
    }
}

/// Immutable set of identities keyed by public key blob
///
/// Identities are listed in insertion order. Adding a blob that is already
/// present replaces the earlier identity in its original position.
#[derive(Debug, Default, Clone)]
pub struct Registry {
    identities: Vec<Identity>,
    index: HashMap<Bytes, usize>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with a single identity
    pub fn single(key_blob: Bytes, comment: impl Into<String>, signer: Arc<dyn Signer>) -> Self {
        Self::new().with_identity(Identity::new(key_blob, comment, signer))
    }

    /// Add an identity while building the registry
    pub fn with_identity(mut self, identity: Identity) -> Self {
        match self.index.get(&identity.key_blob) {
            Some(&pos) => self.identities[pos] = identity,
            None => {
                self.index
                    .insert(identity.key_blob.clone(), self.identities.len());
                self.identities.push(identity);
            }
        }
        self
    }

    /// Look up an identity by exact key blob match
    pub fn get(&self, key_blob: &[u8]) -> Option<&Identity> {
        self.index.get(key_blob).map(|&pos| &self.identities[pos])
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Identity> {
        self.identities.iter()
    }

    pub fn len(&self) -> usize {
        self.identities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }
}

impl FromIterator<Identity> for Registry {
    fn from_iter<I: IntoIterator<Item = Identity>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Registry::new(), |registry, identity| registry.with_identity(identity))
    }
}
