//! oracle-agent - SSH agent that signs with Ed25519 keys
//!
//! This library implements the server side of the SSH agent protocol for a
//! fixed set of Ed25519 identities, a client for talking to any agent, and
//! codecs for the SSH key formats involved. Signing goes through the
//! [`signer::Signer`] capability so key material can live outside the
//! process.

pub mod agent;
pub mod cli;
pub mod config;
pub mod error;
pub mod key;
pub mod logging;
pub mod protocol;
pub mod signer;
pub mod utils;

pub use error::{Error, Result};

/// Package version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Package name
pub const NAME: &str = env!("CARGO_PKG_NAME");
