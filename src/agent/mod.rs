//! SSH agent signing oracle
//!
//! - `Registry`: the fixed set of identities the agent signs for
//! - `Agent`: per-connection request handling
//! - `Server`: Unix socket listener that spawns an `Agent` handler per client
//! - `AgentClient`: client side of the same protocol subset

pub mod client;
pub mod engine;
pub mod registry;
mod server;

pub use client::{AgentClient, AgentSigner};
pub use engine::{Agent, Refusal};
pub use registry::{DEFAULT_COMMENT, Identity, Registry};
pub use server::Server;
