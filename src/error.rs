//! Error types for oracle-agent

use thiserror::Error;

use crate::key::KeyError;
use crate::protocol::WireError;
use crate::signer::SignerError;

/// Main error type for oracle-agent
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Framing violation; the connection cannot continue
    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Invalid message: {0}")]
    InvalidMessage(String),

    #[error("Invalid message: {0}")]
    Wire(#[from] WireError),

    #[error("Key error: {0}")]
    Key(#[from] KeyError),

    #[error("Signing failed: {0}")]
    Signer(#[from] SignerError),

    #[error("request refused by agent")]
    Refused,

    #[error("unexpected agent response type {0}")]
    UnexpectedResponse(u8),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Agent not available: {0}")]
    AgentNotAvailable(String),

    #[error("Socket error: {0}")]
    Socket(String),

    #[error("{0}")]
    Other(String),
}

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;
