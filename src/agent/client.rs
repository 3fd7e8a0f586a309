//! SSH agent client
//!
//! Talks to any agent speaking the identity listing and signing subset of
//! the protocol, typically found via the SSH_AUTH_SOCK environment variable.

use crate::error::{Error, Result};
use crate::protocol::{AgentCodec, AgentMessage, MessageType, PublicIdentity, SignRequest};
use crate::signer::{Signer, SignerError};
use async_trait::async_trait;
use bytes::Bytes;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::UnixStream;
use tokio::sync::Mutex;
use tracing::{debug, trace};

/// Default connection timeout
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Environment variable naming the agent socket
pub const SSH_AUTH_SOCK: &str = "SSH_AUTH_SOCK";

/// A connection to an SSH agent
#[derive(Debug)]
pub struct AgentClient<S = UnixStream> {
    stream: S,
}

impl AgentClient<UnixStream> {
    /// Connect to the agent socket at `socket_path`
    pub async fn connect(socket_path: impl AsRef<Path>) -> Result<Self> {
        let socket_path = socket_path.as_ref();
        let stream = tokio::time::timeout(DEFAULT_CONNECT_TIMEOUT, UnixStream::connect(socket_path))
            .await
            .map_err(|_| {
                Error::AgentNotAvailable(format!(
                    "Connection to agent at {} timed out after {:?}",
                    socket_path.display(),
                    DEFAULT_CONNECT_TIMEOUT
                ))
            })?
            .map_err(|e| {
                Error::AgentNotAvailable(format!(
                    "Failed to connect to agent at {}: {}",
                    socket_path.display(),
                    e
                ))
            })?;

        trace!(socket_path = %socket_path.display(), "Connected to agent");
        Ok(Self::new(stream))
    }

    /// Connect to the agent named by SSH_AUTH_SOCK
    pub async fn from_env() -> Result<Self> {
        let socket_path = std::env::var_os(SSH_AUTH_SOCK)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| {
                Error::AgentNotAvailable(format!("{} environment variable not set", SSH_AUTH_SOCK))
            })?;
        debug!(socket_path = ?socket_path, "Using agent from SSH_AUTH_SOCK");
        Self::connect(socket_path).await
    }
}

impl<S: AsyncRead + AsyncWrite + Unpin> AgentClient<S> {
    /// Wrap an already connected stream
    pub fn new(stream: S) -> Self {
        Self { stream }
    }

    pub fn into_inner(self) -> S {
        self.stream
    }

    /// Send a request and return the response
    ///
    /// An `SSH_AGENT_FAILURE` response is reported as [`Error::Refused`].
    pub async fn request(&mut self, msg: &AgentMessage) -> Result<AgentMessage> {
        trace!(msg_type = ?msg.msg_type, "Sending message to agent");
        AgentCodec::write(&mut self.stream, msg).await?;

        let response = AgentCodec::read(&mut self.stream)
            .await?
            .ok_or_else(|| Error::Protocol("Agent closed connection unexpectedly".to_string()))?;

        trace!(response_type = ?response.msg_type, "Received response from agent");
        if response.msg_type == MessageType::Failure {
            return Err(Error::Refused);
        }
        Ok(response)
    }

    /// List the agent's identities, refusing answers with more than `limit`
    pub async fn request_identities(&mut self, limit: usize) -> Result<Vec<PublicIdentity>> {
        let response = self.request(&AgentMessage::request_identities()).await?;
        response.parse_identities(limit)
    }

    /// Ask the agent to sign `data`, returning the signature blob
    pub async fn sign(&mut self, key_blob: &[u8], data: &[u8], flags: u32) -> Result<Bytes> {
        let request = SignRequest {
            key_blob: Bytes::copy_from_slice(key_blob),
            data: Bytes::copy_from_slice(data),
            flags,
        };
        let response = self.request(&AgentMessage::sign_request(&request)).await?;
        response.parse_sign_response()
    }
}

/// A [`Signer`] backed by a key held in another agent
pub struct AgentSigner<S = UnixStream> {
    client: Arc<Mutex<AgentClient<S>>>,
    key_blob: Bytes,
    flags: u32,
}

impl<S> AgentSigner<S> {
    pub fn new(client: Arc<Mutex<AgentClient<S>>>, key_blob: Bytes, flags: u32) -> Self {
        Self {
            client,
            key_blob,
            flags,
        }
    }

    pub fn key_blob(&self) -> &Bytes {
        &self.key_blob
    }
}

#[async_trait]
impl<S: AsyncRead + AsyncWrite + Unpin + Send> Signer for AgentSigner<S> {
    async fn sign(&self, message: &[u8]) -> std::result::Result<Bytes, SignerError> {
        let mut client = self.client.lock().await;
        client
            .sign(&self.key_blob, message, self.flags)
            .await
            .map_err(|e| match e {
                Error::Refused => SignerError::Refused,
                other => SignerError::Agent(other.to_string()),
            })
    }
}
