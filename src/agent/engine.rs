//! Agent request handling
//!
//! Each connection runs a simple loop: read a request, answer it, repeat
//! until the client disconnects. Per-request failures (unknown key, signer
//! error, unsupported message) are answered with `SSH_AGENT_FAILURE` and the
//! connection stays open. Malformed requests end the connection.

use crate::agent::registry::Registry;
use crate::error::{Error, Result};
use crate::protocol::{AgentCodec, AgentMessage, MessageType};
use crate::signer::SignerError;
use ssh_key::{HashAlg, PublicKey};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, info, trace, warn};

/// Why a well-formed request was answered with a failure
#[derive(Error, Debug)]
pub enum Refusal {
    #[error("no identity for requested key")]
    UnknownKey,

    #[error("signer failed: {0}")]
    SigningFailed(#[from] SignerError),

    #[error("unsupported message type {0}")]
    Unsupported(u8),
}

/// Outcome of a request that did not produce a normal response
#[derive(Debug)]
enum HandlerError {
    /// The connection cannot continue
    Fatal(Error),
    /// Answer with `SSH_AGENT_FAILURE` and keep serving
    Recoverable(Refusal),
}

impl From<Error> for HandlerError {
    fn from(e: Error) -> Self {
        HandlerError::Fatal(e)
    }
}

impl From<Refusal> for HandlerError {
    fn from(r: Refusal) -> Self {
        HandlerError::Recoverable(r)
    }
}

/// SHA256 fingerprint for log output
fn key_fingerprint(key_blob: &[u8]) -> String {
    match PublicKey::from_bytes(key_blob) {
        Ok(key) => key.fingerprint(HashAlg::Sha256).to_string(),
        Err(_) => "<unparsable key>".to_string(),
    }
}

/// SSH agent answering identity and sign requests from a [`Registry`]
pub struct Agent {
    registry: Arc<Registry>,
    /// Used to tag log lines; usually the socket path
    label: String,
    /// Connection counter for client IDs
    connection_counter: AtomicU64,
}

impl Agent {
    pub fn new(registry: Registry) -> Self {
        Self::new_shared(Arc::new(registry))
    }

    pub fn new_shared(registry: Arc<Registry>) -> Self {
        Self {
            registry,
            label: String::new(),
            connection_counter: AtomicU64::new(0),
        }
    }

    /// Set the label used in log output
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Serve one client until it disconnects
    ///
    /// Returns `Ok(())` on a clean disconnect between messages and an error
    /// for framing violations, malformed requests or I/O failure.
    pub async fn handle_client<S>(&self, mut stream: S) -> Result<()>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let client_id = self.connection_counter.fetch_add(1, Ordering::Relaxed);
        debug!(socket = %self.label, client_id, "Client connected");

        let result = self.handle_client_inner(&mut stream).await;

        match &result {
            Ok(()) => debug!(socket = %self.label, client_id, "Client disconnected"),
            Err(e) => {
                warn!(socket = %self.label, client_id, error = %e, "Client connection terminated")
            }
        }
        result
    }

    async fn handle_client_inner<S>(&self, stream: &mut S) -> Result<()>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        loop {
            let request = match AgentCodec::read(stream).await? {
                Some(msg) => msg,
                None => {
                    trace!("Client closed connection");
                    break;
                }
            };

            trace!(msg_type = ?request.msg_type, "Received request from client");

            let response = match self.process_request(request).await {
                Ok(response) => response,
                Err(HandlerError::Recoverable(refusal)) => {
                    warn!(reason = %refusal, "Refusing request");
                    AgentMessage::failure()
                }
                Err(HandlerError::Fatal(e)) => return Err(e),
            };

            AgentCodec::write(stream, &response).await?;
        }

        Ok(())
    }

    async fn process_request(
        &self,
        request: AgentMessage,
    ) -> std::result::Result<AgentMessage, HandlerError> {
        match request.msg_type {
            MessageType::RequestIdentities => self.handle_request_identities(request),
            MessageType::SignRequest => self.handle_sign_request(request).await,
            other => Err(Refusal::Unsupported(other.into()).into()),
        }
    }

    /// Handle SSH_AGENTC_REQUEST_IDENTITIES (11)
    fn handle_request_identities(
        &self,
        request: AgentMessage,
    ) -> std::result::Result<AgentMessage, HandlerError> {
        if !request.payload.is_empty() {
            return Err(Error::InvalidMessage(format!(
                "REQUEST_IDENTITIES with {} byte body",
                request.payload.len()
            ))
            .into());
        }

        debug!(count = self.registry.len(), "Listing identities");
        Ok(AgentMessage::identities_answer(
            self.registry
                .iter()
                .map(|id| (id.key_blob.as_ref(), id.comment.as_str())),
        ))
    }

    /// Handle SSH_AGENTC_SIGN_REQUEST (13)
    async fn handle_sign_request(
        &self,
        request: AgentMessage,
    ) -> std::result::Result<AgentMessage, HandlerError> {
        let sign_request = request.parse_sign_request()?;

        let identity = self
            .registry
            .get(&sign_request.key_blob)
            .ok_or_else(|| {
                debug!(
                    fingerprint = %key_fingerprint(&sign_request.key_blob),
                    "Sign request for unknown key"
                );
                Refusal::UnknownKey
            })?;

        let signature = identity
            .signer
            .sign(&sign_request.data)
            .await
            .map_err(Refusal::from)?;

        info!(
            fingerprint = %key_fingerprint(&identity.key_blob),
            comment = %identity.comment,
            data_len = sign_request.data.len(),
            "Signed request"
        );
        Ok(AgentMessage::sign_response(&signature))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::registry::Identity;
    use crate::protocol::SignRequest;
    use crate::signer::{LocalSigner, Signer};
    use async_trait::async_trait;
    use bytes::Bytes;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    struct FailingSigner;

    #[async_trait]
    impl Signer for FailingSigner {
        async fn sign(&self, _message: &[u8]) -> std::result::Result<Bytes, SignerError> {
            Err(SignerError::Backend("device unplugged".into()))
        }
    }

    fn local_registry() -> (Registry, Bytes) {
        let signer = LocalSigner::from_seed(&[1; 32]);
        let blob = signer.public_key_blob();
        (Registry::single(blob.clone(), "test key", Arc::new(signer)), blob)
    }

    /// Send raw bytes to a fresh agent and collect everything it writes back
    async fn exchange(agent: Agent, input: &[u8]) -> (Result<()>, Vec<u8>) {
        let (mut client, server) = tokio::io::duplex(4096);
        let task = tokio::spawn(async move { agent.handle_client(server).await });
        client.write_all(input).await.unwrap();
        client.shutdown().await.unwrap();
        let mut output = Vec::new();
        client.read_to_end(&mut output).await.unwrap();
        (task.await.unwrap(), output)
    }

    fn frame(msg: &AgentMessage) -> Vec<u8> {
        msg.encode().unwrap().to_vec()
    }

    #[tokio::test]
    async fn test_empty_registry_lists_nothing() {
        let (result, out) = exchange(Agent::new(Registry::new()), &[0, 0, 0, 1, 11]).await;
        result.unwrap();
        assert_eq!(out, [0, 0, 0, 5, 12, 0, 0, 0, 0]);
    }

    #[tokio::test]
    async fn test_lists_identities() {
        let (registry, blob) = local_registry();
        let (result, out) = exchange(Agent::new(registry), &[0, 0, 0, 1, 11]).await;
        result.unwrap();

        let expected = AgentMessage::identities_answer([(blob.as_ref(), "test key")]);
        assert_eq!(out, frame(&expected));
    }

    #[tokio::test]
    async fn test_identities_request_with_body_is_fatal() {
        let (result, out) = exchange(Agent::new(Registry::new()), &[0, 0, 0, 2, 11, 0]).await;
        assert!(result.is_err());
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_message_type() {
        let (result, out) = exchange(Agent::new(Registry::new()), &[0, 0, 0, 3, 0x63, 1, 2]).await;
        result.unwrap();
        assert_eq!(out, [0, 0, 0, 1, 5]);
    }

    #[tokio::test]
    async fn test_sign_unknown_key_keeps_connection() {
        let (registry, _) = local_registry();
        let request = AgentMessage::sign_request(&SignRequest {
            key_blob: LocalSigner::from_seed(&[2; 32]).public_key_blob(),
            data: Bytes::from_static(b"foo"),
            flags: 0,
        });
        let mut input = frame(&request);
        input.extend_from_slice(&[0, 0, 0, 1, 11]);

        let (result, out) = exchange(Agent::new(registry), &input).await;
        result.unwrap();
        assert_eq!(&out[..5], &[0, 0, 0, 1, 5]);
        // Second request still answered
        assert_eq!(out[9], 12);
    }

    #[tokio::test]
    async fn test_sign() {
        let (registry, blob) = local_registry();
        let request = AgentMessage::sign_request(&SignRequest {
            key_blob: blob,
            data: Bytes::from_static(b"foo"),
            flags: 0,
        });
        let (result, out) = exchange(Agent::new(registry), &frame(&request)).await;
        result.unwrap();

        let expected = LocalSigner::from_seed(&[1; 32]).sign(b"foo").await.unwrap();
        assert_eq!(out, frame(&AgentMessage::sign_response(&expected)));
    }

    #[tokio::test]
    async fn test_signer_failure_is_recoverable() {
        let blob = LocalSigner::from_seed(&[4; 32]).public_key_blob();
        let registry = Registry::new().with_identity(Identity::new(
            blob.clone(),
            "broken",
            Arc::new(FailingSigner),
        ));
        let request = AgentMessage::sign_request(&SignRequest {
            key_blob: blob,
            data: Bytes::from_static(b"foo"),
            flags: 0,
        });
        let mut input = frame(&request);
        input.extend_from_slice(&frame(&request));

        let (result, out) = exchange(Agent::new(registry), &input).await;
        result.unwrap();
        assert_eq!(out, [0, 0, 0, 1, 5, 0, 0, 0, 1, 5]);
    }

    #[tokio::test]
    async fn test_sign_request_trailing_bytes_is_fatal() {
        let (registry, blob) = local_registry();
        let request = AgentMessage::sign_request(&SignRequest {
            key_blob: blob,
            data: Bytes::from_static(b"foo"),
            flags: 0,
        });
        let mut payload = request.payload.to_vec();
        payload.push(0);
        let padded = AgentMessage::new(MessageType::SignRequest, payload.into());

        let (result, out) = exchange(Agent::new(registry), &frame(&padded)).await;
        assert!(result.is_err());
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn test_truncated_message_is_error() {
        let (result, out) = exchange(Agent::new(Registry::new()), &[0, 0, 0, 9, 11]).await;
        assert!(matches!(result, Err(Error::Protocol(_))));
        assert!(out.is_empty());
    }

    #[test]
    fn test_key_fingerprint() {
        let blob = LocalSigner::from_seed(&[1; 32]).public_key_blob();
        assert!(key_fingerprint(&blob).starts_with("SHA256:"));
        assert_eq!(key_fingerprint(b"junk"), "<unparsable key>");
    }
}
