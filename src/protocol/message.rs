//! SSH Agent Protocol message types and parsing

use crate::error::{Error, Result};
use crate::protocol::wire::{self, WireError, parse_exact, put_string, read_string, read_u32};
use bytes::{Buf, BufMut, Bytes, BytesMut};
use ssh_key::{Fingerprint, HashAlg, PublicKey};

/// Maximum size of any length-prefixed field in an agent message.
/// Key blobs, data to sign, comments and signatures all fit well below it.
pub const AGENT_MAX_FIELD_SIZE: usize = 10000;

/// SSH Agent message types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageType {
    // Requests from client
    RequestIdentities,
    SignRequest,

    // Responses from agent
    Failure,
    IdentitiesAnswer,
    SignResponse,

    /// Any type this agent does not implement
    Other(u8),
}

impl From<u8> for MessageType {
    fn from(value: u8) -> Self {
        match value {
            5 => MessageType::Failure,
            11 => MessageType::RequestIdentities,
            12 => MessageType::IdentitiesAnswer,
            13 => MessageType::SignRequest,
            14 => MessageType::SignResponse,
            other => MessageType::Other(other),
        }
    }
}

impl From<MessageType> for u8 {
    fn from(value: MessageType) -> Self {
        match value {
            MessageType::Failure => 5,
            MessageType::RequestIdentities => 11,
            MessageType::IdentitiesAnswer => 12,
            MessageType::SignRequest => 13,
            MessageType::SignResponse => 14,
            MessageType::Other(other) => other,
        }
    }
}

impl MessageType {
    /// Get the message type name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageType::RequestIdentities => "SSH_AGENTC_REQUEST_IDENTITIES",
            MessageType::SignRequest => "SSH_AGENTC_SIGN_REQUEST",
            MessageType::Failure => "SSH_AGENT_FAILURE",
            MessageType::IdentitiesAnswer => "SSH_AGENT_IDENTITIES_ANSWER",
            MessageType::SignResponse => "SSH_AGENT_SIGN_RESPONSE",
            MessageType::Other(_) => "UNKNOWN",
        }
    }
}

/// A public key as announced in an identities answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicIdentity {
    /// Raw public key blob (without outer length field)
    pub key_blob: Bytes,
    /// Comment associated with the key
    pub comment: String,
}

impl PublicIdentity {
    pub fn new(key_blob: Bytes, comment: impl Into<String>) -> Self {
        Self {
            key_blob,
            comment: comment.into(),
        }
    }

    /// Parse the key blob, if it is a key type `ssh-key` understands
    pub fn public_key(&self) -> Option<PublicKey> {
        PublicKey::from_bytes(&self.key_blob).ok()
    }

    /// Get the SHA256 fingerprint of this key
    pub fn fingerprint(&self) -> Option<Fingerprint> {
        self.public_key().map(|k| k.fingerprint(HashAlg::Sha256))
    }
}

/// Body of an SSH_AGENTC_SIGN_REQUEST
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignRequest {
    pub key_blob: Bytes,
    pub data: Bytes,
    /// Signature flags; carried on the wire but not interpreted
    pub flags: u32,
}

impl SignRequest {
    /// Decode the three request fields, leaving any remainder in `buf`
    pub fn decode<B: Buf>(buf: &mut B) -> std::result::Result<Self, WireError> {
        let key_blob = read_string(buf, AGENT_MAX_FIELD_SIZE)?;
        let data = read_string(buf, AGENT_MAX_FIELD_SIZE)?;
        let flags = read_u32(buf)?;
        Ok(Self {
            key_blob,
            data,
            flags,
        })
    }

    pub fn encode<B: BufMut>(&self, buf: &mut B) {
        put_string(buf, &self.key_blob);
        put_string(buf, &self.data);
        buf.put_u32(self.flags);
    }
}

/// SSH Agent protocol message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentMessage {
    /// Message type
    pub msg_type: MessageType,
    /// Raw message payload (excluding type byte)
    pub payload: Bytes,
}

impl AgentMessage {
    /// Create a new message
    pub fn new(msg_type: MessageType, payload: Bytes) -> Self {
        Self { msg_type, payload }
    }

    /// Create a failure response
    pub fn failure() -> Self {
        Self::new(MessageType::Failure, Bytes::new())
    }

    /// Create an identities request
    pub fn request_identities() -> Self {
        Self::new(MessageType::RequestIdentities, Bytes::new())
    }

    /// Build a sign request message
    pub fn sign_request(request: &SignRequest) -> Self {
        let mut payload = BytesMut::new();
        request.encode(&mut payload);
        Self::new(MessageType::SignRequest, payload.freeze())
    }

    /// Build a sign response carrying an SSH signature blob
    pub fn sign_response(signature: &[u8]) -> Self {
        Self::new(MessageType::SignResponse, wire::serialize_string(signature))
    }

    /// Build an IdentitiesAnswer message from a list of identities
    ///
    /// # Panics
    /// Panics if the number of identities exceeds u32::MAX (practically impossible).
    pub fn identities_answer<'a, I>(identities: I) -> Self
    where
        I: IntoIterator<Item = (&'a [u8], &'a str)>,
        I::IntoIter: ExactSizeIterator,
    {
        let identities = identities.into_iter();
        let mut payload = BytesMut::new();
        let count = u32::try_from(identities.len()).expect("identity count exceeds u32::MAX");
        payload.put_u32(count);

        for (key_blob, comment) in identities {
            put_string(&mut payload, key_blob);
            put_string(&mut payload, comment);
        }

        Self::new(MessageType::IdentitiesAnswer, payload.freeze())
    }

    fn expect_type(&self, expected: MessageType) -> Result<()> {
        if self.msg_type != expected {
            return Err(Error::UnexpectedResponse(self.msg_type.into()));
        }
        Ok(())
    }

    /// Parse identities from an IdentitiesAnswer message
    ///
    /// Rejects answers announcing more than `limit` identities before reading
    /// any of them.
    pub fn parse_identities(&self, limit: usize) -> Result<Vec<PublicIdentity>> {
        self.expect_type(MessageType::IdentitiesAnswer)?;

        parse_exact(&self.payload, &[], |buf| {
            let count = read_u32(buf)?;
            if u64::from(count) > limit as u64 {
                return Err(Error::InvalidMessage(format!(
                    "too many identities: {} exceeds limit {}",
                    count, limit
                )));
            }

            let mut identities = Vec::with_capacity(count as usize);
            for _ in 0..count {
                let key_blob = read_string(buf, AGENT_MAX_FIELD_SIZE)?;
                let comment = read_string(buf, AGENT_MAX_FIELD_SIZE)?;
                identities.push(PublicIdentity::new(
                    key_blob,
                    String::from_utf8_lossy(&comment),
                ));
            }
            Ok(identities)
        })
    }

    /// Parse the body of a SignRequest message; no bytes may remain
    pub fn parse_sign_request(&self) -> Result<SignRequest> {
        if self.msg_type != MessageType::SignRequest {
            return Err(Error::InvalidMessage(format!(
                "Expected SignRequest, got {:?}",
                self.msg_type
            )));
        }
        Ok(parse_exact(&self.payload, &[], |buf| SignRequest::decode(buf))?)
    }

    /// Parse the signature blob from a SignResponse message
    pub fn parse_sign_response(&self) -> Result<Bytes> {
        self.expect_type(MessageType::SignResponse)?;
        Ok(parse_exact(&self.payload, &[], |buf| {
            read_string(buf, AGENT_MAX_FIELD_SIZE)
        })?)
    }

    /// Encode the message to bytes (including length prefix)
    pub fn encode(&self) -> Result<Bytes> {
        let total_len = u32::try_from(1 + self.payload.len()).map_err(|_| {
            Error::InvalidMessage(format!(
                "invalid agent message size {}",
                self.payload.len()
            ))
        })?;
        let mut buf = BytesMut::with_capacity(4 + total_len as usize);
        buf.put_u32(total_len);
        buf.put_u8(self.msg_type.into());
        buf.put_slice(&self.payload);
        Ok(buf.freeze())
    }

    /// Decode a message from bytes (excluding length prefix)
    pub fn decode(data: Bytes) -> Result<Self> {
        if data.is_empty() {
            return Err(Error::Protocol("invalid empty agent message".to_string()));
        }

        let msg_type = MessageType::from(data[0]);
        Ok(Self::new(msg_type, data.slice(1..)))
    }
}
