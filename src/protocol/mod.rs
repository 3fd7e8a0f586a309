//! SSH Agent Protocol implementation
//!
//! This module implements the subset of the SSH agent protocol defined in:
//! https://datatracker.ietf.org/doc/html/draft-miller-ssh-agent
//! needed by a signing oracle: identity listing and signing.

pub mod codec;
pub mod message;
pub mod wire;

pub use codec::{AgentCodec, MAX_MESSAGE_SIZE};
pub use message::{AGENT_MAX_FIELD_SIZE, AgentMessage, MessageType, PublicIdentity, SignRequest};
pub use wire::{WireError, parse_exact};
