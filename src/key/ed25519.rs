//! Ed25519 public key and signature blobs (RFC 8709)
//!
//! Both are encoded the same way: `string("ssh-ed25519") || string(raw)`,
//! with a 32-byte raw key or a 64-byte raw signature.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use super::KeyError;
use crate::protocol::wire::{parse_exact, put_string, read_array, read_skip, serialize_u32};

/// SSH key type name
pub const KEY_TYPE: &str = "ssh-ed25519";

/// Raw public key size
pub const PUBLIC_KEY_SIZE: usize = 32;

/// Raw signature size
pub const SIGNATURE_SIZE: usize = 64;

/// Length of a serialized public key blob
pub const PUBLIC_KEY_BLOB_SIZE: usize = 4 + KEY_TYPE.len() + 4 + PUBLIC_KEY_SIZE;

fn serialize(raw: &[u8]) -> Bytes {
    let mut buf = BytesMut::with_capacity(4 + KEY_TYPE.len() + 4 + raw.len());
    put_string(&mut buf, KEY_TYPE);
    put_string(&mut buf, raw);
    buf.freeze()
}

/// Literal bytes preceding the raw field: type name and the raw length
fn blob_prefix(raw_len: usize) -> BytesMut {
    let mut prefix = BytesMut::with_capacity(4 + KEY_TYPE.len() + 4);
    put_string(&mut prefix, KEY_TYPE);
    prefix.put_slice(&serialize_u32(raw_len as u32));
    prefix
}

pub fn serialize_public_key(public: &[u8; PUBLIC_KEY_SIZE]) -> Bytes {
    serialize(public)
}

pub fn serialize_signature(signature: &[u8; SIGNATURE_SIZE]) -> Bytes {
    serialize(signature)
}

/// Read a public key blob, returning the raw 32-byte key
pub fn read_public_key<B: Buf>(buf: &mut B) -> Result<[u8; PUBLIC_KEY_SIZE], KeyError> {
    read_skip(buf, &blob_prefix(PUBLIC_KEY_SIZE)).map_err(KeyError::PublicKeyPrefix)?;
    Ok(read_array(buf)?)
}

/// Read a signature blob, returning the raw 64-byte signature
pub fn read_signature<B: Buf>(buf: &mut B) -> Result<[u8; SIGNATURE_SIZE], KeyError> {
    read_skip(buf, &blob_prefix(SIGNATURE_SIZE)).map_err(KeyError::SignaturePrefix)?;
    Ok(read_array(buf)?)
}

/// Parse a complete public key blob; trailing bytes are rejected
pub fn parse_public_key(blob: &[u8]) -> Result<[u8; PUBLIC_KEY_SIZE], KeyError> {
    parse_exact(blob, &[], |buf| read_public_key(buf))
}

/// Parse a complete signature blob; trailing bytes are rejected
pub fn parse_signature(blob: &[u8]) -> Result<[u8; SIGNATURE_SIZE], KeyError> {
    parse_exact(blob, &[], |buf| read_signature(buf))
}
