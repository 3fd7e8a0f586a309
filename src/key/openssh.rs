//! OpenSSH `openssh-key-v1` private key container
//!
//! Binary layout of an unencrypted single-key file, inside PEM armor tagged
//! `OPENSSH PRIVATE KEY`:
//!
//! ```text
//! "openssh-key-v1\0"
//! string("none")          cipher
//! string("none")          kdf
//! u32(0)                  kdf options
//! u32(1)                  number of keys
//! string(public key blob)
//! string(private section)
//!     u32 nonce, u32 nonce (equal)
//!     public key blob (again)
//!     string(32-byte secret || 32-byte public)
//!     string(comment)
//!     padding 1, 2, 3, ... up to a multiple of 8
//! ```

use bytes::{Buf, BufMut, Bytes, BytesMut};
use std::fs::OpenOptions;
use std::io::Write;
use std::os::unix::fs::OpenOptionsExt;
use std::path::Path;

use super::ed25519::{self, PUBLIC_KEY_SIZE};
use super::{KeyError, KeyPair, pem};
use crate::protocol::wire::{
    parse_exact, put_string, read_bytes, read_skip, read_string, read_u32, serialize_u32,
};

/// PEM label of OpenSSH private key files
pub const PEM_TAG: &str = "OPENSSH PRIVATE KEY";

const AUTH_MAGIC: &[u8] = b"openssh-key-v1\0";
const CIPHER_NONE: &str = "none";
const KDF_NONE: &str = "none";

/// Padding allowed after the comment in the private section
const PADDING: [u8; 7] = [1, 2, 3, 4, 5, 6, 7];

const MAX_PUBLIC_BLOB_SIZE: usize = 100;
const MAX_PRIVATE_SECTION_SIZE: usize = 1000;
const KEY_PAIR_SIZE: usize = 64;
const MAX_COMMENT_SIZE: usize = 100;

/// Fixed bytes at the start of every supported container
fn container_prefix() -> Bytes {
    let mut buf = BytesMut::new();
    buf.put_slice(AUTH_MAGIC);
    put_string(&mut buf, CIPHER_NONE);
    put_string(&mut buf, KDF_NONE);
    buf.put_slice(&serialize_u32(0));
    buf.put_slice(&serialize_u32(1));
    buf.freeze()
}

/// Decode the private section; `public_blob` is the outer copy of the key
fn read_private_section<B: Buf>(buf: &mut B, public_blob: &[u8]) -> Result<KeyPair, KeyError> {
    let public = ed25519::parse_public_key(public_blob)?;

    let check1 = read_u32(buf)?;
    let check2 = read_u32(buf)?;
    if check1 != check2 {
        return Err(KeyError::NonceMismatch);
    }

    read_skip(buf, public_blob).map_err(|_| KeyError::InconsistentPublicKey)?;

    let keys = read_string(buf, KEY_PAIR_SIZE).map_err(KeyError::MissingPrivateKey)?;
    if keys.len() != KEY_PAIR_SIZE {
        return Err(KeyError::PrivateKeySize(keys.len()));
    }
    if keys[PUBLIC_KEY_SIZE..] != public {
        return Err(KeyError::InconsistentPublicKey);
    }

    read_string(buf, MAX_COMMENT_SIZE).map_err(|_| KeyError::MissingComment)?;

    let mut secret = [0u8; 32];
    secret.copy_from_slice(&keys[..PUBLIC_KEY_SIZE]);
    Ok(KeyPair::from_parts(secret, public))
}

fn read_container<B: Buf>(buf: &mut B) -> Result<KeyPair, KeyError> {
    read_skip(buf, &container_prefix()).map_err(KeyError::UnsupportedContainer)?;
    let public_blob =
        read_string(buf, MAX_PUBLIC_BLOB_SIZE).map_err(KeyError::MissingPublicKey)?;
    let private = read_string(buf, MAX_PRIVATE_SECTION_SIZE).map_err(KeyError::PrivateSection)?;
    if private.len() % 8 != 0 {
        return Err(KeyError::BadLength(private.len()));
    }

    parse_exact(&private, &PADDING, |inner| {
        read_private_section(inner, &public_blob)
    })
}

/// Parse the binary container, after PEM decoding
pub fn parse_private_key_blob(blob: &[u8]) -> Result<KeyPair, KeyError> {
    parse_exact(blob, &[], |buf| read_container(buf))
}

/// Parse a PEM encoded OpenSSH private key file
pub fn parse_private_key_file(ascii: &[u8]) -> Result<KeyPair, KeyError> {
    let block = pem::decode(ascii)?;
    if block.label != PEM_TAG {
        return Err(KeyError::PemTag(block.label));
    }
    parse_private_key_blob(&block.contents)
}

/// Build the binary container with an empty comment
pub fn serialize_private_key_blob(
    secret: &[u8; 32],
    public: &[u8; PUBLIC_KEY_SIZE],
    nonce: [u8; 4],
) -> Bytes {
    let public_blob = ed25519::serialize_public_key(public);

    let mut private = BytesMut::new();
    private.put_slice(&nonce);
    private.put_slice(&nonce);
    private.put_slice(&public_blob);
    private.put_u32(KEY_PAIR_SIZE as u32);
    private.put_slice(secret);
    private.put_slice(public);
    put_string(&mut private, "");
    let mut pad = 1u8;
    while private.len() % 8 != 0 {
        private.put_u8(pad);
        pad += 1;
    }

    let mut buf = BytesMut::new();
    buf.put_slice(&container_prefix());
    put_string(&mut buf, &public_blob);
    put_string(&mut buf, &private);
    buf.freeze()
}

/// Serialize a key pair as a PEM encoded OpenSSH private key file
pub fn serialize_private_key_file(
    secret: &[u8; 32],
    public: &[u8; PUBLIC_KEY_SIZE],
    nonce: [u8; 4],
) -> String {
    pem::encode(PEM_TAG, &serialize_private_key_blob(secret, public, nonce))
}

/// Read and parse a private key file from disk
pub fn read_private_key_file(path: impl AsRef<Path>) -> Result<KeyPair, KeyError> {
    let path = path.as_ref();
    let ascii = std::fs::read(path).map_err(|e| KeyError::io(path, e))?;
    parse_private_key_file(&ascii)
}

/// Write `pair` to a new private key file with mode 0600
///
/// Fails if the file already exists.
pub fn write_private_key_file(path: impl AsRef<Path>, pair: &KeyPair) -> Result<(), KeyError> {
    let path = path.as_ref();
    let nonce: [u8; 4] = rand::random();
    let ascii = serialize_private_key_file(pair.secret(), pair.public(), nonce);

    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .mode(0o600)
        .open(path)
        .map_err(|e| KeyError::io(path, e))?;
    file.write_all(ascii.as_bytes())
        .map_err(|e| KeyError::io(path, e))?;
    Ok(())
}
