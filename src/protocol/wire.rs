//! SSH wire encoding primitives
//!
//! Integers are big-endian u32, strings are a u32 byte count followed by the
//! bytes, as described in RFC 4251 section 5. All readers operate on an
//! in-memory [`Buf`] and never read past its end; every length field is checked
//! against a caller supplied maximum before any payload is copied.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use thiserror::Error;

/// Errors produced while decoding wire data
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WireError {
    #[error("unexpected end of data: needed {needed} bytes, {remaining} remaining")]
    UnexpectedEnd { needed: usize, remaining: usize },

    #[error("length {len} exceeds max {max}")]
    FieldTooLarge { len: u32, max: usize },

    #[error("unexpected data: {0:02x?}")]
    UnexpectedData(Vec<u8>),

    #[error("trailing {0} bytes of garbage")]
    TrailingGarbage(usize),

    #[error("unexpected padding bytes: {0:02x?}")]
    UnexpectedPadding(Vec<u8>),
}

pub type WireResult<T> = std::result::Result<T, WireError>;

/// Encode a u32 in network byte order
pub fn serialize_u32(value: u32) -> [u8; 4] {
    value.to_be_bytes()
}

/// Append a length-prefixed string
///
/// # Panics
/// Panics if `s` is longer than `u32::MAX` bytes. Callers only pass key
/// material, signatures and bounded request fields.
pub fn put_string<B: BufMut>(buf: &mut B, s: impl AsRef<[u8]>) {
    let s = s.as_ref();
    let len = u32::try_from(s.len()).expect("string too large for ssh encoding");
    buf.put_u32(len);
    buf.put_slice(s);
}

/// Encode a length-prefixed string into a fresh buffer
pub fn serialize_string(s: impl AsRef<[u8]>) -> Bytes {
    let s = s.as_ref();
    let mut buf = BytesMut::with_capacity(4 + s.len());
    put_string(&mut buf, s);
    buf.freeze()
}

fn ensure_remaining<B: Buf>(buf: &B, needed: usize) -> WireResult<()> {
    if buf.remaining() < needed {
        return Err(WireError::UnexpectedEnd {
            needed,
            remaining: buf.remaining(),
        });
    }
    Ok(())
}

/// Read a big-endian u32
pub fn read_u32<B: Buf>(buf: &mut B) -> WireResult<u32> {
    ensure_remaining(buf, 4)?;
    Ok(buf.get_u32())
}

/// Read exactly `size` raw bytes
pub fn read_bytes<B: Buf>(buf: &mut B, size: usize) -> WireResult<Bytes> {
    ensure_remaining(buf, size)?;
    Ok(buf.copy_to_bytes(size))
}

/// Read a fixed-size raw field
pub fn read_array<B: Buf, const N: usize>(buf: &mut B) -> WireResult<[u8; N]> {
    ensure_remaining(buf, N)?;
    let mut out = [0u8; N];
    buf.copy_to_slice(&mut out);
    Ok(out)
}

/// Read a length-prefixed string of at most `max` bytes
///
/// The declared length is rejected before the payload is touched, so a
/// hostile length field never drives an allocation.
pub fn read_string<B: Buf>(buf: &mut B, max: usize) -> WireResult<Bytes> {
    let len = read_u32(buf)?;
    if u64::from(len) > max as u64 {
        return Err(WireError::FieldTooLarge { len, max });
    }
    read_bytes(buf, len as usize)
}

/// Consume `prefix.len()` bytes and require them to equal `prefix`
pub fn read_skip<B: Buf>(buf: &mut B, prefix: &[u8]) -> WireResult<()> {
    let data = read_bytes(buf, prefix.len())?;
    if data.as_ref() != prefix {
        return Err(WireError::UnexpectedData(data.to_vec()));
    }
    Ok(())
}

/// Run `decode` over `blob` and require that it consumes everything
///
/// Leftover bytes are accepted only when they are a prefix of `padding`. An
/// empty `padding` means the decoder must consume the whole blob.
pub fn parse_exact<T, E, F>(blob: &[u8], padding: &[u8], decode: F) -> Result<T, E>
where
    F: FnOnce(&mut &[u8]) -> Result<T, E>,
    E: From<WireError>,
{
    let mut rest = blob;
    let value = decode(&mut rest)?;
    if rest.len() > padding.len() {
        return Err(WireError::TrailingGarbage(rest.len()).into());
    }
    if rest != &padding[..rest.len()] {
        return Err(WireError::UnexpectedPadding(rest.to_vec()).into());
    }
    Ok(value)
}
