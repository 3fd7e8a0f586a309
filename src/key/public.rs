//! Single-line public key format, as found in `.pub` and `authorized_keys` files

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use super::KeyError;
use super::ed25519::{self, KEY_TYPE, PUBLIC_KEY_SIZE};

fn is_separator(b: &u8) -> bool {
    *b == b' ' || *b == b'\t'
}

fn trim_separators(mut s: &[u8]) -> &[u8] {
    while let [first, rest @ ..] = s {
        if !is_separator(first) {
            break;
        }
        s = rest;
    }
    while let [rest @ .., last] = s {
        if !is_separator(last) {
            break;
        }
        s = rest;
    }
    s
}

/// Split a line into key type, base64 blob and optional comment
fn split_line(line: &[u8]) -> Result<(&[u8], &[u8], &[u8]), KeyError> {
    let line = match line.iter().position(|&b| b == b'\n') {
        Some(eol) if eol + 1 != line.len() => {
            return Err(KeyError::InvalidPublicKeyLine(
                "multiple lines in public key".into(),
            ));
        }
        Some(eol) => &line[..eol],
        None => line,
    };

    let type_end = line
        .iter()
        .position(is_separator)
        .ok_or_else(|| KeyError::InvalidPublicKeyLine("missing key data".into()))?;
    let key_type = &line[..type_end];
    let rest = trim_separators(&line[type_end + 1..]);

    match rest.iter().position(is_separator) {
        Some(blob_end) => Ok((
            key_type,
            &rest[..blob_end],
            trim_separators(&rest[blob_end + 1..]),
        )),
        None => Ok((key_type, rest, &[][..])),
    }
}

/// Parse `ssh-ed25519 <base64 blob> [comment]`
///
/// Returns the raw public key and the comment, which is empty when absent.
pub fn parse_public_key_line(line: &[u8]) -> Result<([u8; PUBLIC_KEY_SIZE], String), KeyError> {
    let (key_type, blob, comment) = split_line(line)?;
    if key_type != KEY_TYPE.as_bytes() {
        return Err(KeyError::UnsupportedKeyType(
            String::from_utf8_lossy(key_type).into_owned(),
        ));
    }
    let blob = STANDARD
        .decode(blob)
        .map_err(|e| KeyError::InvalidPublicKeyLine(e.to_string()))?;
    let public = ed25519::parse_public_key(&blob)?;
    Ok((public, String::from_utf8_lossy(comment).into_owned()))
}

/// Format a public key line; the comment is omitted when empty
pub fn format_public_key_line(public: &[u8; PUBLIC_KEY_SIZE], comment: &str) -> String {
    let blob = STANDARD.encode(ed25519::serialize_public_key(public));
    if comment.is_empty() {
        format!("{KEY_TYPE} {blob}")
    } else {
        format!("{KEY_TYPE} {blob} {comment}")
    }
}
