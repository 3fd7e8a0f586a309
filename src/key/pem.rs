//! Minimal PEM armor (RFC 7468 textual encoding)
//!
//! Only the first block in the input is considered. Text before the
//! `-----BEGIN` line is ignored, as are blank lines inside the body.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use super::KeyError;

const BEGIN: &str = "-----BEGIN ";
const END: &str = "-----END ";
const DASHES: &str = "-----";
const LINE_WIDTH: usize = 64;

/// A decoded PEM block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PemBlock {
    pub label: String,
    pub contents: Vec<u8>,
}

/// Strip `prefix` and the closing dashes from a boundary line
fn boundary_label<'a>(line: &'a str, prefix: &str) -> Option<&'a str> {
    line.trim_end()
        .strip_prefix(prefix)?
        .strip_suffix(DASHES)
}

/// Decode the first PEM block found in `input`
pub fn decode(input: &[u8]) -> Result<PemBlock, KeyError> {
    let text = std::str::from_utf8(input).map_err(|_| KeyError::NotPem)?;
    let mut lines = text.lines();

    let label = lines
        .by_ref()
        .find_map(|line| boundary_label(line, BEGIN))
        .ok_or(KeyError::NotPem)?;

    let mut body = String::new();
    let mut terminated = false;
    for line in lines {
        if let Some(end_label) = boundary_label(line, END) {
            if end_label != label {
                return Err(KeyError::NotPem);
            }
            terminated = true;
            break;
        }
        body.push_str(line.trim());
    }
    if !terminated {
        return Err(KeyError::NotPem);
    }

    let contents = STANDARD.decode(body).map_err(|_| KeyError::NotPem)?;
    Ok(PemBlock {
        label: label.to_string(),
        contents,
    })
}

/// Encode `contents` as a PEM block with 64 column body lines
pub fn encode(label: &str, contents: &[u8]) -> String {
    let body = STANDARD.encode(contents);
    let mut out = String::with_capacity(body.len() + body.len() / LINE_WIDTH + 2 * label.len() + 40);
    out.push_str(BEGIN);
    out.push_str(label);
    out.push_str(DASHES);
    out.push('\n');
    // base64 output is ASCII, so byte chunks are valid UTF-8
    for chunk in body.as_bytes().chunks(LINE_WIDTH) {
        out.push_str(&String::from_utf8_lossy(chunk));
        out.push('\n');
    }
    out.push_str(END);
    out.push_str(label);
    out.push_str(DASHES);
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_wraps_lines() {
        let pem = encode("TEST", &[0u8; 60]);
        let lines: Vec<&str> = pem.lines().collect();
        assert_eq!(lines[0], "-----BEGIN TEST-----");
        assert_eq!(lines[1].len(), 64);
        assert_eq!(lines[2].len(), 16);
        assert_eq!(lines[3], "-----END TEST-----");
        assert!(pem.ends_with('\n'));
    }

    #[test]
    fn test_decode_roundtrip() {
        let contents: Vec<u8> = (0..=255).collect();
        let block = decode(encode("SOME LABEL", &contents).as_bytes()).unwrap();
        assert_eq!(block.label, "SOME LABEL");
        assert_eq!(block.contents, contents);
    }

    #[test]
    fn test_decode_skips_leading_text() {
        let input = "comment line\n-----BEGIN X-----\nAAEC\n-----END X-----\ntrailer\n";
        let block = decode(input.as_bytes()).unwrap();
        assert_eq!(block.label, "X");
        assert_eq!(block.contents, vec![0, 1, 2]);
    }

    #[test]
    fn test_decode_crlf() {
        let input = "-----BEGIN X-----\r\nAAEC\r\n-----END X-----\r\n";
        assert_eq!(decode(input.as_bytes()).unwrap().contents, vec![0, 1, 2]);
    }

    #[test]
    fn test_decode_rejects_non_pem() {
        assert!(matches!(decode(b"hello world"), Err(KeyError::NotPem)));
        assert!(matches!(
            decode(b"-----BEGIN X-----\nAAEC\n"),
            Err(KeyError::NotPem)
        ));
        assert!(matches!(
            decode(b"-----BEGIN X-----\nAAEC\n-----END Y-----\n"),
            Err(KeyError::NotPem)
        ));
        assert!(matches!(
            decode(b"-----BEGIN X-----\n!!!!\n-----END X-----\n"),
            Err(KeyError::NotPem)
        ));
    }
}
