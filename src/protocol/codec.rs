//! SSH Agent protocol codec for tokio

use crate::error::{Error, Result};
use crate::protocol::message::AgentMessage;
use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Maximum message size (256 KiB, same as the OpenSSH agent)
pub const MAX_MESSAGE_SIZE: u32 = 256 * 1024;

/// Codec for reading and writing SSH agent messages
pub struct AgentCodec;

impl AgentCodec {
    /// Read a message from an async reader
    ///
    /// Returns `Ok(None)` when the peer closes the stream cleanly between
    /// messages. End of stream anywhere inside a message is an error.
    pub async fn read<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Option<AgentMessage>> {
        // Read length prefix (4 bytes)
        let mut len_buf = [0u8; 4];
        let mut filled = 0;
        while filled < len_buf.len() {
            let n = reader.read(&mut len_buf[filled..]).await?;
            if n == 0 {
                if filled == 0 {
                    return Ok(None);
                }
                return Err(Error::Protocol(format!(
                    "truncated length prefix: got {} of 4 bytes",
                    filled
                )));
            }
            filled += n;
        }

        let len = u32::from_be_bytes(len_buf);
        if len == 0 {
            return Err(Error::Protocol("invalid empty agent message".to_string()));
        }
        if len > MAX_MESSAGE_SIZE {
            return Err(Error::Protocol(format!(
                "Message too large: {} bytes",
                len
            )));
        }

        // Read message body
        let mut buf = BytesMut::zeroed(len as usize);
        match reader.read_exact(&mut buf).await {
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                return Err(Error::Protocol(format!(
                    "truncated agent message: expected {} bytes",
                    len
                )));
            }
            Err(e) => return Err(e.into()),
        }

        let msg = AgentMessage::decode(buf.freeze())?;
        Ok(Some(msg))
    }

    /// Write a message to an async writer
    pub async fn write<W: AsyncWrite + Unpin>(writer: &mut W, msg: &AgentMessage) -> Result<()> {
        let encoded = msg.encode()?;
        writer.write_all(&encoded).await?;
        writer.flush().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::message::MessageType;
    use bytes::Bytes;

    #[tokio::test]
    async fn test_read_message() {
        let mut input: &[u8] = &[0, 0, 0, 3, 1, 2, 3, 0xff, 0xff];
        let msg = AgentCodec::read(&mut input).await.unwrap().unwrap();
        assert_eq!(msg.msg_type, MessageType::Other(1));
        assert_eq!(msg.payload.as_ref(), &[2, 3]);
        // Must not read beyond the end of the message
        assert_eq!(input, &[0xff, 0xff]);
    }

    #[tokio::test]
    async fn test_read_clean_eof() {
        let mut input: &[u8] = &[];
        assert!(AgentCodec::read(&mut input).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_read_failures() {
        let cases: [(&str, &[u8]); 3] = [
            ("trunc. length", &[0, 0, 0]),
            ("zero length", &[0, 0, 0, 0, 1]),
            ("data eof", &[0, 0, 0, 10, 1, 2, 3]),
        ];
        for (desc, data) in cases {
            let mut input = data;
            let result = AgentCodec::read(&mut input).await;
            assert!(
                matches!(result, Err(Error::Protocol(_))),
                "no error on test {:?}",
                desc
            );
        }
    }

    #[tokio::test]
    async fn test_read_truncated_at_every_boundary() {
        let full = AgentMessage::new(MessageType::SignRequest, Bytes::from_static(b"abcdefgh"))
            .encode()
            .unwrap();
        for cut in 1..full.len() {
            let mut input = &full[..cut];
            assert!(
                AgentCodec::read(&mut input).await.is_err(),
                "truncation at {} accepted",
                cut
            );
        }
        let mut input = &full[..];
        assert!(AgentCodec::read(&mut input).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_read_oversized_length() {
        let mut input: &[u8] = &[0xff, 0xff, 0xff, 0xff, 11];
        let err = AgentCodec::read(&mut input).await.unwrap_err();
        assert!(err.to_string().contains("too large"));
    }

    #[tokio::test]
    async fn test_write_message() {
        let msg = AgentMessage::new(MessageType::Other(1), Bytes::from_static(b"foo"));
        let mut out = Vec::new();
        AgentCodec::write(&mut out, &msg).await.unwrap();
        assert_eq!(out, vec![0, 0, 0, 4, 1, b'f', b'o', b'o']);
    }
}
