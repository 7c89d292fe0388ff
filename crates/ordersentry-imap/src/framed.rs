//! Framed I/O for the IMAP protocol.
//!
//! IMAP responses are CRLF-terminated lines, optionally carrying literals in
//! the form `{n}\r\n` followed by exactly `n` raw bytes. A reply as returned
//! by [`Transport::read_reply`] is one line plus all of its embedded literals
//! and their continuation lines, concatenated.

use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::{Error, Result};

/// Initial capacity of the read buffer.
const READ_BUFFER_SIZE: usize = 8 * 1024;

/// Upper bound on a single reply, literals included. A scan cycle only ever
/// fetches capped header and text sections, so anything larger is a protocol
/// violation rather than real mail data.
const MAX_REPLY_SIZE: usize = 16 * 1024 * 1024;

/// Buffered reader/writer that reassembles complete IMAP replies.
pub(crate) struct Transport<S> {
    stream: S,
    buffer: BytesMut,
}

impl<S> Transport<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub(crate) fn new(stream: S) -> Self {
        Self {
            stream,
            buffer: BytesMut::with_capacity(READ_BUFFER_SIZE),
        }
    }

    /// Reads one complete reply: a CRLF line plus any embedded literals.
    pub(crate) async fn read_reply(&mut self) -> Result<Vec<u8>> {
        let mut reply = Vec::new();

        loop {
            let line = self.read_line().await?;
            reply.extend_from_slice(&line);

            match literal_length(&line) {
                Some(len) => {
                    if reply.len() + len > MAX_REPLY_SIZE {
                        return Err(Error::Protocol(format!(
                            "literal of {len} bytes exceeds reply limit"
                        )));
                    }
                    let literal = self.read_exact(len).await?;
                    reply.extend_from_slice(&literal);
                    // The line after a literal continues the same reply.
                }
                None => return Ok(reply),
            }
        }
    }

    /// Writes a complete command line and flushes it.
    pub(crate) async fn send(&mut self, line: &[u8]) -> Result<()> {
        self.stream.write_all(line).await?;
        self.stream.flush().await?;
        Ok(())
    }

    /// Reads until CRLF, returning the line including the terminator.
    async fn read_line(&mut self) -> Result<Vec<u8>> {
        loop {
            if let Some(pos) = find_crlf(&self.buffer) {
                let line = self.buffer.split_to(pos + 2);
                return Ok(line.to_vec());
            }

            if self.buffer.len() > MAX_REPLY_SIZE {
                return Err(Error::Protocol("response line too long".to_string()));
            }

            self.fill().await?;
        }
    }

    /// Reads exactly `len` bytes of literal data.
    async fn read_exact(&mut self, len: usize) -> Result<Vec<u8>> {
        while self.buffer.len() < len {
            self.fill().await?;
        }
        Ok(self.buffer.split_to(len).to_vec())
    }

    async fn fill(&mut self) -> Result<()> {
        let n = self.stream.read_buf(&mut self.buffer).await?;
        if n == 0 {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "connection closed by server",
            )));
        }
        Ok(())
    }
}

/// Finds the position of the first CRLF in a buffer.
fn find_crlf(buf: &[u8]) -> Option<usize> {
    buf.windows(2).position(|w| w == b"\r\n")
}

/// Parses a trailing literal announcement, `{n}\r\n` or `{n+}\r\n`.
fn literal_length(line: &[u8]) -> Option<usize> {
    let line = line.strip_suffix(b"\r\n")?;

    let body = line
        .strip_suffix(b"+}")
        .or_else(|| line.strip_suffix(b"}"))?;
    let open = body.iter().rposition(|&b| b == b'{')?;

    let digits = std::str::from_utf8(&body[open + 1..]).ok()?;
    if digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}
