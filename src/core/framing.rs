//! Line-and-span framing over a reliable byte stream.
//!
//! [`LineTransport`] owns the connection for the lifetime of a session and
//! provides the four primitives every depot operation is built from:
//! `send_line` / `recv_line` for control traffic and `send_exact` /
//! `recv_exact` for raw payload spans. Partial completion is never surfaced
//! as success; the first I/O failure ends the session.

use crate::config::MAX_LINE_LEN;
use crate::error::{DepotError, Result};
use bytes::{Buf, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Initial capacity of the scan buffer.
const READ_BUF_CAPACITY: usize = 8 * 1024;

/// Framed view over a byte stream (normally a `TcpStream`).
///
/// Generic over the stream so unit tests can drive it with
/// `tokio::io::duplex` instead of a real socket.
pub struct LineTransport<S> {
    stream: S,
    /// Bytes read from the stream but not yet consumed. A control-line read
    /// may pull in the start of a following raw span; `recv_exact` drains
    /// this buffer before touching the stream again.
    buf: BytesMut,
    max_line: usize,
}

impl<S> LineTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S) -> Self {
        Self::with_max_line(stream, MAX_LINE_LEN)
    }

    /// Override the control-line cap (mainly for tests).
    pub fn with_max_line(stream: S, max_line: usize) -> Self {
        Self {
            stream,
            buf: BytesMut::with_capacity(READ_BUF_CAPACITY),
            max_line,
        }
    }

    /// Write one control line, appending the terminator. All bytes reach
    /// the stream or the call fails.
    pub async fn send_line(&mut self, text: &str) -> Result<()> {
        self.stream.write_all(text.as_bytes()).await?;
        self.stream.write_all(b"\n").await?;
        self.stream.flush().await?;
        Ok(())
    }

    /// Read one control line, excluding the terminator.
    ///
    /// Returns `ConnectionClosed` if the stream ends before a terminator
    /// arrives. A line longer than the cap is drained up to its terminator
    /// and reported as `LineTooLong`, leaving the stream in sync so the
    /// caller can answer with an error marker and continue.
    pub async fn recv_line(&mut self) -> Result<String> {
        loop {
            if let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
                if pos > self.max_line {
                    self.buf.advance(pos + 1);
                    return Err(DepotError::LineTooLong(self.max_line));
                }
                let line = self.buf.split_to(pos + 1);
                let text = std::str::from_utf8(&line[..pos])
                    .map_err(|_| DepotError::Protocol("control line is not valid UTF-8".into()))?;
                return Ok(text.to_string());
            }

            if self.buf.len() > self.max_line {
                self.drain_to_terminator().await?;
                return Err(DepotError::LineTooLong(self.max_line));
            }

            let n = self.stream.read_buf(&mut self.buf).await?;
            if n == 0 {
                return Err(DepotError::ConnectionClosed);
            }
        }
    }

    /// Write a raw span. All bytes reach the stream or the call fails.
    pub async fn send_exact(&mut self, bytes: &[u8]) -> Result<()> {
        self.stream.write_all(bytes).await?;
        self.stream.flush().await?;
        Ok(())
    }

    /// Read exactly `len` raw bytes.
    ///
    /// Loops until the span is complete; a stream that ends first yields
    /// `ConnectionClosed`, never a short result.
    pub async fn recv_exact(&mut self, len: usize) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(len);

        // Drain whatever the line scanner already pulled in.
        let buffered = len.min(self.buf.len());
        if buffered > 0 {
            out.extend_from_slice(&self.buf[..buffered]);
            self.buf.advance(buffered);
        }

        while out.len() < len {
            let mut chunk = [0u8; READ_BUF_CAPACITY];
            let want = (len - out.len()).min(chunk.len());
            let n = self.stream.read(&mut chunk[..want]).await?;
            if n == 0 {
                return Err(DepotError::ConnectionClosed);
            }
            out.extend_from_slice(&chunk[..n]);
        }

        Ok(out)
    }

    /// Discard stream bytes until a terminator has been consumed. Used to
    /// resynchronize after an overlong control line.
    async fn drain_to_terminator(&mut self) -> Result<()> {
        loop {
            if let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
                self.buf.advance(pos + 1);
                return Ok(());
            }
            self.buf.clear();

            let n = self.stream.read_buf(&mut self.buf).await?;
            if n == 0 {
                return Err(DepotError::ConnectionClosed);
            }
        }
    }
}
