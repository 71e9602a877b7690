//! Message transport
//!
//! MCP over stdio frames every JSON-RPC message as one line. The
//! [`Transport`] trait keeps the server loop independent of the actual
//! byte streams so tests can drive it with in-memory buffers.

use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, Stdin, Stdout};

use crate::{Error, Result};

/// A connection carrying one JSON-RPC message per frame
#[async_trait]
pub trait Transport: Send {
    /// Prepare the transport for use
    async fn connect(&mut self) -> Result<()>;

    /// Next non-blank message, `None` once the peer closed the stream
    async fn receive(&mut self) -> Result<Option<String>>;

    async fn send(&mut self, message: &str) -> Result<()>;

    /// Flush pending output and stop accepting messages
    async fn close(&mut self) -> Result<()>;
}

/// Newline-delimited transport over any async reader/writer pair
pub struct LineTransport<R, W> {
    reader: R,
    writer: W,
    connected: bool,
}

/// The transport the binary uses
pub type StdioTransport = LineTransport<BufReader<Stdin>, Stdout>;

/// Transport bound to the process stdin/stdout
pub fn stdio() -> StdioTransport {
    LineTransport::new(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
}

impl<R, W> LineTransport<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            reader,
            writer,
            connected: false,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn into_parts(self) -> (R, W) {
        (self.reader, self.writer)
    }

    fn ensure_connected(&self) -> Result<()> {
        if self.connected {
            Ok(())
        } else {
            Err(Error::NotConnected)
        }
    }
}

#[async_trait]
impl<R, W> Transport for LineTransport<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    async fn connect(&mut self) -> Result<()> {
        self.connected = true;
        Ok(())
    }

    async fn receive(&mut self) -> Result<Option<String>> {
        self.ensure_connected()?;
        let mut line = Vec::new();
        loop {
            line.clear();
            if self.reader.read_until(b'\n', &mut line).await? == 0 {
                return Ok(None);
            }
            // Invalid UTF-8 is passed on lossily so it fails as a parse error
            let text = String::from_utf8_lossy(&line);
            let trimmed = text.trim();
            if !trimmed.is_empty() {
                return Ok(Some(trimmed.to_string()));
            }
        }
    }

    async fn send(&mut self, message: &str) -> Result<()> {
        self.ensure_connected()?;
        self.writer.write_all(message.as_bytes()).await?;
        self.writer.write_all(b"\n").await?;
        self.writer.flush().await?;
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        if !self.connected {
            return Ok(());
        }
        self.connected = false;
        self.writer.flush().await?;
        Ok(())
    }
}
