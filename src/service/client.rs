//! Programmatic client for the depot wire protocol.
//!
//! Drives the same exchanges the server expects, one command at a time.
//! Used by the interactive `depot` binary and by the integration tests.

use crate::config::TRANSFER_CHUNK;
use crate::core::framing::LineTransport;
use crate::error::{DepotError, Result};
use crate::protocol::command::wire;
use tokio::net::{TcpStream, ToSocketAddrs};
use tracing::debug;

/// One authenticated connection to a depot server.
pub struct DepotClient {
    transport: LineTransport<TcpStream>,
}

impl DepotClient {
    /// Connect without authenticating; the server's username prompt is
    /// consumed by [`login`](Self::login).
    pub async fn connect<A: ToSocketAddrs>(addr: A) -> Result<Self> {
        let stream = TcpStream::connect(addr).await?;
        Ok(Self {
            transport: LineTransport::new(stream),
        })
    }

    /// Run the credential exchange. A failed login means the server has
    /// already closed the connection; this client is then useless.
    pub async fn login(&mut self, user: &str, pass: &str) -> Result<()> {
        self.expect_line(wire::USERNAME_PROMPT).await?;
        self.transport.send_line(user).await?;
        self.expect_line(wire::PASSWORD_PROMPT).await?;
        self.transport.send_line(pass).await?;

        match self.transport.recv_line().await?.as_str() {
            wire::AUTH_OK => {
                debug!(user, "logged in");
                Ok(())
            }
            _ => Err(DepotError::AuthFailed),
        }
    }

    /// Fetch the published entry names, in server order.
    pub async fn list(&mut self) -> Result<Vec<String>> {
        self.transport.send_line("LIST").await?;

        let mut names = Vec::new();
        loop {
            let line = self.transport.recv_line().await?;
            if line == wire::END_OF_LIST {
                return Ok(names);
            }
            if line == wire::ERR {
                return Err(DepotError::Storage("server could not list".into()));
            }
            names.push(line);
        }
    }

    /// Download one published entry.
    pub async fn get(&mut self, name: &str) -> Result<Vec<u8>> {
        self.transport.send_line(&format!("GET {name}")).await?;

        let header = self.transport.recv_line().await?;
        let size: u64 = header
            .strip_prefix(wire::OK_PREFIX)
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| DepotError::Storage(format!("server refused GET: {header}")))?;

        let mut content = Vec::with_capacity(size as usize);
        let mut remaining = size;
        while remaining > 0 {
            let chunk = remaining.min(TRANSFER_CHUNK as u64) as usize;
            content.extend_from_slice(&self.transport.recv_exact(chunk).await?);
            remaining -= chunk as u64;
        }
        Ok(content)
    }

    /// Upload into the caller's quarantine area. Returns the server's
    /// final response line (the pending-approval marker on success).
    pub async fn put(&mut self, name: &str, content: &[u8]) -> Result<String> {
        self.transport.send_line(&format!("PUT {name}")).await?;

        let reply = self.transport.recv_line().await?;
        if reply != wire::READY {
            return Err(DepotError::Protocol(format!(
                "server refused PUT: {reply}"
            )));
        }

        self.transport
            .send_line(&format!("{}{}", wire::SIZE_PREFIX, content.len()))
            .await?;

        for chunk in content.chunks(TRANSFER_CHUNK) {
            self.transport.send_exact(chunk).await?;
        }

        self.transport.recv_line().await
    }

    /// Ask the operator to publish a quarantined upload. Returns the
    /// verdict line: `APPROVED`, `DENIED`, or an error marker.
    pub async fn request_publish(&mut self, name: &str) -> Result<String> {
        self.transport
            .send_line(&format!("REQUEST {name}"))
            .await?;
        self.transport.recv_line().await
    }

    /// End the session. The server closes the connection without a reply.
    pub async fn exit(mut self) -> Result<()> {
        self.transport.send_line("EXIT").await
    }

    /// Send a raw control line; test hook for protocol-violation cases.
    pub async fn send_raw_line(&mut self, line: &str) -> Result<()> {
        self.transport.send_line(line).await
    }

    /// Receive a raw control line; test hook.
    pub async fn recv_raw_line(&mut self) -> Result<String> {
        self.transport.recv_line().await
    }

    async fn expect_line(&mut self, expected: &str) -> Result<()> {
        let line = self.transport.recv_line().await?;
        if line == expected {
            Ok(())
        } else {
            Err(DepotError::Protocol(format!(
                "expected {expected:?}, server sent {line:?}"
            )))
        }
    }
}
