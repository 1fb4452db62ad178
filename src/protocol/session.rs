//! Per-connection session lifecycle.
//!
//! One `Session` owns one transport connection, runs the authentication
//! handshake, then loops dispatching commands until EXIT or disconnect.
//! Sessions share nothing in memory; the filesystem is the only state
//! they have in common.

use crate::auth::CredentialStore;
use crate::core::framing::LineTransport;
use crate::error::{DepotError, Result};
use crate::protocol::command::{wire, Command};
use crate::protocol::ops;
use crate::storage::{ApprovalGate, Repository};
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, info, warn};

/// Lifecycle states of a connection.
///
/// `Closed` is terminal: the transport is released and no further I/O is
/// attempted. The bound identity is immutable once `Authenticated` is
/// reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unauthenticated,
    UserPending,
    PassPending,
    Authenticated,
    Closed,
}

/// Everything a session needs besides its own connection. Built once by
/// the server and cloned per accepted connection.
#[derive(Clone)]
pub struct SessionContext {
    pub repository: Repository,
    pub gate: ApprovalGate,
    pub credentials: Arc<dyn CredentialStore>,
    pub max_upload_bytes: u64,
}

/// One live connection: transport, bound identity, lifecycle state.
pub struct Session<S> {
    transport: LineTransport<S>,
    ctx: SessionContext,
    state: SessionState,
    user: Option<String>,
}

impl<S> Session<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S, ctx: SessionContext) -> Self {
        Self {
            transport: LineTransport::new(stream),
            ctx,
            state: SessionState::Unauthenticated,
            user: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Identity bound by a successful handshake, if any.
    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    /// Drive the session to completion: handshake, then the command loop.
    ///
    /// Returns `Ok` for an orderly end (EXIT or peer disconnect between
    /// commands) and `Err` for auth failure or a mid-operation transport
    /// fault. Either way the session is `Closed` afterwards.
    pub async fn run(&mut self) -> Result<()> {
        let outcome = self.run_inner().await;
        self.state = SessionState::Closed;
        outcome
    }

    async fn run_inner(&mut self) -> Result<()> {
        self.authenticate().await?;
        self.command_loop().await
    }

    /// The credential exchange. No command is dispatched before this
    /// completes; failure tears the connection down with no retry.
    async fn authenticate(&mut self) -> Result<()> {
        self.transport.send_line(wire::USERNAME_PROMPT).await?;
        self.state = SessionState::UserPending;
        let user = self.transport.recv_line().await?;

        self.transport.send_line(wire::PASSWORD_PROMPT).await?;
        self.state = SessionState::PassPending;
        let pass = self.transport.recv_line().await?;

        if !self.ctx.credentials.verify(&user, &pass) {
            warn!(user, "authentication failed");
            self.transport.send_line(wire::AUTH_FAIL).await?;
            return Err(DepotError::AuthFailed);
        }

        self.transport.send_line(wire::AUTH_OK).await?;
        info!(user, "user logged in");
        self.state = SessionState::Authenticated;
        self.user = Some(user);
        Ok(())
    }

    /// Read one command line at a time and dispatch it until EXIT or the
    /// transport goes away.
    async fn command_loop(&mut self) -> Result<()> {
        loop {
            let line = match self.transport.recv_line().await {
                Ok(line) => line,
                Err(DepotError::ConnectionClosed) => {
                    debug!(user = self.user(), "peer disconnected");
                    return Ok(());
                }
                // Overlong or non-UTF-8 line: the transport has resynced,
                // answer like any unrecognized command.
                Err(e) if !e.is_fatal() => {
                    debug!(user = self.user(), error = %e, "unreadable command line");
                    self.transport.send_line(wire::ERR_INVALID).await?;
                    continue;
                }
                Err(e) => return Err(e),
            };

            debug!(user = self.user(), command = %line, "dispatch");

            match Command::parse(&line) {
                Some(command) => {
                    if !self.execute(command).await? {
                        return Ok(());
                    }
                }
                None => self.transport.send_line(wire::ERR_INVALID).await?,
            }
        }
    }

    /// Route one parsed command to its handler. Returns `false` when the
    /// peer asked to end the session. Only reachable once authenticated;
    /// the bound identity is passed to the handlers that need it.
    async fn execute(&mut self, command: Command) -> Result<bool> {
        let user = self
            .user
            .clone()
            .ok_or_else(|| DepotError::Protocol("command dispatched before auth".into()))?;

        match command {
            Command::Exit => {
                debug!(user, "EXIT requested");
                return Ok(false);
            }
            Command::List => ops::list(&mut self.transport, &self.ctx.repository).await?,
            Command::Get(name) => {
                ops::get(&mut self.transport, &self.ctx.repository, &name).await?
            }
            Command::Put(name) => {
                ops::put(
                    &mut self.transport,
                    &self.ctx.repository,
                    &user,
                    &name,
                    self.ctx.max_upload_bytes,
                )
                .await?
            }
            Command::Request(name) => {
                ops::request(
                    &mut self.transport,
                    &self.ctx.repository,
                    &self.ctx.gate,
                    &user,
                    &name,
                )
                .await?
            }
        }
        Ok(true)
    }
}
