//! Listener and accept loop.
//!
//! One spawned task per accepted connection, nothing shared between them
//! but the filesystem and the approval gate. Supports graceful shutdown:
//! on signal, the listener stops accepting and waits for live sessions to
//! drain, up to the configured timeout.

use crate::auth::StaticCredentials;
use crate::config::DepotConfig;
use crate::error::Result;
use crate::protocol::session::{Session, SessionContext};
use crate::storage::{ApprovalGate, Repository};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::{mpsc, Mutex};
use tracing::{error, info, warn};

/// A bound depot server, ready to accept connections.
pub struct DepotServer {
    listener: TcpListener,
    ctx: SessionContext,
    shutdown_timeout: Duration,
}

impl DepotServer {
    /// Ensure the on-disk layout, build the session context from the
    /// configuration, and bind the listening socket.
    pub async fn bind(config: &DepotConfig, gate: ApprovalGate) -> Result<Self> {
        let repository = Repository::new(&config.storage);
        repository.ensure_layout().await?;

        let ctx = SessionContext {
            repository,
            gate,
            credentials: Arc::new(StaticCredentials::from(&config.auth)),
            max_upload_bytes: config.storage.max_upload_bytes,
        };

        let listener = TcpListener::bind(&config.server.address).await?;
        info!(address = %config.server.address, "depot server listening");

        Ok(Self {
            listener,
            ctx,
            shutdown_timeout: config.server.shutdown_timeout,
        })
    }

    /// The actual bound address (useful when the port was 0).
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Run until ctrl-c.
    pub async fn run(self) -> Result<()> {
        // Internal shutdown channel fed by the ctrl-c handler.
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>(1);

        tokio::spawn(async move {
            if let Ok(()) = tokio::signal::ctrl_c().await {
                info!("received CTRL+C signal, shutting down");
                let _ = shutdown_tx.send(()).await;
            }
        });

        self.run_with_shutdown(shutdown_rx).await
    }

    /// Run until a message arrives on the external shutdown channel.
    pub async fn run_with_shutdown(self, mut shutdown_rx: mpsc::Receiver<()>) -> Result<()> {
        // Track active connections
        let active_connections = Arc::new(Mutex::new(0u32));

        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => {
                    info!("shutting down server, waiting for connections to close");

                    let timeout = tokio::time::sleep(self.shutdown_timeout);
                    tokio::pin!(timeout);

                    loop {
                        tokio::select! {
                            _ = &mut timeout => {
                                warn!("shutdown timeout reached, forcing exit");
                                break;
                            }
                            _ = tokio::time::sleep(Duration::from_millis(100)) => {
                                let connections = *active_connections.lock().await;
                                if connections == 0 {
                                    info!("all connections closed, shutting down");
                                    break;
                                }
                                info!(connections, "waiting for connections to close");
                            }
                        }
                    }

                    return Ok(());
                }

                accept_result = self.listener.accept() => {
                    match accept_result {
                        Ok((stream, peer)) => {
                            info!(%peer, "new connection");
                            let ctx = self.ctx.clone();
                            let active_connections = active_connections.clone();

                            {
                                let mut count = active_connections.lock().await;
                                *count += 1;
                            }

                            tokio::spawn(async move {
                                let mut session = Session::new(stream, ctx);
                                match session.run().await {
                                    Ok(()) => info!(%peer, user = session.user(), "session ended"),
                                    Err(e) => warn!(%peer, user = session.user(), error = %e, "session aborted"),
                                }

                                let mut count = active_connections.lock().await;
                                *count -= 1;
                            });
                        }
                        Err(e) => {
                            error!(error = %e, "error accepting connection");
                        }
                    }
                }
            }
        }
    }
}
