//! Per-command handlers for an authenticated session.
//!
//! Each handler owns one exchange on the wire. Storage and name problems
//! are answered with the command's error marker and `Ok(())` so the
//! session loop continues; only transport failures propagate, and those
//! end the session.

use crate::config::TRANSFER_CHUNK;
use crate::core::framing::LineTransport;
use crate::error::{DepotError, Result};
use crate::protocol::command::wire;
use crate::storage::{ApprovalGate, Decision, Repository};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};

/// LIST: every published entry as one line, then the end marker.
///
/// An unreadable repository yields a single `ERR` line and no entries.
pub(crate) async fn list<S>(transport: &mut LineTransport<S>, repo: &Repository) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let entries = match repo.list().await {
        Ok(entries) => entries,
        Err(e) => {
            warn!(error = %e, "LIST failed");
            return transport.send_line(wire::ERR).await;
        }
    };

    for name in &entries {
        transport.send_line(name).await?;
    }
    transport.send_line(wire::END_OF_LIST).await
}

/// GET: `OK <size>` then exactly `size` raw bytes, or a bare `ERR`.
pub(crate) async fn get<S>(
    transport: &mut LineTransport<S>,
    repo: &Repository,
    name: &str,
) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let size = match repo.entry_size(name).await {
        Ok(size) => size,
        Err(e) => {
            debug!(name, error = %e, "GET refused");
            return transport.send_line(wire::ERR).await;
        }
    };

    let mut file = match repo.open_entry(name).await {
        Ok(file) => file,
        Err(e) => {
            debug!(name, error = %e, "GET refused");
            return transport.send_line(wire::ERR).await;
        }
    };

    transport
        .send_line(&format!("{}{}", wire::OK_PREFIX, size))
        .await?;

    let mut buf = [0u8; TRANSFER_CHUNK];
    loop {
        let n = file.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        transport.send_exact(&buf[..n]).await?;
    }

    debug!(name, size, "GET served");
    Ok(())
}

/// PUT: `READY`, a `SIZE <n>` declaration, then exactly `n` raw bytes into
/// the user's quarantine area.
///
/// A malformed size line aborts the upload before anything is written. An
/// unwritable destination drains the declared payload before answering
/// `ERR cannot_open`. A peer that disconnects mid-span aborts without a
/// final response, and the partial file is removed.
pub(crate) async fn put<S>(
    transport: &mut LineTransport<S>,
    repo: &Repository,
    user: &str,
    name: &str,
    max_upload_bytes: u64,
) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    if crate::storage::repository::validate_name(name).is_err() {
        return transport.send_line(wire::ERR_BAD_NAME).await;
    }

    transport.send_line(wire::READY).await?;

    let size = match recv_size_line(transport).await {
        Ok(size) => size,
        Err(e) if e.is_fatal() => return Err(e),
        Err(_) => return transport.send_line(wire::ERR_PROTOCOL).await,
    };

    if size > max_upload_bytes {
        // The peer streams the payload right after SIZE, so refusing here
        // leaves those bytes in flight. Report and end the session rather
        // than misread them as commands.
        transport.send_line(wire::ERR_TOO_LARGE).await?;
        return Err(DepotError::OversizedUpload(size));
    }

    let (mut file, path) = match repo.create_quarantined(user, name).await {
        Ok(out) => out,
        Err(e) => {
            warn!(user, name, error = %e, "PUT cannot create destination");
            // The peer has already started streaming the declared payload;
            // swallow it so the next line read lands on a command boundary.
            drain_exact(transport, size).await?;
            return transport.send_line(wire::ERR_CANNOT_OPEN).await;
        }
    };

    let mut remaining = size;
    while remaining > 0 {
        let chunk = remaining.min(TRANSFER_CHUNK as u64) as usize;
        let bytes = match transport.recv_exact(chunk).await {
            Ok(bytes) => bytes,
            Err(e) => {
                // Peer vanished mid-upload: no final response, no partial file.
                repo.discard_partial(&path).await;
                return Err(e);
            }
        };
        if let Err(e) = file.write_all(&bytes).await {
            repo.discard_partial(&path).await;
            return Err(e.into());
        }
        remaining -= chunk as u64;
    }

    if let Err(e) = file.flush().await {
        repo.discard_partial(&path).await;
        return Err(e.into());
    }

    info!(user, name, size, "upload quarantined");
    transport.send_line(wire::UPLOAD_OK).await
}

/// REQUEST: surface the publish decision to the operator, then report
/// `APPROVED` (after the rename), `DENIED`, or an error marker.
pub(crate) async fn request<S>(
    transport: &mut LineTransport<S>,
    repo: &Repository,
    gate: &ApprovalGate,
    user: &str,
    name: &str,
) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    if crate::storage::repository::validate_name(name).is_err() {
        return transport.send_line(wire::ERR_BAD_NAME).await;
    }

    if !repo.quarantined_exists(user, name).await? {
        return transport.send_line(wire::ERR_NO_SUCH_FILE).await;
    }

    // Blocks this session only; the operator may take as long as they like.
    let decision = match gate.decide(user, name).await {
        Ok(decision) => decision,
        Err(DepotError::ApprovalUnavailable) => {
            warn!(user, name, "publish request with no operator attached");
            return transport.send_line(wire::ERR_NO_OPERATOR).await;
        }
        Err(e) => return Err(e),
    };

    match decision {
        Decision::Approved => match repo.publish(user, name).await {
            Ok(()) => {
                info!(user, name, "publish approved");
                transport.send_line(wire::APPROVED).await
            }
            Err(e) => {
                warn!(user, name, error = %e, "publish move failed");
                transport.send_line(wire::ERR_MOVE_FAILED).await
            }
        },
        Decision::Denied => {
            info!(user, name, "publish denied");
            transport.send_line(wire::DENIED).await
        }
    }
}

/// Read and discard exactly `size` raw payload bytes.
async fn drain_exact<S>(transport: &mut LineTransport<S>, size: u64) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut remaining = size;
    while remaining > 0 {
        let chunk = remaining.min(TRANSFER_CHUNK as u64) as usize;
        transport.recv_exact(chunk).await?;
        remaining -= chunk as u64;
    }
    Ok(())
}

/// Read and parse the `SIZE <n>` declaration.
async fn recv_size_line<S>(transport: &mut LineTransport<S>) -> Result<u64>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let line = transport.recv_line().await?;
    let digits = line
        .strip_prefix(wire::SIZE_PREFIX)
        .ok_or_else(|| DepotError::Protocol(format!("expected SIZE line, got {line:?}")))?;

    digits
        .parse::<u64>()
        .map_err(|_| DepotError::Protocol(format!("bad size declaration {digits:?}")))
}
