//! Operator approval gate.
//!
//! Publish requests are decided by a human operator outside the session.
//! Rather than sessions contending for one console, each request travels
//! as a message: the session sends an [`ApprovalRequest`] through the gate
//! and awaits the reply on its own oneshot channel. Only the requesting
//! session blocks; every other session keeps running.

use crate::error::{DepotError, Result};
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

/// The operator's verdict. Denial is a normal outcome, not an error; the
/// quarantined file stays in place and may be re-requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Approved,
    Denied,
}

/// One pending publish decision, delivered to the operator task.
#[derive(Debug)]
pub struct ApprovalRequest {
    user: String,
    filename: String,
    reply: oneshot::Sender<Decision>,
}

impl ApprovalRequest {
    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Deliver the verdict to the waiting session. If the session is gone
    /// (peer disconnected while blocked), the verdict is dropped.
    pub fn respond(self, decision: Decision) {
        let _ = self.reply.send(decision);
    }
}

/// Session-side handle to the operator. Cheap to clone; one per session.
#[derive(Debug, Clone)]
pub struct ApprovalGate {
    tx: mpsc::Sender<ApprovalRequest>,
}

impl ApprovalGate {
    /// Create a gate and the receiving end for an operator task.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<ApprovalRequest>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }

    /// A gate whose operator answers every request with a fixed verdict.
    /// Intended for tests and unattended setups.
    pub fn auto(decision: Decision) -> Self {
        let (gate, mut rx) = Self::channel(16);
        tokio::spawn(async move {
            while let Some(req) = rx.recv().await {
                debug!(user = req.user(), file = req.filename(), ?decision, "auto-deciding");
                req.respond(decision);
            }
        });
        gate
    }

    /// Surface one publish request and block until the operator answers.
    ///
    /// There is no timeout: an operator who never answers wedges this
    /// session and no other. A closed operator channel yields
    /// `ApprovalUnavailable`.
    pub async fn decide(&self, user: &str, filename: &str) -> Result<Decision> {
        let (reply, verdict) = oneshot::channel();
        let request = ApprovalRequest {
            user: user.to_string(),
            filename: filename.to_string(),
            reply,
        };

        self.tx
            .send(request)
            .await
            .map_err(|_| DepotError::ApprovalUnavailable)?;

        verdict.await.map_err(|_| DepotError::ApprovalUnavailable)
    }
}
