//! # Error Types
//!
//! Error handling for the depot protocol.
//!
//! This module defines all error variants that can occur during a session,
//! from low-level I/O failures to protocol violations.
//!
//! ## Error Categories
//! - **Connection errors**: the peer closed or became unreachable; always
//!   fatal to the session, never retried.
//! - **Protocol errors**: malformed size declarations, overlong lines,
//!   unexpected line shapes; abort the current operation only.
//! - **Auth errors**: invalid credentials; fatal to the session, reported
//!   once, no retry within the same connection.
//! - **Storage errors**: missing files, unwritable destinations, failed
//!   publish moves; reported to the peer, never fatal to the session.
//!
//! All errors implement `std::error::Error` for interoperability.

use std::io;
use thiserror::Error;

/// Primary error type for all depot operations.
#[derive(Error, Debug)]
pub enum DepotError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Connection closed by peer")]
    ConnectionClosed,

    #[error("Control line exceeds maximum length ({0} bytes)")]
    LineTooLong(usize),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Authentication failed")]
    AuthFailed,

    #[error("Invalid filename: {0:?}")]
    InvalidName(String),

    #[error("Declared upload size {0} exceeds the configured limit")]
    OversizedUpload(u64),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Operator approval channel is closed")]
    ApprovalUnavailable,

    #[error("Configuration error: {0}")]
    Config(String),
}

impl DepotError {
    /// Whether this error ends the session outright.
    ///
    /// Connection loss and a failed authentication tear the session down;
    /// everything else aborts at most the current operation.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            DepotError::Io(_) | DepotError::ConnectionClosed | DepotError::AuthFailed
        )
    }
}

/// Type alias for Results using DepotError
pub type Result<T> = std::result::Result<T, DepotError>;
