//! # depot-protocol
//!
//! Authenticated file depot over a plain TCP line protocol: clients list,
//! download, and upload files against a shared repository; uploads sit in
//! a per-user quarantine until a human operator approves publication.
//!
//! ## Architecture
//! - [`core`]: line-and-span framing over the byte stream
//! - [`protocol`]: the per-connection session state machine and command
//!   handlers
//! - [`storage`]: the repository / quarantine layout and the operator
//!   approval gate
//! - [`service`]: the listening server and a programmatic client
//! - [`auth`], [`config`], [`error`], [`logging`]: the usual supporting
//!   cast
//!
//! ## Example
//! ```no_run
//! use depot_protocol::config::DepotConfig;
//! use depot_protocol::service::DepotServer;
//! use depot_protocol::storage::{ApprovalGate, Decision};
//!
//! #[tokio::main]
//! async fn main() -> depot_protocol::error::Result<()> {
//!     let config = DepotConfig::default();
//!     let gate = ApprovalGate::auto(Decision::Denied);
//!     DepotServer::bind(&config, gate).await?.run().await
//! }
//! ```
//!
//! ## Trust model
//! The protocol is plaintext with a static credential table; there is no
//! encryption in transit and no integrity verification. Filenames are
//! scope-checked to their directory but otherwise taken verbatim.

pub mod auth;
pub mod config;
pub mod core;
pub mod error;
pub mod logging;
pub mod protocol;
pub mod service;
pub mod storage;

pub use config::DepotConfig;
pub use error::{DepotError, Result};
pub use service::{DepotClient, DepotServer};
pub use storage::{ApprovalGate, ApprovalRequest, Decision};
