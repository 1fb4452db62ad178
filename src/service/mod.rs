//! # Connection Endpoints
//!
//! The listening server and a programmatic client.
//!
//! The server is accept-and-dispatch only: every accepted connection gets
//! its own spawned task running one [`crate::protocol::session::Session`]
//! to completion. The client drives the same wire protocol from the other
//! side and backs both the interactive binary and the integration tests.

pub mod client;
pub mod server;

pub use client::DepotClient;
pub use server::DepotServer;
