//! # Session Protocol
//!
//! The per-connection state machine and everything it dispatches to.
//!
//! A connection moves through authentication into a command loop, one
//! command at a time, until EXIT or disconnect. Control traffic is text
//! lines; GET and PUT payloads are raw byte spans announced by a size
//! line. See [`command::wire`] for the exact markers.
//!
//! ## Components
//! - **Command**: parsing of the five accepted verbs
//! - **Session**: the state machine (auth handshake + command loop)
//! - **ops**: the per-command handlers (LIST, GET, PUT, REQUEST)

pub mod command;
pub mod ops;
pub mod session;
