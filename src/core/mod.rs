//! # Core Wire Components
//!
//! Low-level framing over a byte stream.
//!
//! The depot wire format interleaves two shapes on one connection: UTF-8
//! control lines terminated by a single `\n`, and raw byte spans whose
//! length is announced out-of-band by a control line. Both are handled by
//! [`framing::LineTransport`], which guarantees all-bytes-or-failure
//! delivery in both directions.
//!
//! ## Security
//! - Control lines are capped at [`crate::config::MAX_LINE_LEN`] bytes
//!   (prevents memory exhaustion from a peer that never sends a terminator)
//! - Length validation happens before any payload allocation

pub mod framing;
