//! # Storage Components
//!
//! The filesystem side of the depot: the published repository, the
//! per-user quarantine areas, and the operator approval gate that moves
//! files between them.
//!
//! The filesystem is the only state shared between sessions. Its invariant
//! is structural: a file is either absent, quarantined under exactly one
//! user, or published.

pub mod approval;
pub mod repository;

pub use approval::{ApprovalGate, ApprovalRequest, Decision};
pub use repository::Repository;
