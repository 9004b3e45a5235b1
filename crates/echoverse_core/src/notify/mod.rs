//! One-time unlock notification.
//!
//! # Responsibility
//! - Surface at most one user-facing alert per dispatch pass.
//! - Persist acknowledgment for every echo covered by the pass.
//!
//! # Invariants
//! - Alert emission happens before persistence, so a failed write leaves
//!   the echo eligible for the next pass.
//! - A pass over already-acknowledged echoes is a no-op.

pub mod alert;
pub mod dispatcher;
