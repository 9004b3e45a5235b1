//! Unlock evaluation.
//!
//! # Responsibility
//! - Decide which echoes are playable at a given instant.
//! - Select the echoes whose unlock still needs to be acknowledged.
//!
//! # Invariants
//! - Eligibility is always recomputed from `unlock_at`; stored flags are
//!   never trusted for lock state.
//! - Functions here are pure: no I/O, no clock reads.

pub mod evaluator;
