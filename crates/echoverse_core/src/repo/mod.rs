//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the echo store contract the unlock logic depends on.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Write paths enforce `Echo::validate()` before persistence.
//! - The store never marks a locked echo as notified.

pub mod echo_repo;
pub mod preferences_repo;
