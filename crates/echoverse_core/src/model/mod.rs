//! Domain model for echoes and per-owner unlock settings.
//!
//! # Responsibility
//! - Define canonical data structures used by the unlock and notification logic.
//! - Keep derived state (`unlocked`) out of the stored shape.
//!
//! # Invariants
//! - Every echo is identified by a stable, non-nil `EchoId`.
//! - `unlock_at` never moves after creation.

pub mod echo;
pub mod preferences;
