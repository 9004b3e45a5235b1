//! Read models and mount triggers for the echo page views.
//!
//! # Responsibility
//! - Define the surfaces that trigger unlock evaluation on mount.
//! - Build the card and timeline projections the UI renders.
//!
//! # Invariants
//! - Every projection derives `unlocked` from `unlock_at` and the caller's `now`.
//! - Views only read; acknowledgment writes go through the dispatcher.

pub mod card;
pub mod mount;
pub mod timeline;
