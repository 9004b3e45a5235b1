//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate store, evaluator and dispatcher calls into view-level APIs.
//! - Keep FFI/CLI layers decoupled from storage details.

pub mod echo_service;
