//! Flutter-facing bindings for EchoVerse core.

pub mod api;
