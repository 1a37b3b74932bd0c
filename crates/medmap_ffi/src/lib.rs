//! Flutter-facing bindings for the map core.

pub mod api;
