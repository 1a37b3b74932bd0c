//! Input routing and spatial hit testing.
//!
//! # Responsibility
//! - Resolve pointer positions to schools through a static spatial index.
//! - Map hover, click, search, list, preset, lasso and clear inputs to
//!   selection commands.
//!
//! # Invariants
//! - The spatial index is built once per dataset and never rebuilt.
//! - Routing is pure with respect to selection state.

pub mod router;
pub mod spatial;

pub use router::{
    normalize_search_text, Highlight, IgnoreReason, InputEvent, InteractionRouter, LassoEntity,
    RouteOutcome,
};
pub use spatial::{NearestSchool, SpatialIndex};
