//! Kernel density surfaces and selection statistics.
//!
//! # Responsibility
//! - Estimate a weighted density grid and extract iso-density rings.
//! - Aggregate score and graduate totals over selected schools.
//!
//! # Invariants
//! - Both computations are side-effect-free apart from diagnostics logging.
//! - Empty input is a valid input and yields empty/zero results.

pub mod contour;
pub mod engine;
pub mod kde;
pub mod stats;

pub use engine::{compute_density, Contour, DensityEngine, DensitySurface};
pub use kde::{estimate_density, DensityGrid, WeightedPoint};
pub use stats::{compute_aggregate_stats, AggregateStats};
