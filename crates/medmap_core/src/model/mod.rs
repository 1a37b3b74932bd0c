//! Domain model for schools, practice locations and presets.
//!
//! # Responsibility
//! - Define the validated, projected records shared by every core component.
//! - Keep one canonical key (`SchoolKey`) for selection and lookups.
//!
//! # Invariants
//! - Every `SchoolInfo` key is unique within one loaded dataset.
//! - Every position is finite and already in planar plot coordinates.
//! - Records are immutable after load.

pub mod geometry;
pub mod school;
