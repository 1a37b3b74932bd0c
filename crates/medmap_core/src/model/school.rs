//! School, practice-location and preset records.
//!
//! # Responsibility
//! - Define the canonical in-memory shape of one school and its graduates.
//! - Provide small accessors used by aggregation and rendering.
//!
//! # Invariants
//! - `SchoolInfo::key` is stable for the lifetime of a session.
//! - `PracticeRecord::weight` is finite and non-negative.
//! - Optional attributes stay `None` when the source omitted them; they are
//!   never defaulted at load time.

use serde::{Deserialize, Serialize};

/// Selection key for one school.
///
/// The school display name doubles as its identifier, so search input and
/// list rendering use the same string.
pub type SchoolKey = String;

/// Position in planar plot coordinates (after projection).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlanarPoint {
    pub x: f64,
    pub y: f64,
}

impl PlanarPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Squared euclidean distance, enough for nearest comparisons.
    pub fn distance_squared(&self, other: &PlanarPoint) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }
}

/// One medical school with its projected location and summary attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchoolInfo {
    /// Unique, stable selection key (school name).
    pub key: SchoolKey,
    /// Projected school campus position.
    pub position: PlanarPoint,
    pub established_year: Option<i32>,
    /// Degree granted, e.g. `MD` or `DO`.
    pub degree_type: Option<String>,
    /// Graduates practicing in primary care.
    pub primary_care_count: Option<f64>,
    /// Graduates practicing in a specialty.
    pub specialty_count: Option<f64>,
    /// Aggregate entrance-exam score of admitted students.
    pub entrance_score: Option<f64>,
}

impl SchoolInfo {
    /// Creates a school with only the required fields set.
    pub fn new(key: impl Into<SchoolKey>, position: PlanarPoint) -> Self {
        Self {
            key: key.into(),
            position,
            established_year: None,
            degree_type: None,
            primary_care_count: None,
            specialty_count: None,
            entrance_score: None,
        }
    }

    /// Primary-care count with missing treated as zero.
    pub fn primary_or_zero(&self) -> f64 {
        self.primary_care_count.unwrap_or(0.0)
    }

    /// Specialty count with missing treated as zero.
    pub fn specialty_or_zero(&self) -> f64 {
        self.specialty_count.unwrap_or(0.0)
    }
}

/// Graduates of one school practicing in one geographic cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PracticeRecord {
    /// Foreign key into `SchoolInfo::key`.
    pub school: SchoolKey,
    /// Source geographic cell identifier (county/tract id).
    pub geo_cell_id: String,
    pub position: PlanarPoint,
    /// Number of graduates practicing in this cell.
    pub weight: f64,
}

/// Named list of schools selectable as one unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preset {
    pub name: String,
    pub schools: Vec<SchoolKey>,
}
