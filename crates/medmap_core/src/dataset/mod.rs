//! Dataset loading and the read-only school/practice index.
//!
//! # Responsibility
//! - Decode raw school, practice-location and preset resources.
//! - Project every record once and build load-once, read-many lookups.
//!
//! # Invariants
//! - A `DatasetIndex` is never mutated after construction.
//! - Any missing required field or unreadable resource aborts the whole load.
//! - Unprojectable records are dropped and counted, never fatal.

use crate::config::ConfigError;
use crate::model::school::SchoolKey;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub mod index;
pub mod loader;
pub mod projection;
pub mod raw;

pub use index::{DatasetIndex, LoadReport};
pub use loader::{load_dataset, load_map_config, load_raw_dataset, DatasetSources};
pub use projection::{EquirectangularProjector, GeoBounds, GeoProjector, IdentityProjector};
pub use raw::{RawDataset, RawPracticeRecord, RawPreset, RawSchoolInfo};

pub type LoadResult<T> = Result<T, DataLoadError>;

/// Input resource kinds, used to attribute load failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    SchoolInfo,
    PracticeRecords,
    Presets,
    MapConfig,
}

impl Resource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SchoolInfo => "school_info",
            Self::PracticeRecords => "practice_records",
            Self::Presets => "presets",
            Self::MapConfig => "map_config",
        }
    }
}

impl Display for Resource {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fatal load-time error. Initialization stops and no partial map is built.
#[derive(Debug)]
pub enum DataLoadError {
    Io {
        resource: Resource,
        path: PathBuf,
        source: std::io::Error,
    },
    Parse {
        resource: Resource,
        source: serde_json::Error,
    },
    MissingField {
        resource: Resource,
        index: usize,
        field: &'static str,
    },
    InvalidField {
        resource: Resource,
        index: usize,
        field: &'static str,
        message: String,
    },
    DuplicateSchool(SchoolKey),
    DuplicatePreset(String),
    InvalidConfig(ConfigError),
    /// A resource reader thread panicked before producing a result.
    ReaderPanicked(Resource),
}

impl DataLoadError {
    /// Stable variant label for logs; carries no school or preset names.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Io { .. } => "io",
            Self::Parse { .. } => "parse",
            Self::MissingField { .. } => "missing_field",
            Self::InvalidField { .. } => "invalid_field",
            Self::DuplicateSchool(_) => "duplicate_school",
            Self::DuplicatePreset(_) => "duplicate_preset",
            Self::InvalidConfig(_) => "invalid_config",
            Self::ReaderPanicked(_) => "reader_panicked",
        }
    }

    /// Resource the failure is attributed to, when known.
    pub fn resource(&self) -> Option<Resource> {
        match self {
            Self::Io { resource, .. }
            | Self::Parse { resource, .. }
            | Self::MissingField { resource, .. }
            | Self::InvalidField { resource, .. } => Some(*resource),
            Self::DuplicateSchool(_) => Some(Resource::SchoolInfo),
            Self::DuplicatePreset(_) => Some(Resource::Presets),
            Self::InvalidConfig(_) => Some(Resource::MapConfig),
            Self::ReaderPanicked(resource) => Some(*resource),
        }
    }
}

impl Display for DataLoadError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io {
                resource,
                path,
                source,
            } => write!(
                f,
                "failed to read {resource} from `{}`: {source}",
                path.display()
            ),
            Self::Parse { resource, source } => write!(f, "failed to parse {resource}: {source}"),
            Self::MissingField {
                resource,
                index,
                field,
            } => write!(f, "{resource}[{index}] is missing required field `{field}`"),
            Self::InvalidField {
                resource,
                index,
                field,
                message,
            } => write!(f, "{resource}[{index}].{field} is invalid: {message}"),
            Self::DuplicateSchool(name) => write!(f, "duplicate school name: {name}"),
            Self::DuplicatePreset(name) => write!(f, "duplicate preset name: {name}"),
            Self::InvalidConfig(err) => write!(f, "invalid map config: {err}"),
            Self::ReaderPanicked(resource) => write!(f, "reader for {resource} panicked"),
        }
    }
}

impl Error for DataLoadError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse { source, .. } => Some(source),
            Self::InvalidConfig(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ConfigError> for DataLoadError {
    fn from(value: ConfigError) -> Self {
        Self::InvalidConfig(value)
    }
}
