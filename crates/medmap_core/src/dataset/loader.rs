//! File-based resource loading.
//!
//! # Responsibility
//! - Read the dataset resources concurrently and decode them as JSON.
//! - Fail the whole load when any required resource fails.
//!
//! # Invariants
//! - No `DatasetIndex` is returned unless every required resource decoded.
//! - An absent optional resource is not an error; a malformed one is.

use super::index::DatasetIndex;
use super::projection::GeoProjector;
use super::raw::{RawDataset, RawPracticeRecord, RawPreset, RawSchoolInfo};
use super::{DataLoadError, LoadResult, Resource};
use crate::config::MapConfig;
use log::{debug, error, info};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use std::time::Instant;

pub const SCHOOLS_INFO_FILE: &str = "schools_info.json";
pub const SCHOOLS_DATA_FILE: &str = "schools_data.json";
pub const PRESETS_FILE: &str = "presets.json";
pub const MAP_CONFIG_FILE: &str = "map_config.json";

/// File locations of one dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetSources {
    pub schools_info: PathBuf,
    pub practice_records: PathBuf,
    /// `None` means the dataset ships without presets.
    pub presets: Option<PathBuf>,
}

impl DatasetSources {
    /// Resolves the conventional file names inside `dir`.
    ///
    /// `presets.json` is only referenced when it exists.
    pub fn from_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        let presets = dir.join(PRESETS_FILE);
        Self {
            schools_info: dir.join(SCHOOLS_INFO_FILE),
            practice_records: dir.join(SCHOOLS_DATA_FILE),
            presets: presets.is_file().then_some(presets),
        }
    }
}

/// Reads and decodes every resource in parallel.
///
/// # Errors
/// - Returns the first failure in resource order (schools, records, presets).
pub fn load_raw_dataset(sources: &DatasetSources) -> LoadResult<RawDataset> {
    let (schools, practice_records, presets) = std::thread::scope(|scope| {
        let schools = scope.spawn(|| {
            read_json::<Vec<RawSchoolInfo>>(Resource::SchoolInfo, &sources.schools_info)
        });
        let records = scope.spawn(|| {
            read_json::<Vec<RawPracticeRecord>>(
                Resource::PracticeRecords,
                &sources.practice_records,
            )
        });
        let presets = scope.spawn(|| match &sources.presets {
            Some(path) => read_json::<Vec<RawPreset>>(Resource::Presets, path),
            None => Ok(Vec::new()),
        });

        (
            schools
                .join()
                .unwrap_or(Err(DataLoadError::ReaderPanicked(Resource::SchoolInfo))),
            records
                .join()
                .unwrap_or(Err(DataLoadError::ReaderPanicked(Resource::PracticeRecords))),
            presets
                .join()
                .unwrap_or(Err(DataLoadError::ReaderPanicked(Resource::Presets))),
        )
    });

    Ok(RawDataset {
        schools: schools?,
        practice_records: practice_records?,
        presets: presets?,
    })
}

/// Loads, projects and indexes one dataset.
///
/// # Side effects
/// - Emits `dataset_load` events with duration and status.
pub fn load_dataset(
    sources: &DatasetSources,
    projector: &dyn GeoProjector,
) -> LoadResult<DatasetIndex> {
    let started_at = Instant::now();
    info!("event=dataset_load module=dataset status=start");

    let result = load_raw_dataset(sources).and_then(|raw| DatasetIndex::build(raw, projector));
    match &result {
        Ok(index) => info!(
            "event=dataset_load module=dataset status=ok duration_ms={} schools={}",
            started_at.elapsed().as_millis(),
            index.len()
        ),
        Err(err) => {
            error!(
                "event=dataset_load module=dataset status=error duration_ms={} error_kind={} resource={}",
                started_at.elapsed().as_millis(),
                err.kind(),
                err.resource().map_or("none", Resource::as_str)
            );
            debug!("event=dataset_load module=dataset status=error detail={err}");
        }
    }
    result
}

/// Reads `map_config.json` overrides, validating the result.
///
/// Returns `Ok(None)` when the file does not exist.
pub fn load_map_config(path: impl AsRef<Path>) -> LoadResult<Option<MapConfig>> {
    let path = path.as_ref();
    if !path.is_file() {
        return Ok(None);
    }
    let config = read_json::<MapConfig>(Resource::MapConfig, path)?;
    config.validate()?;
    Ok(Some(config))
}

fn read_json<T: DeserializeOwned>(resource: Resource, path: &Path) -> LoadResult<T> {
    let bytes = std::fs::read(path).map_err(|source| DataLoadError::Io {
        resource,
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_slice(&bytes).map_err(|source| DataLoadError::Parse { resource, source })
}
