//! Projected, read-only lookup tables over schools and practice records.
//!
//! # Responsibility
//! - Validate raw records and apply the projection exactly once.
//! - Serve key lookups, per-school practice records and filtered point sets.
//!
//! # Invariants
//! - `all_keys()` order is alphabetical and stable across calls.
//! - Practice records keep their file order within one school.
//! - Every stored practice record references a stored school.

use super::projection::GeoProjector;
use super::raw::{
    geo_cell_id_to_string, RawDataset, RawPracticeRecord, RawPreset, RawSchoolInfo,
};
use super::{DataLoadError, LoadResult, Resource};
use crate::density::WeightedPoint;
use crate::model::school::{PlanarPoint, PracticeRecord, Preset, SchoolInfo, SchoolKey};
use log::{debug, info, warn};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Counters describing what a load kept and what it dropped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadReport {
    pub schools_loaded: usize,
    pub schools_unprojectable: usize,
    pub records_loaded: usize,
    pub records_unprojectable: usize,
    /// Records whose school is absent (unknown or itself unprojectable).
    pub records_orphaned: usize,
    /// Preset entries naming schools absent from the index.
    pub preset_entries_dropped: usize,
}

/// Load-once, read-many dataset.
#[derive(Debug, Clone, Default)]
pub struct DatasetIndex {
    schools: BTreeMap<SchoolKey, SchoolInfo>,
    practice_by_school: BTreeMap<SchoolKey, Vec<PracticeRecord>>,
    presets: Vec<Preset>,
    report: LoadReport,
}

impl DatasetIndex {
    /// Builds the index from raw resources.
    ///
    /// # Errors
    /// - `MissingField`/`InvalidField` for the first malformed record.
    /// - `DuplicateSchool`/`DuplicatePreset` for repeated names.
    pub fn build(raw: RawDataset, projector: &dyn GeoProjector) -> LoadResult<Self> {
        let mut report = LoadReport::default();

        let mut seen_names = BTreeSet::new();
        let mut schools = BTreeMap::new();
        for (index, raw_school) in raw.schools.into_iter().enumerate() {
            let validated = validate_school(index, raw_school)?;
            if !seen_names.insert(validated.name.clone()) {
                return Err(DataLoadError::DuplicateSchool(validated.name));
            }

            let Some(position) = project(projector, validated.longitude, validated.latitude)
            else {
                debug!(
                    "event=school_dropped module=dataset reason=unprojectable index={index}"
                );
                report.schools_unprojectable += 1;
                continue;
            };

            let info = validated.into_school_info(position);
            schools.insert(info.key.clone(), info);
        }
        report.schools_loaded = schools.len();

        let mut practice_by_school: BTreeMap<SchoolKey, Vec<PracticeRecord>> = BTreeMap::new();
        for (index, raw_record) in raw.practice_records.into_iter().enumerate() {
            let validated = validate_practice_record(index, raw_record)?;
            if !schools.contains_key(validated.school.as_str()) {
                report.records_orphaned += 1;
                continue;
            }

            let Some(position) = project(projector, validated.longitude, validated.latitude)
            else {
                report.records_unprojectable += 1;
                continue;
            };

            practice_by_school
                .entry(validated.school.clone())
                .or_default()
                .push(PracticeRecord {
                    school: validated.school,
                    geo_cell_id: validated.geo_cell_id,
                    position,
                    weight: validated.graduate_count,
                });
            report.records_loaded += 1;
        }

        let mut preset_names = BTreeSet::new();
        let mut presets = Vec::with_capacity(raw.presets.len());
        for (index, raw_preset) in raw.presets.into_iter().enumerate() {
            let (name, school_names) = validate_preset(index, raw_preset)?;
            if !preset_names.insert(name.clone()) {
                return Err(DataLoadError::DuplicatePreset(name));
            }

            let mut members = Vec::with_capacity(school_names.len());
            for school_name in school_names {
                let school_name = school_name.trim().to_string();
                if schools.contains_key(school_name.as_str()) {
                    members.push(school_name);
                } else {
                    report.preset_entries_dropped += 1;
                }
            }
            presets.push(Preset {
                name,
                schools: members,
            });
        }

        if report.records_orphaned > 0 || report.preset_entries_dropped > 0 {
            warn!(
                "event=dataset_build module=dataset status=partial records_orphaned={} preset_entries_dropped={}",
                report.records_orphaned, report.preset_entries_dropped
            );
        }
        info!(
            "event=dataset_build module=dataset status=ok schools={} schools_unprojectable={} records={} records_unprojectable={} presets={}",
            report.schools_loaded,
            report.schools_unprojectable,
            report.records_loaded,
            report.records_unprojectable,
            presets.len()
        );

        Ok(Self {
            schools,
            practice_by_school,
            presets,
            report,
        })
    }

    /// All school keys in alphabetical order.
    pub fn all_keys(&self) -> Vec<SchoolKey> {
        self.schools.keys().cloned().collect()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.schools.contains_key(key)
    }

    pub fn school(&self, key: &str) -> Option<&SchoolInfo> {
        self.schools.get(key)
    }

    /// Schools in key order.
    pub fn schools(&self) -> impl Iterator<Item = &SchoolInfo> {
        self.schools.values()
    }

    pub fn schools_by_key(&self) -> &BTreeMap<SchoolKey, SchoolInfo> {
        &self.schools
    }

    /// Practice records of one school; empty for unknown keys.
    pub fn practice_records(&self, key: &str) -> &[PracticeRecord] {
        self.practice_by_school
            .get(key)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn presets(&self) -> &[Preset] {
        &self.presets
    }

    pub fn preset(&self, name: &str) -> Option<&Preset> {
        let name = name.trim();
        self.presets.iter().find(|preset| preset.name == name)
    }

    pub fn report(&self) -> LoadReport {
        self.report
    }

    pub fn len(&self) -> usize {
        self.schools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schools.is_empty()
    }

    /// Practice records of the given schools as weighted points.
    ///
    /// Output order follows `keys`, then file order; unknown keys contribute
    /// nothing.
    pub fn weighted_points<'a>(
        &self,
        keys: impl IntoIterator<Item = &'a SchoolKey>,
    ) -> Vec<WeightedPoint> {
        keys.into_iter()
            .flat_map(|key| self.practice_records(key))
            .map(|record| WeightedPoint {
                x: record.position.x,
                y: record.position.y,
                weight: record.weight,
            })
            .collect()
    }

    /// School rows of the given keys, skipping unknown keys.
    pub fn selected_infos<'a>(
        &self,
        keys: impl IntoIterator<Item = &'a SchoolKey>,
    ) -> Vec<&SchoolInfo> {
        keys.into_iter()
            .filter_map(|key| self.schools.get(key.as_str()))
            .collect()
    }
}

fn project(projector: &dyn GeoProjector, longitude: f64, latitude: f64) -> Option<PlanarPoint> {
    projector
        .project(longitude, latitude)
        .filter(|point| point.x.is_finite() && point.y.is_finite())
}

struct ValidatedSchool {
    name: String,
    longitude: f64,
    latitude: f64,
    established_year: Option<i32>,
    degree_type: Option<String>,
    primary_care_count: Option<f64>,
    specialty_count: Option<f64>,
    entrance_score: Option<f64>,
}

impl ValidatedSchool {
    fn into_school_info(self, position: PlanarPoint) -> SchoolInfo {
        SchoolInfo {
            key: self.name,
            position,
            established_year: self.established_year,
            degree_type: self.degree_type,
            primary_care_count: self.primary_care_count,
            specialty_count: self.specialty_count,
            entrance_score: self.entrance_score,
        }
    }
}

fn validate_school(index: usize, raw: RawSchoolInfo) -> LoadResult<ValidatedSchool> {
    const RESOURCE: Resource = Resource::SchoolInfo;

    let name = required_name(RESOURCE, index, "name", raw.name)?;
    let longitude = required_coordinate(RESOURCE, index, "longitude", raw.longitude)?;
    let latitude = required_coordinate(RESOURCE, index, "latitude", raw.latitude)?;

    Ok(ValidatedSchool {
        name,
        longitude,
        latitude,
        established_year: raw.established_year,
        degree_type: raw
            .degree_type
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty()),
        primary_care_count: optional_count(
            RESOURCE,
            index,
            "primaryCareCount",
            raw.primary_care_count,
        )?,
        specialty_count: optional_count(RESOURCE, index, "specialtyCount", raw.specialty_count)?,
        entrance_score: optional_finite(RESOURCE, index, "entranceScore", raw.entrance_score)?,
    })
}

struct ValidatedPracticeRecord {
    school: String,
    geo_cell_id: String,
    longitude: f64,
    latitude: f64,
    graduate_count: f64,
}

fn validate_practice_record(
    index: usize,
    raw: RawPracticeRecord,
) -> LoadResult<ValidatedPracticeRecord> {
    const RESOURCE: Resource = Resource::PracticeRecords;

    let school = required_name(RESOURCE, index, "schoolName", raw.school_name)?;
    let geo_cell_id = raw
        .geo_cell_id
        .as_ref()
        .and_then(geo_cell_id_to_string)
        .ok_or(DataLoadError::MissingField {
            resource: RESOURCE,
            index,
            field: "geoCellId",
        })?;
    let longitude = required_coordinate(RESOURCE, index, "longitude", raw.longitude)?;
    let latitude = required_coordinate(RESOURCE, index, "latitude", raw.latitude)?;
    let graduate_count = optional_count(RESOURCE, index, "graduateCount", raw.graduate_count)?
        .ok_or(DataLoadError::MissingField {
            resource: RESOURCE,
            index,
            field: "graduateCount",
        })?;

    Ok(ValidatedPracticeRecord {
        school,
        geo_cell_id,
        longitude,
        latitude,
        graduate_count,
    })
}

fn validate_preset(index: usize, raw: RawPreset) -> LoadResult<(String, Vec<String>)> {
    let name = required_name(Resource::Presets, index, "presetName", raw.preset_name)?;
    let school_names = raw.school_names.ok_or(DataLoadError::MissingField {
        resource: Resource::Presets,
        index,
        field: "schoolNames",
    })?;
    Ok((name, school_names))
}

fn required_name(
    resource: Resource,
    index: usize,
    field: &'static str,
    value: Option<String>,
) -> LoadResult<String> {
    let value = value.ok_or(DataLoadError::MissingField {
        resource,
        index,
        field,
    })?;
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DataLoadError::InvalidField {
            resource,
            index,
            field,
            message: "must not be blank".to_string(),
        });
    }
    Ok(trimmed.to_string())
}

fn required_coordinate(
    resource: Resource,
    index: usize,
    field: &'static str,
    value: Option<f64>,
) -> LoadResult<f64> {
    optional_finite(resource, index, field, value)?.ok_or(DataLoadError::MissingField {
        resource,
        index,
        field,
    })
}

fn optional_finite(
    resource: Resource,
    index: usize,
    field: &'static str,
    value: Option<f64>,
) -> LoadResult<Option<f64>> {
    match value {
        Some(number) if !number.is_finite() => Err(DataLoadError::InvalidField {
            resource,
            index,
            field,
            message: format!("must be finite, got {number}"),
        }),
        other => Ok(other),
    }
}

fn optional_count(
    resource: Resource,
    index: usize,
    field: &'static str,
    value: Option<f64>,
) -> LoadResult<Option<f64>> {
    match optional_finite(resource, index, field, value)? {
        Some(count) if count < 0.0 => Err(DataLoadError::InvalidField {
            resource,
            index,
            field,
            message: format!("must be >= 0, got {count}"),
        }),
        other => Ok(other),
    }
}
