//! Raw JSON record shapes as delivered by the data files.
//!
//! Every field is optional at this layer so that a missing value surfaces as
//! a `DataLoadError::MissingField` with its record index instead of an opaque
//! decoder message. Legacy snake_case column names are accepted as aliases.

use serde::Deserialize;
use serde_json::Value;

/// One entry of `schools_info.json`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSchoolInfo {
    #[serde(alias = "med_school_name")]
    pub name: Option<String>,
    #[serde(alias = "med_lon", alias = "lon")]
    pub longitude: Option<f64>,
    #[serde(alias = "med_lat", alias = "lat")]
    pub latitude: Option<f64>,
    #[serde(alias = "established_year")]
    pub established_year: Option<i32>,
    #[serde(alias = "degree_type")]
    pub degree_type: Option<String>,
    #[serde(alias = "primary_care_count")]
    pub primary_care_count: Option<f64>,
    #[serde(alias = "specialty_count")]
    pub specialty_count: Option<f64>,
    #[serde(alias = "entrance_score")]
    pub entrance_score: Option<f64>,
}

/// One entry of `schools_data.json`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPracticeRecord {
    #[serde(alias = "med_school_name")]
    pub school_name: Option<String>,
    /// Numeric FIPS codes and string ids both occur in source files.
    #[serde(alias = "geoid")]
    pub geo_cell_id: Option<Value>,
    #[serde(alias = "lon")]
    pub longitude: Option<f64>,
    #[serde(alias = "lat")]
    pub latitude: Option<f64>,
    #[serde(alias = "docs")]
    pub graduate_count: Option<f64>,
}

/// One entry of `presets.json`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPreset {
    #[serde(alias = "preset_name", alias = "name")]
    pub preset_name: Option<String>,
    #[serde(alias = "school_names", alias = "schools")]
    pub school_names: Option<Vec<String>>,
}

/// All raw resources needed to build one `DatasetIndex`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawDataset {
    pub schools: Vec<RawSchoolInfo>,
    pub practice_records: Vec<RawPracticeRecord>,
    pub presets: Vec<RawPreset>,
}

/// Converts a geo cell id JSON value to its canonical string form.
///
/// Returns `None` for `null`, empty strings and non-scalar values.
pub(crate) fn geo_cell_id_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => {
            let trimmed = text.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}
