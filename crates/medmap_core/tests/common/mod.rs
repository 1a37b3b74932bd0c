#![allow(dead_code)]

use medmap_core::dataset::{DatasetIndex, IdentityProjector, RawDataset};
use serde_json::{json, Value};
use std::path::Path;

/// Two schools in plain plot coordinates plus a preset naming both.
pub fn school_rows() -> Value {
    json!([
        {
            "med_school_name": "Alpha University",
            "med_lon": 100.0,
            "med_lat": 100.0,
            "entranceScore": 90.0,
            "primaryCareCount": 10.0,
            "specialtyCount": 0.0
        },
        {
            "med_school_name": "Beta Institute",
            "med_lon": 400.0,
            "med_lat": 300.0,
            "primaryCareCount": 0.0,
            "specialtyCount": 20.0
        }
    ])
}

pub fn practice_rows() -> Value {
    json!([
        {
            "med_school_name": "Alpha University",
            "geoid": 1001,
            "lon": 120.0,
            "lat": 110.0,
            "docs": 4
        },
        {
            "med_school_name": "Alpha University",
            "geoid": 1003,
            "lon": 90.0,
            "lat": 140.0,
            "docs": 2
        },
        {
            "med_school_name": "Beta Institute",
            "geoid": "06037",
            "lon": 380.0,
            "lat": 320.0,
            "docs": 6
        }
    ])
}

pub fn preset_rows() -> Value {
    json!([
        { "presetName": "Everyone", "schoolNames": ["Alpha University", "Beta Institute"] }
    ])
}

pub fn dataset() -> DatasetIndex {
    let raw = RawDataset {
        schools: serde_json::from_value(school_rows()).unwrap(),
        practice_records: serde_json::from_value(practice_rows()).unwrap(),
        presets: serde_json::from_value(preset_rows()).unwrap(),
    };
    DatasetIndex::build(raw, &IdentityProjector).unwrap()
}

pub fn write_json(dir: &Path, file: &str, value: &Value) {
    std::fs::write(dir.join(file), value.to_string()).unwrap();
}

pub fn write_dataset(dir: &Path) {
    write_json(dir, "schools_info.json", &school_rows());
    write_json(dir, "schools_data.json", &practice_rows());
    write_json(dir, "presets.json", &preset_rows());
}
