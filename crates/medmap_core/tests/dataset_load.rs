mod common;

use medmap_core::dataset::{load_raw_dataset, Resource};
use medmap_core::{
    load_dataset, load_map_config, DataLoadError, DatasetSources, EquirectangularProjector,
    IdentityProjector, ThresholdPolicy,
};
use serde_json::json;

#[test]
fn loads_directory_into_sorted_index() {
    let dir = tempfile::tempdir().unwrap();
    common::write_dataset(dir.path());

    let index = load_dataset(&DatasetSources::from_dir(dir.path()), &IdentityProjector).unwrap();

    assert_eq!(
        index.all_keys(),
        vec!["Alpha University".to_string(), "Beta Institute".to_string()]
    );
    assert_eq!(index.practice_records("Alpha University").len(), 2);
    assert_eq!(index.practice_records("Beta Institute")[0].geo_cell_id, "06037");
    assert_eq!(index.practice_records("Alpha University")[0].geo_cell_id, "1001");
    assert!(index.practice_records("Nobody").is_empty());
    assert_eq!(index.preset("Everyone").unwrap().schools.len(), 2);

    let report = index.report();
    assert_eq!(report.schools_loaded, 2);
    assert_eq!(report.records_loaded, 3);
}

#[test]
fn missing_presets_file_means_no_presets() {
    let dir = tempfile::tempdir().unwrap();
    common::write_json(dir.path(), "schools_info.json", &common::school_rows());
    common::write_json(dir.path(), "schools_data.json", &common::practice_rows());

    let sources = DatasetSources::from_dir(dir.path());
    assert!(sources.presets.is_none());
    let index = load_dataset(&sources, &IdentityProjector).unwrap();
    assert!(index.presets().is_empty());
}

#[test]
fn missing_required_file_is_fatal_io_error() {
    let dir = tempfile::tempdir().unwrap();
    common::write_json(dir.path(), "schools_info.json", &common::school_rows());

    let err = load_raw_dataset(&DatasetSources::from_dir(dir.path())).unwrap_err();
    assert!(matches!(
        err,
        DataLoadError::Io {
            resource: Resource::PracticeRecords,
            ..
        }
    ));
}

#[test]
fn malformed_json_is_fatal_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    common::write_dataset(dir.path());
    std::fs::write(dir.path().join("presets.json"), "[{\"presetName\": ").unwrap();

    let err = load_dataset(&DatasetSources::from_dir(dir.path()), &IdentityProjector).unwrap_err();
    assert!(matches!(
        err,
        DataLoadError::Parse {
            resource: Resource::Presets,
            ..
        }
    ));
}

#[test]
fn record_without_graduate_count_aborts_load() {
    let dir = tempfile::tempdir().unwrap();
    common::write_json(dir.path(), "schools_info.json", &common::school_rows());
    common::write_json(
        dir.path(),
        "schools_data.json",
        &json!([
            {
                "med_school_name": "Alpha University",
                "geoid": 1,
                "lon": 1.0,
                "lat": 1.0,
                "docs": 1
            },
            { "med_school_name": "Alpha University", "geoid": 2, "lon": 2.0, "lat": 2.0 }
        ]),
    );

    let err = load_dataset(&DatasetSources::from_dir(dir.path()), &IdentityProjector).unwrap_err();
    match err {
        DataLoadError::MissingField {
            resource,
            index,
            field,
        } => {
            assert_eq!(resource, Resource::PracticeRecords);
            assert_eq!(index, 1);
            assert_eq!(field, "graduateCount");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn unprojectable_and_orphaned_records_are_dropped_and_counted() {
    let dir = tempfile::tempdir().unwrap();
    common::write_json(
        dir.path(),
        "schools_info.json",
        &json!([{ "med_school_name": "Coastal Medical", "med_lon": -118.2, "med_lat": 34.0 }]),
    );
    common::write_json(
        dir.path(),
        "schools_data.json",
        &json!([
            {
                "med_school_name": "Coastal Medical",
                "geoid": "06037",
                "lon": -118.3,
                "lat": 34.1,
                "docs": 8
            },
            {
                "med_school_name": "Coastal Medical",
                "geoid": "15003",
                "lon": -157.8,
                "lat": 21.3,
                "docs": 2
            },
            {
                "med_school_name": "Unknown School",
                "geoid": "36061",
                "lon": -74.0,
                "lat": 40.7,
                "docs": 1
            }
        ]),
    );

    let projector = EquirectangularProjector::contiguous_us(960.0, 600.0);
    let index = load_dataset(&DatasetSources::from_dir(dir.path()), &projector).unwrap();
    let report = index.report();
    assert_eq!(report.records_loaded, 1);
    assert_eq!(report.records_unprojectable, 1);
    assert_eq!(report.records_orphaned, 1);
    assert_eq!(index.practice_records("Coastal Medical")[0].weight, 8.0);
}

#[test]
fn duplicate_school_names_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    common::write_json(
        dir.path(),
        "schools_info.json",
        &json!([
            { "med_school_name": "Twin", "med_lon": 1.0, "med_lat": 1.0 },
            { "med_school_name": "Twin", "med_lon": 2.0, "med_lat": 2.0 }
        ]),
    );
    common::write_json(dir.path(), "schools_data.json", &json!([]));

    let err = load_dataset(&DatasetSources::from_dir(dir.path()), &IdentityProjector).unwrap_err();
    assert!(matches!(err, DataLoadError::DuplicateSchool(name) if name == "Twin"));
}

#[test]
fn map_config_is_optional_and_validated() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("map_config.json");
    assert!(load_map_config(&path).unwrap().is_none());

    std::fs::write(
        &path,
        json!({
            "plotWidth": 800.0,
            "plotHeight": 500.0,
            "density": {
                "bandwidth": 6.0,
                "cellSize": 2.0,
                "thresholds": { "kind": "fixed", "values": [0.01, 0.02] }
            }
        })
        .to_string(),
    )
    .unwrap();
    let config = load_map_config(&path).unwrap().unwrap();
    assert_eq!(config.plot_width, 800.0);
    assert_eq!(config.density.bandwidth, 6.0);
    assert_eq!(
        config.density.thresholds,
        ThresholdPolicy::Fixed {
            values: vec![0.01, 0.02]
        }
    );

    std::fs::write(&path, json!({ "density": { "bandwidth": -1.0 } }).to_string()).unwrap();
    assert!(matches!(
        load_map_config(&path).unwrap_err(),
        DataLoadError::InvalidConfig(_)
    ));
}
