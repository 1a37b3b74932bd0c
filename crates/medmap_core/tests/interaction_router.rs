mod common;

use medmap_core::interaction::{RouteOutcome, SpatialIndex};
use medmap_core::{IgnoreReason, InputEvent, InteractionRouter, LassoEntity, SelectionCommand};

fn command(outcome: RouteOutcome) -> SelectionCommand {
    match outcome {
        RouteOutcome::Command(command) => command,
        other => panic!("expected a command, got {other:?}"),
    }
}

#[test]
fn hover_reports_nearest_school_without_command() {
    let dataset = common::dataset();
    let spatial = SpatialIndex::build(&dataset);
    let router = InteractionRouter::new(&dataset, &spatial);

    match router.route(InputEvent::PointerMove { x: 390.0, y: 280.0 }) {
        RouteOutcome::Highlight(Some(highlight)) => {
            assert_eq!(highlight.key, "Beta Institute");
            assert_eq!(highlight.position.x, 400.0);
        }
        other => panic!("unexpected outcome {other:?}"),
    }
}

#[test]
fn click_toggles_nearest_school() {
    let dataset = common::dataset();
    let spatial = SpatialIndex::build(&dataset);
    let router = InteractionRouter::new(&dataset, &spatial);

    assert_eq!(
        command(router.route(InputEvent::Click { x: 0.0, y: 0.0 })),
        SelectionCommand::Toggle("Alpha University".to_string())
    );
}

#[test]
fn search_normalizes_and_validates_names() {
    let dataset = common::dataset();
    let spatial = SpatialIndex::build(&dataset);
    let router = InteractionRouter::new(&dataset, &spatial);

    assert_eq!(
        command(router.route(InputEvent::SearchSubmit(" Beta\t Institute ".to_string()))),
        SelectionCommand::Toggle("Beta Institute".to_string())
    );
    assert_eq!(
        router.route(InputEvent::SearchSubmit("beta institute".to_string())),
        RouteOutcome::Ignored(IgnoreReason::UnknownSchool("beta institute".to_string()))
    );
    assert_eq!(
        router.route(InputEvent::SearchSubmit("   ".to_string())),
        RouteOutcome::Ignored(IgnoreReason::BlankSearch)
    );
}

#[test]
fn preset_and_select_all_become_bulk_selects() {
    let dataset = common::dataset();
    let spatial = SpatialIndex::build(&dataset);
    let router = InteractionRouter::new(&dataset, &spatial);

    let everyone = vec!["Alpha University".to_string(), "Beta Institute".to_string()];
    assert_eq!(
        command(router.route(InputEvent::Preset("Everyone".to_string()))),
        SelectionCommand::BulkSelect(everyone.clone())
    );
    assert_eq!(
        command(router.route(InputEvent::SelectAll)),
        SelectionCommand::BulkSelect(everyone)
    );
    assert_eq!(
        router.route(InputEvent::Preset("Nobody".to_string())),
        RouteOutcome::Ignored(IgnoreReason::UnknownPreset("Nobody".to_string()))
    );
}

#[test]
fn lasso_keeps_known_entities_in_order() {
    let dataset = common::dataset();
    let spatial = SpatialIndex::build(&dataset);
    let router = InteractionRouter::new(&dataset, &spatial);

    let entities = vec![
        LassoEntity::new("Beta Institute"),
        LassoEntity::new("Ghost College"),
        LassoEntity::new("Alpha University"),
    ];
    assert_eq!(
        command(router.route(InputEvent::LassoEnd(entities))),
        SelectionCommand::ToggleMany(vec![
            "Beta Institute".to_string(),
            "Alpha University".to_string()
        ])
    );
    assert_eq!(
        router.route(InputEvent::LassoEnd(vec![LassoEntity::new("Ghost College")])),
        RouteOutcome::Ignored(IgnoreReason::EmptyLasso)
    );
}

#[test]
fn lasso_entities_decode_from_recognizer_payload() {
    let entities: Vec<LassoEntity> = serde_json::from_value(serde_json::json!([
        { "med_school_name": "Alpha University", "x": 100.0, "y": 100.0 }
    ]))
    .unwrap();
    assert_eq!(entities, vec![LassoEntity::new("Alpha University")]);
}

#[test]
fn lasso_polygon_selects_enclosed_schools() {
    let dataset = common::dataset();
    let spatial = SpatialIndex::build(&dataset);
    let router = InteractionRouter::new(&dataset, &spatial);

    let ring = vec![[50.0, 50.0], [150.0, 50.0], [150.0, 150.0], [50.0, 150.0]];
    assert_eq!(
        command(router.route(InputEvent::LassoPolygon(ring))),
        SelectionCommand::ToggleMany(vec!["Alpha University".to_string()])
    );
}

#[test]
fn list_click_and_clear_map_to_remove_and_clear() {
    let dataset = common::dataset();
    let spatial = SpatialIndex::build(&dataset);
    let router = InteractionRouter::new(&dataset, &spatial);

    assert_eq!(
        command(router.route(InputEvent::ListItemClick("Beta Institute".to_string()))),
        SelectionCommand::Remove("Beta Institute".to_string())
    );
    assert_eq!(command(router.route(InputEvent::ClearAll)), SelectionCommand::Clear);
}

#[test]
fn suggest_prefers_prefix_matches() {
    let dataset = common::dataset();
    let spatial = SpatialIndex::build(&dataset);
    let router = InteractionRouter::new(&dataset, &spatial);

    assert_eq!(router.suggest("INST", None), vec!["Beta Institute".to_string()]);
    assert_eq!(
        router.suggest("", Some(1)),
        vec!["Alpha University".to_string()]
    );
    assert_eq!(router.suggest("t", None).first().map(String::as_str), Some("Alpha University"));
}
