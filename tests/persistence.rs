// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Zone state and scene document round trips through the filesystem

use nalgebra::Vector3;
use std::sync::Arc;
use tempfile::tempdir;
use zonekit::zone::ManualClock;
use zonekit::{
    EngineConfig, GeoCardWriter, ImplicitEvaluator, Operation, Primitive, Scene, SceneDocument,
    Shape, ShapeId, Zone, ZoneState,
};

fn sample_zone() -> Zone<ImplicitEvaluator> {
    let mut zone = Zone::with_clock(
        "target",
        Arc::new(ImplicitEvaluator::new()),
        &EngineConfig::default(),
        Arc::new(ManualClock::new()),
    );
    zone.update_row(
        0,
        vec![
            Operation::union(1),
            Operation::intersection(2),
            Operation::reverse_subtraction(3),
        ],
    )
    .unwrap();
    zone.add_row(None, vec![Operation::union(2), Operation::subtraction(1)])
        .unwrap();
    zone
}

#[test]
fn test_zone_state_file_round_trip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("zone.json");

    let zone = sample_zone();
    let state = ZoneState::from_zone(&zone);
    state.save(&path).unwrap();

    let loaded = ZoneState::load(&path).unwrap();
    assert_eq!(loaded, state);
    assert!(loaded.validate().is_ok());

    let restored = loaded
        .into_zone(
            "target",
            Arc::new(ImplicitEvaluator::new()),
            &EngineConfig::default(),
            Arc::new(ManualClock::new()),
        )
        .unwrap();
    assert_eq!(restored.rows(), zone.rows());
    assert_eq!(restored.subscriptions(), zone.subscriptions());
    assert_eq!(restored.expression(), zone.expression());
    assert_eq!(ZoneState::from_zone(&restored).to_json().unwrap(), state.to_json().unwrap());
}

#[test]
fn test_scene_document_file_round_trip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("scene.json");

    let mut scene = Scene::new(Arc::new(ImplicitEvaluator::new()), EngineConfig::default());
    for id in 1..=3u32 {
        scene.add_shape(Shape::new(
            id,
            Primitive::cube(Vector3::repeat(1.0), false),
            Vector3::new(id as f64, 0.0, 0.0),
        ));
    }
    let handle = scene.add_zone("first");
    scene
        .zone_mut(handle)
        .unwrap()
        .add_operation(0, Operation::union(3))
        .unwrap();
    scene
        .add_zone_with_rows("second", ZoneState::from_zone(&sample_zone()).rows)
        .unwrap();

    SceneDocument::from_scene(&scene).save(&path).unwrap();
    let document = SceneDocument::load(&path).unwrap();
    assert_eq!(document.shapes.len(), 3);
    assert_eq!(document.zones.len(), 2);
    assert_eq!(document.zones[1].subscriptions[&ShapeId(2)], 2);

    let mut restored = document
        .clone()
        .into_scene(Arc::new(ImplicitEvaluator::new()), EngineConfig::default())
        .unwrap();
    assert_eq!(restored.flush().unwrap(), 2);
    assert_eq!(SceneDocument::from_scene(&restored), document);

    let card = GeoCardWriter::default()
        .render_zones(document.zones.iter().map(|zone| zone.rows.as_slice()));
    assert!(card.starts_with("  AAA    1     +3\n  BAA    2"));
    assert!(card.ends_with("  END\n"));
}
