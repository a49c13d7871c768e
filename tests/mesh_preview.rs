// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Zone previews through the BSP mesh evaluator

use approx::assert_relative_eq;
use nalgebra::Vector3;
use std::sync::Arc;
use zonekit::zone::ManualClock;
use zonekit::{
    EngineConfig, MeshEvaluator, Operation, Primitive, Scene, Shape, ShapeId, ZoneEvent,
};

fn scene() -> Scene<MeshEvaluator> {
    let mut scene = Scene::with_clock(
        Arc::new(MeshEvaluator::new(16)),
        EngineConfig {
            parallel_rows: true,
            ..EngineConfig::default()
        },
        Arc::new(ManualClock::new()),
    );
    scene.add_shape(Shape::new(
        1,
        Primitive::cube(Vector3::repeat(2.0), false),
        Vector3::zeros(),
    ));
    scene.add_shape(Shape::new(
        2,
        Primitive::cube(Vector3::repeat(2.0), false),
        Vector3::repeat(1.0),
    ));
    scene.add_shape(Shape::new(
        3,
        Primitive::cube(Vector3::repeat(1.0), false),
        Vector3::new(5.0, 0.5, 0.5),
    ));
    scene
}

#[test]
fn test_row_modes_produce_expected_volumes() {
    let cases = [
        (Operation::union(2), 15.0),
        (Operation::intersection(2), 1.0),
        (Operation::subtraction(2), 7.0),
        (Operation::reverse_subtraction(2), 7.0),
    ];

    for (operation, expected) in cases {
        let mut scene = scene();
        let handle = scene
            .add_zone_with_rows(
                "zone",
                vec![zonekit::Row::from_operations(vec![Operation::union(1), operation])],
            )
            .unwrap();
        scene.flush().unwrap();

        let volume = scene.zone(handle).unwrap().mesh().signed_volume();
        assert_relative_eq!(volume, expected, epsilon = 1e-6);
    }
}

#[test]
fn test_rows_are_unioned() {
    let mut scene = scene();
    let handle = scene
        .add_zone_with_rows(
            "zone",
            vec![
                zonekit::Row::from_operations(vec![Operation::union(1), Operation::subtraction(2)]),
                zonekit::Row::from_operations(vec![Operation::union(3)]),
            ],
        )
        .unwrap();
    scene.flush().unwrap();

    let zone = scene.zone(handle).unwrap();
    assert_eq!(zone.expression(), "+1 -2 OR +3");
    assert_relative_eq!(zone.mesh().signed_volume(), 8.0, epsilon = 1e-6);
}

#[test]
fn test_shape_edit_refreshes_preview() {
    let mut scene = scene();
    let handle = scene
        .add_zone_with_rows(
            "zone",
            vec![zonekit::Row::from_operations(vec![Operation::union(3)])],
        )
        .unwrap();
    scene.flush().unwrap();
    scene.drain_events();

    scene.update_shape(ShapeId(3), |shape| {
        shape.primitive = Primitive::cube(Vector3::repeat(2.0), false);
    });
    scene.flush().unwrap();

    assert_eq!(
        scene.drain_events(),
        vec![(handle, ZoneEvent::GeometryChanged)]
    );
    assert_relative_eq!(
        scene.zone(handle).unwrap().mesh().signed_volume(),
        8.0,
        epsilon = 1e-6
    );
    assert_eq!(scene.evaluator().cache_stats().cached_shapes, 1);
}

#[test]
fn test_tessellation_cache_stays_bounded() {
    let mut scene = scene();
    let handle = scene
        .add_zone_with_rows(
            "zone",
            vec![zonekit::Row::from_operations(vec![
                Operation::union(1),
                Operation::union(3),
            ])],
        )
        .unwrap();
    scene.flush().unwrap();

    for step in 0..50 {
        scene.update_shape(ShapeId(1), |shape| {
            shape.position = Vector3::new(0.0, 0.0, step as f64 * 0.01);
        });
        scene.flush().unwrap();
        assert_eq!(scene.evaluator().cache_stats().cached_shapes, 2);
    }

    scene.remove_shape(ShapeId(1)).unwrap();
    assert_eq!(scene.evaluator().cache_stats().cached_shapes, 1);
    assert!(scene.zone(handle).is_some());

    scene.remove_shape(ShapeId(3)).unwrap();
    assert_eq!(scene.evaluator().cache_stats().cached_shapes, 0);
    assert!(scene.zone(handle).is_none());
}
