// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Scene document: shapes and named zones in one JSON file

use super::ZoneState;
use crate::config::EngineConfig;
use crate::geometry::{CsgEvaluator, Shape};
use crate::scene::Scene;
use crate::zone::{Clock, Row, ShapeId, SystemClock};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneEntry {
    pub name: String,
    pub rows: Vec<Row>,
    #[serde(default)]
    pub subscriptions: BTreeMap<ShapeId, usize>,
}

impl ZoneEntry {
    pub fn state(&self) -> ZoneState {
        ZoneState {
            rows: self.rows.clone(),
            subscriptions: self.subscriptions.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneDocument {
    #[serde(default)]
    pub shapes: Vec<Shape>,
    #[serde(default)]
    pub zones: Vec<ZoneEntry>,
}

impl SceneDocument {
    pub fn from_scene<E: CsgEvaluator>(scene: &Scene<E>) -> Self {
        Self {
            shapes: scene.shapes().shapes().into_iter().cloned().collect(),
            zones: scene
                .zones()
                .map(|(_, zone)| {
                    let state = ZoneState::from_zone(zone);
                    ZoneEntry {
                        name: zone.name().to_string(),
                        rows: state.rows,
                        subscriptions: state.subscriptions,
                    }
                })
                .collect(),
        }
    }

    /// Build a scene with a recompute pending for every zone
    pub fn into_scene<E: CsgEvaluator>(self, evaluator: Arc<E>, config: EngineConfig) -> Result<Scene<E>> {
        self.into_scene_with_clock(evaluator, config, Arc::new(SystemClock))
    }

    pub fn into_scene_with_clock<E: CsgEvaluator>(
        self,
        evaluator: Arc<E>,
        config: EngineConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Scene<E>> {
        let mut scene = Scene::with_clock(evaluator, config, clock);
        for shape in self.shapes {
            let id = shape.id;
            if scene.add_shape(shape).is_some() {
                warn!(shape = %id, "duplicate shape id in document, keeping the last one");
            }
        }
        for entry in self.zones {
            if let Err(err) = entry.state().validate() {
                warn!(zone = %entry.name, %err, "zone state inconsistent");
            }
            scene
                .add_zone_with_rows(entry.name.clone(), entry.rows)
                .with_context(|| format!("Failed to restore zone {:?}", entry.name))?;
        }
        Ok(scene)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize scene document")
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse scene document")
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read scene document: {:?}", path.as_ref()))?;
        Self::from_json(&content)
            .with_context(|| format!("Invalid scene document: {:?}", path.as_ref()))
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path.as_ref(), self.to_json()?)
            .with_context(|| format!("Failed to write scene document: {:?}", path.as_ref()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{ImplicitEvaluator, Primitive};
    use crate::zone::Operation;
    use nalgebra::Vector3;

    const DOCUMENT: &str = r#"{
        "shapes": [
            {"id": 1, "primitive": {"type": "cube", "size": [2.0, 2.0, 2.0], "center": true}, "position": [0.0, 0.0, 0.0]},
            {"id": 2, "primitive": {"type": "sphere", "r": 0.5, "fn_": 0}, "position": [1.0, 0.0, 0.0]}
        ],
        "zones": [
            {"name": "shell", "rows": [[{"shapeRef": 1, "mode": "union"}, {"shapeRef": 2, "mode": "subtraction"}]]}
        ]
    }"#;

    #[test]
    fn test_load_document() {
        let document = SceneDocument::from_json(DOCUMENT).unwrap();
        let mut scene = document
            .into_scene(Arc::new(ImplicitEvaluator::new()), EngineConfig::default())
            .unwrap();
        assert_eq!(scene.flush().unwrap(), 1);

        let (_, zone) = scene.zone_by_name("shell").unwrap();
        assert_eq!(zone.expression(), "+1 -2");
        assert_eq!(zone.subscriptions().count(ShapeId(2)), 1);
    }

    #[test]
    fn test_scene_round_trip() {
        let mut scene = Scene::new(Arc::new(ImplicitEvaluator::new()), EngineConfig::default());
        scene.add_shape(Shape::new(4, Primitive::cylinder(2.0, 1.0, 12), Vector3::zeros()));
        scene
            .add_zone_with_rows(
                "z",
                vec![Row::from_operations(vec![Operation::union(4), Operation::union(4)])],
            )
            .unwrap();

        let document = SceneDocument::from_scene(&scene);
        assert_eq!(document.zones[0].subscriptions[&ShapeId(4)], 2);

        let json = document.to_json().unwrap();
        let back = SceneDocument::from_json(&json).unwrap();
        assert_eq!(back, document);
    }

    #[test]
    fn test_unknown_shape_fails_to_restore() {
        let document = SceneDocument {
            shapes: vec![],
            zones: vec![ZoneEntry {
                name: "dangling".into(),
                rows: vec![Row::from_operations(vec![Operation::union(3)])],
                subscriptions: BTreeMap::new(),
            }],
        };
        let result = document.into_scene(Arc::new(ImplicitEvaluator::new()), EngineConfig::default());
        assert!(result.is_err());
    }
}
