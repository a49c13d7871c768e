// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Command execution over scene documents

use crate::config::EngineConfig;
use crate::geometry::{ImplicitEvaluator, MeshEvaluator};
use crate::io::{GeoCardWriter, SceneDocument, ZoneState};
use crate::zone::{Row, ShapeId};
use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Result of checking one zone
#[derive(Debug, Clone, PartialEq)]
pub struct CheckReport {
    pub zone: String,
    pub issues: Vec<String>,
}

impl CheckReport {
    pub fn passed(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Mesh statistics of one rendered zone
#[derive(Debug, Clone)]
pub struct RenderReport {
    pub zone: String,
    pub vertices: usize,
    pub triangles: usize,
    pub volume: f64,
    pub duration: Duration,
}

/// Runner for executing CLI commands
pub struct Runner {
    config: EngineConfig,
}

impl Runner {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn load(&self, path: &Path) -> Result<SceneDocument> {
        SceneDocument::load(path)
    }

    /// Textual definition of every zone, in document order
    pub fn export(&self, document: &SceneDocument) -> Vec<(String, String)> {
        document
            .zones
            .iter()
            .map(|entry| (entry.name.clone(), crate::dnf::zone_to_expression(&entry.rows)))
            .collect()
    }

    pub fn geo_card(&self, document: &SceneDocument) -> String {
        GeoCardWriter::from_config(&self.config)
            .render_zones(document.zones.iter().map(|entry| entry.rows.as_slice()))
    }

    /// Validate every zone: row heads, subscription counts, shape references
    /// and a lossless state round trip. Finishes with a full recompute.
    pub fn check(&self, document: &SceneDocument) -> Result<Vec<CheckReport>> {
        let mut reports = Vec::with_capacity(document.zones.len());
        for entry in &document.zones {
            let mut issues = Vec::new();
            let state = entry.state();

            if let Err(err) = state.validate() {
                issues.push(err.to_string());
            }
            for id in referenced_shapes(&entry.rows) {
                if !document.shapes.iter().any(|shape| shape.id == id) {
                    issues.push(format!("shape {id} is not defined in the document"));
                }
            }
            let round_trip = ZoneState::from_json(&state.to_json()?)?;
            if round_trip != state {
                issues.push("state does not survive a JSON round trip".to_string());
            }

            reports.push(CheckReport {
                zone: entry.name.clone(),
                issues,
            });
        }

        if reports.iter().all(CheckReport::passed) {
            let mut scene = document
                .clone()
                .into_scene(Arc::new(ImplicitEvaluator::new()), self.config.clone())?;
            scene.flush().context("Failed to recompute zones")?;
        }
        Ok(reports)
    }

    /// Recompute every zone with the mesh evaluator
    pub fn render(&self, document: &SceneDocument) -> Result<Vec<RenderReport>> {
        let evaluator = Arc::new(MeshEvaluator::new(self.config.mesh_segments));
        let mut scene = document.clone().into_scene(evaluator, self.config.clone())?;

        let handles: Vec<_> = scene.zones().map(|(handle, _)| handle).collect();
        let mut reports = Vec::with_capacity(handles.len());
        for handle in handles {
            let start = Instant::now();
            scene
                .recompute_zone(handle)
                .with_context(|| format!("Failed to render {handle}"))?;
            let duration = start.elapsed();

            if let Some(zone) = scene.zone(handle) {
                let mesh = zone.mesh();
                reports.push(RenderReport {
                    zone: zone.name().to_string(),
                    vertices: mesh.vertex_count(),
                    triangles: mesh.triangle_count(),
                    volume: mesh.signed_volume(),
                    duration,
                });
            }
        }
        Ok(reports)
    }
}

impl Default for Runner {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

fn referenced_shapes(rows: &[Row]) -> Vec<ShapeId> {
    let mut ids: Vec<_> = rows.iter().flat_map(|row| row.iter()).map(|op| op.shape_ref).collect();
    ids.sort();
    ids.dedup();
    ids
}
