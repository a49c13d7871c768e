// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Scene: shape registry plus the zones that reference it
//!
//! The scene is the owner zones report to. Shape edits fan out to every zone,
//! shape removal is announced to every zone before the shape is dropped, and
//! zones that report themselves emptied are removed.

use crate::config::EngineConfig;
use crate::error::{ZoneError, ZoneResult};
use crate::geometry::{CsgEvaluator, Shape, ShapeRegistry};
use crate::zone::{Clock, Row, ShapeId, SystemClock, Zone, ZoneEvent};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

/// Stable identifier of a zone within its scene
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ZoneHandle(pub u64);

impl fmt::Display for ZoneHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "zone#{}", self.0)
    }
}

pub struct Scene<E: CsgEvaluator> {
    shapes: ShapeRegistry,
    zones: Vec<(ZoneHandle, Zone<E>)>,
    evaluator: Arc<E>,
    config: EngineConfig,
    clock: Arc<dyn Clock>,
    next_handle: u64,
    events: Vec<(ZoneHandle, ZoneEvent)>,
}

impl<E: CsgEvaluator> Scene<E> {
    pub fn new(evaluator: Arc<E>, config: EngineConfig) -> Self {
        Self::with_clock(evaluator, config, Arc::new(SystemClock))
    }

    pub fn with_clock(evaluator: Arc<E>, config: EngineConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            shapes: ShapeRegistry::new(),
            zones: Vec::new(),
            evaluator,
            config,
            clock,
            next_handle: 0,
            events: Vec::new(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn evaluator(&self) -> &Arc<E> {
        &self.evaluator
    }

    pub fn shapes(&self) -> &ShapeRegistry {
        &self.shapes
    }

    pub fn shape(&self, id: ShapeId) -> Option<&Shape> {
        self.shapes.get(id)
    }

    /// Add a shape, or replace the one with the same id. A replacement counts
    /// as a geometry change for the zones referencing it.
    pub fn add_shape(&mut self, mut shape: Shape) -> Option<Shape> {
        let id = shape.id;
        if let Some(old) = self.shapes.get(id) {
            shape.revision = old.revision + 1;
        }
        let previous = self.shapes.insert(shape);
        if previous.is_some() {
            self.notify_shape_changed(id);
        }
        previous
    }

    /// Edit a shape in place and notify the zones that reference it.
    /// Returns false for unknown ids.
    pub fn update_shape(&mut self, id: ShapeId, edit: impl FnOnce(&mut Shape)) -> bool {
        if !self.shapes.update(id, edit) {
            return false;
        }
        self.notify_shape_changed(id);
        true
    }

    /// Remove a shape. Every zone drops its slots for it first; zones left
    /// without rows are removed from the scene.
    pub fn remove_shape(&mut self, id: ShapeId) -> ZoneResult<Option<Shape>> {
        if !self.shapes.contains(id) {
            return Ok(None);
        }
        for (_, zone) in &mut self.zones {
            zone.on_external_shape_removed(id)?;
        }
        let removed = self.shapes.remove(id);
        self.evaluator.forget(id);
        self.collect_events();
        Ok(removed)
    }

    /// Add a zone holding one empty row
    pub fn add_zone(&mut self, name: impl Into<String>) -> ZoneHandle {
        let zone = Zone::with_clock(
            name,
            self.evaluator.clone(),
            &self.config,
            self.clock.clone(),
        );
        self.insert_zone(zone)
    }

    /// Add a zone with prepared rows. Every referenced shape must exist.
    pub fn add_zone_with_rows(
        &mut self,
        name: impl Into<String>,
        rows: Vec<Row>,
    ) -> ZoneResult<ZoneHandle> {
        if let Some(missing) = rows
            .iter()
            .flat_map(|row| row.iter())
            .map(|op| op.shape_ref)
            .find(|id| !self.shapes.contains(*id))
        {
            return Err(ZoneError::UnresolvedShape(missing));
        }
        let zone = Zone::from_rows(
            name,
            rows,
            self.evaluator.clone(),
            &self.config,
            self.clock.clone(),
        )?;
        Ok(self.insert_zone(zone))
    }

    pub fn remove_zone(&mut self, handle: ZoneHandle) -> Option<Zone<E>> {
        let index = self.zones.iter().position(|(h, _)| *h == handle)?;
        Some(self.zones.remove(index).1)
    }

    pub fn zone(&self, handle: ZoneHandle) -> Option<&Zone<E>> {
        self.zones.iter().find(|(h, _)| *h == handle).map(|(_, z)| z)
    }

    pub fn zone_mut(&mut self, handle: ZoneHandle) -> Option<&mut Zone<E>> {
        self.zones
            .iter_mut()
            .find(|(h, _)| *h == handle)
            .map(|(_, z)| z)
    }

    /// First zone with the given name
    pub fn zone_by_name(&self, name: &str) -> Option<(ZoneHandle, &Zone<E>)> {
        self.zones
            .iter()
            .find(|(_, z)| z.name() == name)
            .map(|(h, z)| (*h, z))
    }

    /// Zones in insertion order
    pub fn zones(&self) -> impl Iterator<Item = (ZoneHandle, &Zone<E>)> {
        self.zones.iter().map(|(h, z)| (*h, z))
    }

    pub fn zone_count(&self) -> usize {
        self.zones.len()
    }

    /// Run every recompute whose window has passed. Returns how many zones
    /// got a new solid.
    pub fn poll(&mut self) -> ZoneResult<usize> {
        let mut updated = 0;
        for (_, zone) in &mut self.zones {
            if zone.poll(&self.shapes)? {
                updated += 1;
            }
        }
        self.collect_events();
        Ok(updated)
    }

    /// Run every pending recompute now
    pub fn flush(&mut self) -> ZoneResult<usize> {
        let mut updated = 0;
        for (_, zone) in &mut self.zones {
            if zone.flush(&self.shapes)? {
                updated += 1;
            }
        }
        self.collect_events();
        Ok(updated)
    }

    /// Recompute one zone immediately. Returns false for unknown handles.
    pub fn recompute_zone(&mut self, handle: ZoneHandle) -> ZoneResult<bool> {
        let Some((_, zone)) = self.zones.iter_mut().find(|(h, _)| *h == handle) else {
            return Ok(false);
        };
        zone.recompute(&self.shapes)?;
        self.collect_events();
        Ok(true)
    }

    /// Take every event raised since the last drain, tagged with its zone
    pub fn drain_events(&mut self) -> Vec<(ZoneHandle, ZoneEvent)> {
        self.collect_events();
        std::mem::take(&mut self.events)
    }

    fn insert_zone(&mut self, zone: Zone<E>) -> ZoneHandle {
        let handle = ZoneHandle(self.next_handle);
        self.next_handle += 1;
        debug!(%handle, zone = zone.name(), "zone added");
        self.zones.push((handle, zone));
        handle
    }

    fn notify_shape_changed(&mut self, id: ShapeId) {
        for (_, zone) in &mut self.zones {
            zone.on_external_shape_changed(id);
        }
    }

    /// Move zone events into the scene queue and drop emptied zones
    fn collect_events(&mut self) {
        let mut emptied = Vec::new();
        for (handle, zone) in &mut self.zones {
            for event in zone.drain_events() {
                if event == ZoneEvent::Emptied {
                    emptied.push(*handle);
                }
                self.events.push((*handle, event));
            }
        }
        for handle in emptied {
            if let Some(zone) = self.remove_zone(handle) {
                info!(%handle, zone = zone.name(), "dropping emptied zone");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{ImplicitEvaluator, Primitive};
    use crate::zone::{ManualClock, Operation};
    use nalgebra::{Point3, Vector3};
    use std::time::Duration;

    fn scene() -> (Scene<ImplicitEvaluator>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        let mut scene = Scene::with_clock(
            Arc::new(ImplicitEvaluator::new()),
            EngineConfig::default(),
            clock.clone(),
        );
        scene.add_shape(Shape::new(1, Primitive::sphere(1.0, 0), Vector3::zeros()));
        scene.add_shape(Shape::new(2, Primitive::sphere(1.0, 0), Vector3::new(5.0, 0.0, 0.0)));
        (scene, clock)
    }

    #[test]
    fn test_shape_update_reaches_subscribed_zones_only() {
        let (mut scene, clock) = scene();
        let a = scene
            .add_zone_with_rows("a", vec![Row::from_operations(vec![Operation::union(1)])])
            .unwrap();
        let b = scene
            .add_zone_with_rows("b", vec![Row::from_operations(vec![Operation::union(2)])])
            .unwrap();
        scene.flush().unwrap();
        scene.drain_events();

        assert!(scene.update_shape(ShapeId(1), |shape| shape.position.x = 1.0));
        assert!(scene.zone(a).unwrap().is_recompute_pending());
        assert!(!scene.zone(b).unwrap().is_recompute_pending());

        assert_eq!(scene.poll().unwrap(), 0);
        clock.advance(Duration::from_millis(200));
        assert_eq!(scene.poll().unwrap(), 1);
        assert_eq!(scene.drain_events(), vec![(a, ZoneEvent::GeometryChanged)]);

        let zone = scene.zone(a).unwrap();
        assert!(zone.solid().contains(&Point3::new(1.9, 0.0, 0.0)));
    }

    #[test]
    fn test_removing_last_shape_drops_zone() {
        let (mut scene, _clock) = scene();
        let a = scene
            .add_zone_with_rows("a", vec![Row::from_operations(vec![Operation::union(1)])])
            .unwrap();
        let b = scene
            .add_zone_with_rows(
                "b",
                vec![Row::from_operations(vec![
                    Operation::union(2),
                    Operation::subtraction(1),
                ])],
            )
            .unwrap();
        scene.drain_events();

        assert!(scene.remove_shape(ShapeId(1)).unwrap().is_some());
        assert!(scene.zone(a).is_none());
        assert!(scene.shape(ShapeId(1)).is_none());

        let zone = scene.zone(b).unwrap();
        assert_eq!(zone.expression(), "+2");

        let events = scene.drain_events();
        assert!(events.contains(&(a, ZoneEvent::Emptied)));
        assert!(events.contains(&(b, ZoneEvent::DefinitionChanged)));

        // Unknown shapes are a no-op
        assert!(scene.remove_shape(ShapeId(1)).unwrap().is_none());
    }

    #[test]
    fn test_rows_must_reference_known_shapes() {
        let (mut scene, _clock) = scene();
        let err = scene
            .add_zone_with_rows("c", vec![Row::from_operations(vec![Operation::union(9)])])
            .unwrap_err();
        assert_eq!(err, ZoneError::UnresolvedShape(ShapeId(9)));
        assert_eq!(scene.zone_count(), 0);
    }

    #[test]
    fn test_zone_lookup() {
        let (mut scene, _clock) = scene();
        let first = scene.add_zone("target");
        let second = scene.add_zone("other");
        assert_ne!(first, second);
        assert_eq!(scene.zone_by_name("other").map(|(h, _)| h), Some(second));

        scene
            .zone_mut(first)
            .unwrap()
            .add_operation(0, Operation::union(2))
            .unwrap();
        assert_eq!(scene.zone(first).unwrap().expression(), "+2");
        assert!(scene.remove_zone(first).is_some());
        assert!(scene.zone_by_name("target").is_none());
    }
}
