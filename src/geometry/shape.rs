// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Positioned shapes and the registry zones resolve them through

use super::{BoundingBox, Mesh, Primitive, ShapeResolver};
use crate::zone::ShapeId;
use ahash::AHashMap;
use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

/// A primitive placed in world space
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shape {
    pub id: ShapeId,
    pub primitive: Primitive,
    pub position: Vector3<f64>,
    /// Bumped on every geometry edit; evaluators key their caches on it
    #[serde(default)]
    pub revision: u64,
}

impl Shape {
    pub fn new(id: impl Into<ShapeId>, primitive: Primitive, position: Vector3<f64>) -> Self {
        Self {
            id: id.into(),
            primitive,
            position,
            revision: 0,
        }
    }

    pub fn contains(&self, p: &Point3<f64>) -> bool {
        self.primitive.contains(&(p - self.position))
    }

    pub fn signed_distance(&self, p: &Point3<f64>) -> f64 {
        self.primitive.signed_distance(&(p - self.position))
    }

    pub fn to_mesh(&self, default_segments: u32) -> Mesh {
        let mut mesh = self.primitive.to_mesh(default_segments);
        mesh.translate(&self.position);
        mesh
    }

    pub fn bounding_box(&self) -> BoundingBox {
        let (min, max) = self.primitive.extent();
        BoundingBox::new(min + self.position, max + self.position)
    }
}

/// Owns the shapes of a scene, keyed by id
#[derive(Debug, Clone, Default)]
pub struct ShapeRegistry {
    shapes: AHashMap<ShapeId, Shape>,
}

impl ShapeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace; returns the previous shape under the same id
    pub fn insert(&mut self, shape: Shape) -> Option<Shape> {
        self.shapes.insert(shape.id, shape)
    }

    pub fn get(&self, id: ShapeId) -> Option<&Shape> {
        self.shapes.get(&id)
    }

    /// Apply an edit and bump the revision. Returns false for unknown ids.
    pub fn update(&mut self, id: ShapeId, edit: impl FnOnce(&mut Shape)) -> bool {
        match self.shapes.get_mut(&id) {
            Some(shape) => {
                edit(shape);
                shape.id = id;
                shape.revision += 1;
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, id: ShapeId) -> Option<Shape> {
        self.shapes.remove(&id)
    }

    pub fn contains(&self, id: ShapeId) -> bool {
        self.shapes.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    /// Ids in ascending order
    pub fn ids(&self) -> Vec<ShapeId> {
        let mut ids: Vec<ShapeId> = self.shapes.keys().copied().collect();
        ids.sort();
        ids
    }

    /// Shapes in ascending id order
    pub fn shapes(&self) -> Vec<&Shape> {
        let mut shapes: Vec<&Shape> = self.shapes.values().collect();
        shapes.sort_by_key(|shape| shape.id);
        shapes
    }
}

impl ShapeResolver for ShapeRegistry {
    fn resolve(&self, id: ShapeId) -> Option<&Shape> {
        self.get(id)
    }
}

impl FromIterator<Shape> for ShapeRegistry {
    fn from_iter<I: IntoIterator<Item = Shape>>(iter: I) -> Self {
        Self {
            shapes: iter.into_iter().map(|shape| (shape.id, shape)).collect(),
        }
    }
}
