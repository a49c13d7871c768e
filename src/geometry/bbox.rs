// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Bounding box utilities

use super::Vertex;
use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min: Point3<f64>,
    pub max: Point3<f64>,
}

impl BoundingBox {
    pub fn new(min: Point3<f64>, max: Point3<f64>) -> Self {
        Self { min, max }
    }

    pub fn empty() -> Self {
        Self {
            min: Point3::new(f64::INFINITY, f64::INFINITY, f64::INFINITY),
            max: Point3::new(f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
        }
    }

    pub fn from_vertices(vertices: &[Vertex]) -> Self {
        let mut bbox = Self::empty();
        for vertex in vertices {
            bbox.expand_to_include(&vertex.position);
        }
        bbox
    }

    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    pub fn expand_to_include(&mut self, point: &Point3<f64>) {
        self.min = self.min.inf(point);
        self.max = self.max.sup(point);
    }

    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox::new(self.min.inf(&other.min), self.max.sup(&other.max))
    }

    pub fn intersection(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox::new(self.min.sup(&other.min), self.max.inf(&other.max))
    }

    pub fn contains(&self, point: &Point3<f64>) -> bool {
        (0..3).all(|i| point[i] >= self.min[i] && point[i] <= self.max[i])
    }

    pub fn center(&self) -> Point3<f64> {
        nalgebra::center(&self.min, &self.max)
    }

    pub fn size(&self) -> Vector3<f64> {
        self.max - self.min
    }

    pub fn volume(&self) -> f64 {
        if self.is_empty() {
            return 0.0;
        }
        let size = self.size();
        size.x * size.y * size.z
    }

    /// Check if two bounding boxes are approximately equal within tolerance
    pub fn approx_eq(&self, other: &BoundingBox, tolerance: f64) -> bool {
        (self.min - other.min).amax() < tolerance && (self.max - other.max).amax() < tolerance
    }
}
