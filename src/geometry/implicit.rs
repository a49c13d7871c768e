// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Implicit boolean solids
//!
//! Solids are expression trees over positioned shapes. Membership is exact
//! (closed-set semantics per shape), distances follow the usual min/max
//! combination and are bounds rather than exact values after a boolean.

use super::{BoundingBox, CsgEvaluator, Shape};
use nalgebra::Point3;
use rayon::prelude::*;
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub enum ImplicitSolid {
    #[default]
    Empty,
    Shape(Arc<Shape>),
    Union(Arc<ImplicitSolid>, Arc<ImplicitSolid>),
    Intersection(Arc<ImplicitSolid>, Arc<ImplicitSolid>),
    Difference(Arc<ImplicitSolid>, Arc<ImplicitSolid>),
}

impl ImplicitSolid {
    pub fn is_empty(&self) -> bool {
        matches!(self, ImplicitSolid::Empty)
    }

    pub fn contains(&self, p: &Point3<f64>) -> bool {
        match self {
            ImplicitSolid::Empty => false,
            ImplicitSolid::Shape(shape) => shape.contains(p),
            ImplicitSolid::Union(a, b) => a.contains(p) || b.contains(p),
            ImplicitSolid::Intersection(a, b) => a.contains(p) && b.contains(p),
            ImplicitSolid::Difference(a, b) => a.contains(p) && !b.contains(p),
        }
    }

    pub fn signed_distance(&self, p: &Point3<f64>) -> f64 {
        match self {
            ImplicitSolid::Empty => f64::INFINITY,
            ImplicitSolid::Shape(shape) => shape.signed_distance(p),
            ImplicitSolid::Union(a, b) => a.signed_distance(p).min(b.signed_distance(p)),
            ImplicitSolid::Intersection(a, b) => a.signed_distance(p).max(b.signed_distance(p)),
            ImplicitSolid::Difference(a, b) => a.signed_distance(p).max(-b.signed_distance(p)),
        }
    }

    /// Conservative bounds
    pub fn bounding_box(&self) -> BoundingBox {
        match self {
            ImplicitSolid::Empty => BoundingBox::empty(),
            ImplicitSolid::Shape(shape) => shape.bounding_box(),
            ImplicitSolid::Union(a, b) => a.bounding_box().union(&b.bounding_box()),
            ImplicitSolid::Intersection(a, b) => a.bounding_box().intersection(&b.bounding_box()),
            ImplicitSolid::Difference(a, _) => a.bounding_box(),
        }
    }

    /// Estimate the enclosed volume by sampling cell centers of a
    /// `resolution³` grid over the bounding box
    pub fn sample_volume(&self, resolution: usize) -> f64 {
        let bbox = self.bounding_box();
        if bbox.is_empty() || resolution == 0 {
            return 0.0;
        }
        let size = bbox.size();
        let step = size / resolution as f64;
        let inside: usize = (0..resolution)
            .into_par_iter()
            .map(|i| {
                let mut count = 0;
                for j in 0..resolution {
                    for k in 0..resolution {
                        let p = Point3::new(
                            bbox.min.x + (i as f64 + 0.5) * step.x,
                            bbox.min.y + (j as f64 + 0.5) * step.y,
                            bbox.min.z + (k as f64 + 0.5) * step.z,
                        );
                        if self.contains(&p) {
                            count += 1;
                        }
                    }
                }
                count
            })
            .sum();
        inside as f64 * step.x * step.y * step.z
    }
}

/// Evaluator producing [`ImplicitSolid`] trees
#[derive(Debug, Clone, Copy, Default)]
pub struct ImplicitEvaluator;

impl ImplicitEvaluator {
    pub fn new() -> Self {
        Self
    }
}

impl CsgEvaluator for ImplicitEvaluator {
    type Solid = ImplicitSolid;

    fn empty(&self) -> ImplicitSolid {
        ImplicitSolid::Empty
    }

    fn solid_from_shape(&self, shape: &Shape) -> ImplicitSolid {
        ImplicitSolid::Shape(Arc::new(shape.clone()))
    }

    fn union(&self, a: &ImplicitSolid, b: &ImplicitSolid) -> ImplicitSolid {
        match (a, b) {
            (ImplicitSolid::Empty, other) | (other, ImplicitSolid::Empty) => other.clone(),
            _ => ImplicitSolid::Union(Arc::new(a.clone()), Arc::new(b.clone())),
        }
    }

    fn intersect(&self, a: &ImplicitSolid, b: &ImplicitSolid) -> ImplicitSolid {
        if a.is_empty() || b.is_empty() {
            return ImplicitSolid::Empty;
        }
        ImplicitSolid::Intersection(Arc::new(a.clone()), Arc::new(b.clone()))
    }

    fn subtract(&self, a: &ImplicitSolid, b: &ImplicitSolid) -> ImplicitSolid {
        match (a, b) {
            (ImplicitSolid::Empty, _) => ImplicitSolid::Empty,
            (_, ImplicitSolid::Empty) => a.clone(),
            _ => ImplicitSolid::Difference(Arc::new(a.clone()), Arc::new(b.clone())),
        }
    }
}
