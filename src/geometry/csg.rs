// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! CSG (Constructive Solid Geometry) operations using BSP trees
//!
//! Solids are polygon soups with outward winding. Each boolean builds a BSP
//! tree per operand and clips one against the other, splitting polygons that
//! straddle a partition plane.

use super::{BoundingBox, CsgEvaluator, Mesh, MeshConversion, Shape, Triangle, Vertex};
use crate::zone::ShapeId;
use dashmap::DashMap;
use nalgebra::Vector3;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::trace;

const EPSILON: f64 = 1e-5;

const COPLANAR: u8 = 0;
const FRONT: u8 = 1;
const BACK: u8 = 2;
const SPANNING: u8 = 3;

#[derive(Debug, Clone, Copy)]
struct Plane {
    normal: Vector3<f64>,
    w: f64,
}

#[derive(Debug, Clone)]
struct Polygon {
    vertices: Vec<Vertex>,
    plane: Plane,
}

#[derive(Default)]
struct BspNode {
    plane: Option<Plane>,
    front: Option<Box<BspNode>>,
    back: Option<Box<BspNode>>,
    polygons: Vec<Polygon>,
}

/// Output buckets of a plane split
#[derive(Default)]
struct Split {
    coplanar_front: Vec<Polygon>,
    coplanar_back: Vec<Polygon>,
    front: Vec<Polygon>,
    back: Vec<Polygon>,
}

impl Plane {
    fn from_vertices(a: &Vertex, b: &Vertex, c: &Vertex) -> Option<Self> {
        let normal = (b.position - a.position).cross(&(c.position - a.position));
        let length = normal.norm();
        if length < 1e-12 {
            return None;
        }
        let normal = normal / length;
        Some(Self {
            normal,
            w: normal.dot(&a.position.coords),
        })
    }

    fn flip(&mut self) {
        self.normal = -self.normal;
        self.w = -self.w;
    }

    fn classify(&self, vertex: &Vertex) -> u8 {
        let t = self.normal.dot(&vertex.position.coords) - self.w;
        if t < -EPSILON {
            BACK
        } else if t > EPSILON {
            FRONT
        } else {
            COPLANAR
        }
    }

    fn split_polygon(&self, polygon: Polygon, out: &mut Split) {
        let types: Vec<u8> = polygon.vertices.iter().map(|v| self.classify(v)).collect();
        let polygon_type = types.iter().fold(COPLANAR, |acc, t| acc | t);

        match polygon_type {
            COPLANAR => {
                if self.normal.dot(&polygon.plane.normal) > 0.0 {
                    out.coplanar_front.push(polygon);
                } else {
                    out.coplanar_back.push(polygon);
                }
            }
            FRONT => out.front.push(polygon),
            BACK => out.back.push(polygon),
            _ => {
                let n = polygon.vertices.len();
                let mut f = Vec::with_capacity(n + 1);
                let mut b = Vec::with_capacity(n + 1);
                for i in 0..n {
                    let j = (i + 1) % n;
                    let (ti, tj) = (types[i], types[j]);
                    let (vi, vj) = (&polygon.vertices[i], &polygon.vertices[j]);
                    if ti != BACK {
                        f.push(*vi);
                    }
                    if ti != FRONT {
                        b.push(*vi);
                    }
                    if ti | tj == SPANNING {
                        let t = (self.w - self.normal.dot(&vi.position.coords))
                            / self.normal.dot(&(vj.position - vi.position));
                        let v = vi.interpolate(vj, t);
                        f.push(v);
                        b.push(v);
                    }
                }
                if f.len() >= 3 {
                    out.front.push(Polygon {
                        vertices: f,
                        plane: polygon.plane,
                    });
                }
                if b.len() >= 3 {
                    out.back.push(Polygon {
                        vertices: b,
                        plane: polygon.plane,
                    });
                }
            }
        }
    }
}

impl Polygon {
    fn flip(&mut self) {
        self.vertices.reverse();
        for vertex in &mut self.vertices {
            vertex.normal = -vertex.normal;
        }
        self.plane.flip();
    }
}

impl BspNode {
    fn new(polygons: Vec<Polygon>) -> Self {
        let mut node = Self::default();
        node.build(polygons);
        node
    }

    fn build(&mut self, polygons: Vec<Polygon>) {
        if polygons.is_empty() {
            return;
        }
        let plane = *self.plane.get_or_insert(polygons[0].plane);

        let mut split = Split::default();
        for polygon in polygons {
            plane.split_polygon(polygon, &mut split);
        }
        self.polygons.append(&mut split.coplanar_front);
        self.polygons.append(&mut split.coplanar_back);

        if !split.front.is_empty() {
            self.front
                .get_or_insert_with(Default::default)
                .build(split.front);
        }
        if !split.back.is_empty() {
            self.back
                .get_or_insert_with(Default::default)
                .build(split.back);
        }
    }

    fn invert(&mut self) {
        for polygon in &mut self.polygons {
            polygon.flip();
        }
        if let Some(plane) = self.plane.as_mut() {
            plane.flip();
        }
        if let Some(front) = self.front.as_mut() {
            front.invert();
        }
        if let Some(back) = self.back.as_mut() {
            back.invert();
        }
        std::mem::swap(&mut self.front, &mut self.back);
    }

    /// Remove the parts of `polygons` inside this tree's solid
    fn clip_polygons(&self, polygons: Vec<Polygon>) -> Vec<Polygon> {
        let Some(plane) = self.plane else {
            return polygons;
        };

        let mut split = Split::default();
        for polygon in polygons {
            plane.split_polygon(polygon, &mut split);
        }
        let mut front = split.front;
        front.append(&mut split.coplanar_front);
        let mut back = split.back;
        back.append(&mut split.coplanar_back);

        let mut front = match &self.front {
            Some(node) => node.clip_polygons(front),
            None => front,
        };
        let back = match &self.back {
            Some(node) => node.clip_polygons(back),
            None => Vec::new(),
        };
        front.extend(back);
        front
    }

    fn clip_to(&mut self, bsp: &BspNode) {
        self.polygons = bsp.clip_polygons(std::mem::take(&mut self.polygons));
        if let Some(front) = self.front.as_mut() {
            front.clip_to(bsp);
        }
        if let Some(back) = self.back.as_mut() {
            back.clip_to(bsp);
        }
    }

    fn all_polygons(&self) -> Vec<Polygon> {
        let mut result = self.polygons.clone();
        if let Some(front) = &self.front {
            result.extend(front.all_polygons());
        }
        if let Some(back) = &self.back {
            result.extend(back.all_polygons());
        }
        result
    }
}

/// Polygon soup produced by [`MeshEvaluator`]
#[derive(Debug, Clone, Default)]
pub struct MeshSolid {
    polygons: Arc<Vec<Polygon>>,
}

impl MeshSolid {
    fn from_polygons(polygons: Vec<Polygon>) -> Self {
        Self {
            polygons: Arc::new(polygons),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.polygons.is_empty()
    }

    pub fn polygon_count(&self) -> usize {
        self.polygons.len()
    }

    pub fn bounding_box(&self) -> BoundingBox {
        let mut bbox = BoundingBox::empty();
        for polygon in self.polygons.iter() {
            for vertex in &polygon.vertices {
                bbox.expand_to_include(&vertex.position);
            }
        }
        bbox
    }

    fn to_tree(&self) -> BspNode {
        BspNode::new(self.polygons.as_ref().clone())
    }
}

/// Cache statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub cached_shapes: usize,
    pub hits: usize,
    pub misses: usize,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f32 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.hits as f32 / total as f32) * 100.0
        }
    }
}

/// BSP mesh evaluator with a per-shape tessellation cache
pub struct MeshEvaluator {
    segments: u32,
    cache: DashMap<(ShapeId, u64), MeshSolid>,
    hits: AtomicUsize,
    misses: AtomicUsize,
}

impl MeshEvaluator {
    /// `segments` tessellates curved primitives that do not set their own count
    pub fn new(segments: u32) -> Self {
        Self {
            segments,
            cache: DashMap::new(),
            hits: AtomicUsize::new(0),
            misses: AtomicUsize::new(0),
        }
    }

    pub fn segments(&self) -> u32 {
        self.segments
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    pub fn cache_stats(&self) -> CacheStats {
        CacheStats {
            cached_shapes: self.cache.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

impl Default for MeshEvaluator {
    fn default() -> Self {
        Self::new(24)
    }
}

fn disjoint(a: &MeshSolid, b: &MeshSolid) -> bool {
    a.bounding_box().intersection(&b.bounding_box()).is_empty()
}

impl CsgEvaluator for MeshEvaluator {
    type Solid = MeshSolid;

    fn empty(&self) -> MeshSolid {
        MeshSolid::default()
    }

    fn solid_from_shape(&self, shape: &Shape) -> MeshSolid {
        let key = (shape.id, shape.revision);
        if let Some(solid) = self.cache.get(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return solid.clone();
        }
        self.misses.fetch_add(1, Ordering::Relaxed);
        trace!(shape = %shape.id, revision = shape.revision, "tessellating shape");
        let solid = self.from_mesh(&shape.to_mesh(self.segments));
        self.cache.retain(|(id, _), _| *id != shape.id);
        self.cache.insert(key, solid.clone());
        solid
    }

    /// Drop cached tessellations of a shape, any revision
    fn forget(&self, id: ShapeId) {
        self.cache.retain(|(shape, _), _| *shape != id);
    }

    fn union(&self, a: &MeshSolid, b: &MeshSolid) -> MeshSolid {
        if a.is_empty() {
            return b.clone();
        }
        if b.is_empty() {
            return a.clone();
        }
        if disjoint(a, b) {
            let mut polygons = a.polygons.as_ref().clone();
            polygons.extend(b.polygons.iter().cloned());
            return MeshSolid::from_polygons(polygons);
        }

        let mut a = a.to_tree();
        let mut b = b.to_tree();
        a.clip_to(&b);
        b.clip_to(&a);
        b.invert();
        b.clip_to(&a);
        b.invert();
        a.build(b.all_polygons());
        MeshSolid::from_polygons(a.all_polygons())
    }

    fn intersect(&self, a: &MeshSolid, b: &MeshSolid) -> MeshSolid {
        if a.is_empty() || b.is_empty() || disjoint(a, b) {
            return MeshSolid::default();
        }

        let mut a = a.to_tree();
        let mut b = b.to_tree();
        a.invert();
        b.clip_to(&a);
        b.invert();
        a.clip_to(&b);
        b.clip_to(&a);
        a.build(b.all_polygons());
        a.invert();
        MeshSolid::from_polygons(a.all_polygons())
    }

    fn subtract(&self, a: &MeshSolid, b: &MeshSolid) -> MeshSolid {
        if a.is_empty() {
            return MeshSolid::default();
        }
        if b.is_empty() || disjoint(a, b) {
            return a.clone();
        }

        let mut a = a.to_tree();
        let mut b = b.to_tree();
        a.invert();
        a.clip_to(&b);
        b.clip_to(&a);
        b.invert();
        b.clip_to(&a);
        b.invert();
        a.build(b.all_polygons());
        a.invert();
        MeshSolid::from_polygons(a.all_polygons())
    }
}

impl MeshConversion for MeshEvaluator {
    /// Degenerate triangles are dropped; they carry no plane
    fn from_mesh(&self, mesh: &Mesh) -> MeshSolid {
        let polygons = mesh
            .triangles
            .iter()
            .filter_map(|tri| {
                let [a, b, c] = tri.indices.map(|i| mesh.vertices[i]);
                Plane::from_vertices(&a, &b, &c).map(|plane| Polygon {
                    vertices: vec![a, b, c],
                    plane,
                })
            })
            .collect();
        MeshSolid::from_polygons(polygons)
    }

    /// Fan-triangulates every polygon
    fn to_mesh(&self, solid: &MeshSolid) -> Mesh {
        let mut mesh = Mesh::new();
        for polygon in solid.polygons.iter() {
            let base = mesh.vertex_count();
            for vertex in &polygon.vertices {
                mesh.add_vertex(*vertex);
            }
            for k in 1..polygon.vertices.len() - 1 {
                mesh.add_triangle(Triangle::new([base, base + k, base + k + 1]));
            }
        }
        mesh
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Primitive;
    use approx::assert_relative_eq;

    fn cube_at(id: u32, x: f64, y: f64, z: f64) -> Shape {
        Shape::new(
            id,
            Primitive::cube(Vector3::new(2.0, 2.0, 2.0), false),
            Vector3::new(x, y, z),
        )
    }

    fn volume(evaluator: &MeshEvaluator, solid: &MeshSolid) -> f64 {
        evaluator.to_mesh(solid).signed_volume()
    }

    #[test]
    fn test_overlapping_cubes() {
        let evaluator = MeshEvaluator::default();
        let a = evaluator.solid_from_shape(&cube_at(1, 0.0, 0.0, 0.0));
        let b = evaluator.solid_from_shape(&cube_at(2, 1.0, 1.0, 1.0));

        assert_relative_eq!(volume(&evaluator, &evaluator.union(&a, &b)), 15.0, epsilon = 1e-6);
        assert_relative_eq!(volume(&evaluator, &evaluator.intersect(&a, &b)), 1.0, epsilon = 1e-6);
        assert_relative_eq!(volume(&evaluator, &evaluator.subtract(&a, &b)), 7.0, epsilon = 1e-6);
        assert_relative_eq!(volume(&evaluator, &evaluator.subtract(&b, &a)), 7.0, epsilon = 1e-6);
    }

    #[test]
    fn test_disjoint_shortcuts() {
        let evaluator = MeshEvaluator::default();
        let a = evaluator.solid_from_shape(&cube_at(1, 0.0, 0.0, 0.0));
        let b = evaluator.solid_from_shape(&cube_at(2, 5.0, 0.0, 0.0));

        assert_relative_eq!(volume(&evaluator, &evaluator.union(&a, &b)), 16.0, epsilon = 1e-6);
        assert!(evaluator.intersect(&a, &b).is_empty());
        assert_eq!(evaluator.subtract(&a, &b).polygon_count(), a.polygon_count());
    }

    #[test]
    fn test_sphere_carved_from_cube() {
        let evaluator = MeshEvaluator::new(16);
        let cube = Shape::new(
            1,
            Primitive::cube(Vector3::new(4.0, 4.0, 4.0), true),
            Vector3::zeros(),
        );
        let sphere = Shape::new(2, Primitive::sphere(1.0, 0), Vector3::zeros());
        let a = evaluator.solid_from_shape(&cube);
        let b = evaluator.solid_from_shape(&sphere);

        let sphere_volume = volume(&evaluator, &b);
        let carved = volume(&evaluator, &evaluator.subtract(&a, &b));
        assert_relative_eq!(carved, 64.0 - sphere_volume, epsilon = 1e-6);
    }

    #[test]
    fn test_cache_keyed_on_revision() {
        let evaluator = MeshEvaluator::default();
        let mut shape = cube_at(1, 0.0, 0.0, 0.0);
        evaluator.solid_from_shape(&shape);
        evaluator.solid_from_shape(&shape);
        shape.revision += 1;
        evaluator.solid_from_shape(&shape);

        let stats = evaluator.cache_stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 2);
        assert_eq!(stats.cached_shapes, 1);

        shape.revision -= 1;
        evaluator.solid_from_shape(&shape);
        assert_eq!(evaluator.cache_stats().misses, 3);
        assert_eq!(evaluator.cache_stats().cached_shapes, 1);

        evaluator.forget(ShapeId(1));
        assert_eq!(evaluator.cache_stats().cached_shapes, 0);
    }
}
