// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Mesh representation and utilities

use super::BoundingBox;
use nalgebra::{Matrix4, Point3, Vector3};
use serde::{Deserialize, Serialize};

/// Vertex with position and normal
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vertex {
    pub position: Point3<f64>,
    pub normal: Vector3<f64>,
}

impl Vertex {
    pub fn new(position: Point3<f64>, normal: Vector3<f64>) -> Self {
        Self { position, normal }
    }

    pub fn transform(&mut self, matrix: &Matrix4<f64>) {
        self.position = matrix.transform_point(&self.position);
        // Normals go through the inverse transpose
        let normal_matrix = matrix
            .try_inverse()
            .map(|m| m.transpose())
            .unwrap_or(*matrix);
        self.normal = normal_matrix.transform_vector(&self.normal).normalize();
    }

    /// Linear interpolation of position and normal
    pub fn interpolate(&self, other: &Vertex, t: f64) -> Vertex {
        Vertex {
            position: self.position + (other.position - self.position) * t,
            normal: self.normal + (other.normal - self.normal) * t,
        }
    }
}

/// Triangle defined by three vertex indices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Triangle {
    pub indices: [usize; 3],
}

impl Triangle {
    pub fn new(indices: [usize; 3]) -> Self {
        Self { indices }
    }
}

/// Triangular mesh
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub triangles: Vec<Triangle>,
}

impl Mesh {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn empty() -> Self {
        Self::new()
    }

    pub fn with_capacity(vertex_count: usize, triangle_count: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(vertex_count),
            triangles: Vec::with_capacity(triangle_count),
        }
    }

    /// Add a vertex and return its index
    pub fn add_vertex(&mut self, vertex: Vertex) -> usize {
        let index = self.vertices.len();
        self.vertices.push(vertex);
        index
    }

    pub fn add_triangle(&mut self, triangle: Triangle) {
        self.triangles.push(triangle);
    }

    /// Transform all vertices by a matrix
    pub fn transform(&mut self, matrix: &Matrix4<f64>) {
        for vertex in &mut self.vertices {
            vertex.transform(matrix);
        }
    }

    pub fn translate(&mut self, offset: &Vector3<f64>) {
        for vertex in &mut self.vertices {
            vertex.position += offset;
        }
    }

    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::from_vertices(&self.vertices)
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// Append another mesh without any boolean processing
    pub fn merge(&mut self, other: &Mesh) {
        let offset = self.vertices.len();
        self.vertices.extend_from_slice(&other.vertices);

        for triangle in &other.triangles {
            self.triangles.push(Triangle::new([
                triangle.indices[0] + offset,
                triangle.indices[1] + offset,
                triangle.indices[2] + offset,
            ]));
        }
    }

    /// Enclosed volume, by summing signed tetrahedra against the origin.
    /// Positive for outward-facing winding.
    pub fn signed_volume(&self) -> f64 {
        self.triangles
            .iter()
            .map(|tri| {
                let [a, b, c] = self.corners(tri);
                a.coords.dot(&b.coords.cross(&c.coords)) / 6.0
            })
            .sum()
    }

    pub fn surface_area(&self) -> f64 {
        self.triangles
            .iter()
            .map(|tri| {
                let [a, b, c] = self.corners(tri);
                (b - a).cross(&(c - a)).norm() / 2.0
            })
            .sum()
    }

    /// Recompute vertex normals as area-weighted averages of face normals
    pub fn recompute_normals(&mut self) {
        if self.vertices.is_empty() || self.triangles.is_empty() {
            return;
        }

        let mut sums: Vec<Vector3<f64>> = vec![Vector3::zeros(); self.vertices.len()];
        for triangle in &self.triangles {
            let [a, b, c] = self.corners(triangle);
            // Unnormalized cross product is already area weighted
            let face = (b - a).cross(&(c - a));
            if face.norm() > 1e-12 {
                for &idx in &triangle.indices {
                    sums[idx] += face;
                }
            }
        }

        for (vertex, sum) in self.vertices.iter_mut().zip(sums) {
            vertex.normal = if sum.norm() > 0.0 {
                sum.normalize()
            } else {
                Vector3::new(0.0, 0.0, 1.0)
            };
        }
    }

    fn corners(&self, triangle: &Triangle) -> [Point3<f64>; 3] {
        triangle.indices.map(|i| self.vertices[i].position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Primitive;
    use approx::assert_relative_eq;

    #[test]
    fn test_cube_volume_and_area() {
        let mesh = Primitive::cube(Vector3::new(2.0, 3.0, 4.0), false).to_mesh(16);
        assert_relative_eq!(mesh.signed_volume(), 24.0, epsilon = 1e-9);
        assert_relative_eq!(mesh.surface_area(), 52.0, epsilon = 1e-9);
    }

    #[test]
    fn test_merge_offsets_indices() {
        let a = Primitive::cube(Vector3::new(1.0, 1.0, 1.0), true).to_mesh(16);
        let mut b = a.clone();
        b.translate(&Vector3::new(5.0, 0.0, 0.0));

        let mut merged = a.clone();
        merged.merge(&b);
        assert_eq!(merged.vertex_count(), a.vertex_count() * 2);
        assert_relative_eq!(merged.signed_volume(), 2.0, epsilon = 1e-9);
        assert!(merged.triangles.iter().all(|t| t.indices.iter().all(|&i| i < merged.vertex_count())));
    }

    #[test]
    fn test_recompute_normals_point_outward() {
        let mut mesh = Primitive::cube(Vector3::new(2.0, 2.0, 2.0), true).to_mesh(16);
        mesh.recompute_normals();
        for vertex in &mesh.vertices {
            assert!(vertex.normal.dot(&vertex.position.coords) > 0.0);
        }
    }
}
