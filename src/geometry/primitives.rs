// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Geometric primitives: point membership, distance bounds and tessellation
//!
//! All primitives live in their local frame. Cubes span `[0, size]` unless
//! centered; cylinders and cones stand on the xy plane and extend to `z = h`.

use super::{Mesh, Triangle, Vertex};
use nalgebra::{Point3, Vector2, Vector3};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Geometric primitives
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Primitive {
    Cube { size: Vector3<f64>, center: bool },
    Sphere { r: f64, fn_: u32 },
    Cylinder { h: f64, r: f64, fn_: u32 },
    Cone { h: f64, r1: f64, r2: f64, fn_: u32 },
}

impl Primitive {
    pub fn cube(size: Vector3<f64>, center: bool) -> Self {
        Self::Cube { size, center }
    }

    /// `fn_ == 0` defers the segment count to the evaluator
    pub fn sphere(r: f64, fn_: u32) -> Self {
        Self::Sphere { r, fn_ }
    }

    pub fn cylinder(h: f64, r: f64, fn_: u32) -> Self {
        Self::Cylinder { h, r, fn_ }
    }

    pub fn cone(h: f64, r1: f64, r2: f64, fn_: u32) -> Self {
        Self::Cone { h, r1, r2, fn_ }
    }

    /// Closed point membership in the local frame
    pub fn contains(&self, p: &Point3<f64>) -> bool {
        match self {
            Self::Cube { size, center } => {
                let (min, max) = cube_extent(size, *center);
                (0..3).all(|i| p[i] >= min[i] && p[i] <= max[i])
            }
            Self::Sphere { r, .. } => p.coords.norm_squared() <= r * r,
            Self::Cylinder { h, r, .. } => {
                p.z >= 0.0 && p.z <= *h && p.x * p.x + p.y * p.y <= r * r
            }
            Self::Cone { h, r1, r2, .. } => {
                if p.z < 0.0 || p.z > *h || *h <= 0.0 {
                    return false;
                }
                let r = r1 + (r2 - r1) * (p.z / h);
                p.x * p.x + p.y * p.y <= r * r
            }
        }
    }

    /// Signed distance (negative inside). Exact for cubes, spheres and
    /// cylinders; a lower-bound style estimate for cones.
    pub fn signed_distance(&self, p: &Point3<f64>) -> f64 {
        match self {
            Self::Cube { size, center } => {
                let (min, max) = cube_extent(size, *center);
                let half = (max - min) / 2.0;
                let local = p - (min + half);
                let q = local.abs() - half;
                q.sup(&Vector3::zeros()).norm() + q.max().min(0.0)
            }
            Self::Sphere { r, .. } => p.coords.norm() - r,
            Self::Cylinder { h, r, .. } => {
                let half = h / 2.0;
                let d = Vector2::new(
                    Vector2::new(p.x, p.y).norm() - r,
                    (p.z - half).abs() - half,
                );
                d.sup(&Vector2::zeros()).norm() + d.max().min(0.0)
            }
            Self::Cone { h, r1, r2, .. } => {
                let half = h / 2.0;
                let t = (p.z / h).clamp(0.0, 1.0);
                let r = r1 + (r2 - r1) * t;
                let radial = Vector2::new(p.x, p.y).norm() - r;
                radial.max((p.z - half).abs() - half)
            }
        }
    }

    /// Local-frame bounds as (min, max)
    pub fn extent(&self) -> (Point3<f64>, Point3<f64>) {
        match self {
            Self::Cube { size, center } => cube_extent(size, *center),
            Self::Sphere { r, .. } => (Point3::new(-r, -r, -r), Point3::new(*r, *r, *r)),
            Self::Cylinder { h, r, .. } => (Point3::new(-r, -r, 0.0), Point3::new(*r, *r, *h)),
            Self::Cone { h, r1, r2, .. } => {
                let r = r1.max(*r2);
                (Point3::new(-r, -r, 0.0), Point3::new(r, r, *h))
            }
        }
    }

    /// Tessellate; `default_segments` applies when the primitive does not
    /// specify its own count
    pub fn to_mesh(&self, default_segments: u32) -> Mesh {
        let segments = |fn_: u32| if fn_ >= 3 { fn_ } else { default_segments.max(3) };
        match self {
            Self::Cube { size, center } => generate_cube_mesh(*size, *center),
            Self::Sphere { r, fn_ } => generate_sphere_mesh(*r, segments(*fn_)),
            Self::Cylinder { h, r, fn_ } => generate_cone_mesh(*h, *r, *r, segments(*fn_)),
            Self::Cone { h, r1, r2, fn_ } => generate_cone_mesh(*h, *r1, *r2, segments(*fn_)),
        }
    }
}

fn cube_extent(size: &Vector3<f64>, center: bool) -> (Point3<f64>, Point3<f64>) {
    if center {
        (Point3::from(-size / 2.0), Point3::from(size / 2.0))
    } else {
        (Point3::origin(), Point3::from(*size))
    }
}

fn generate_cube_mesh(size: Vector3<f64>, center: bool) -> Mesh {
    let mut mesh = Mesh::with_capacity(36, 12);
    let (min, max) = cube_extent(&size, center);

    let positions = [
        Point3::new(min.x, min.y, min.z),
        Point3::new(max.x, min.y, min.z),
        Point3::new(max.x, max.y, min.z),
        Point3::new(min.x, max.y, min.z),
        Point3::new(min.x, min.y, max.z),
        Point3::new(max.x, min.y, max.z),
        Point3::new(max.x, max.y, max.z),
        Point3::new(min.x, max.y, max.z),
    ];

    // Counter-clockwise seen from outside
    let faces = [
        ([4, 5, 6], Vector3::new(0.0, 0.0, 1.0)),
        ([4, 6, 7], Vector3::new(0.0, 0.0, 1.0)),
        ([1, 0, 3], Vector3::new(0.0, 0.0, -1.0)),
        ([1, 3, 2], Vector3::new(0.0, 0.0, -1.0)),
        ([5, 1, 2], Vector3::new(1.0, 0.0, 0.0)),
        ([5, 2, 6], Vector3::new(1.0, 0.0, 0.0)),
        ([0, 4, 7], Vector3::new(-1.0, 0.0, 0.0)),
        ([0, 7, 3], Vector3::new(-1.0, 0.0, 0.0)),
        ([7, 6, 2], Vector3::new(0.0, 1.0, 0.0)),
        ([7, 2, 3], Vector3::new(0.0, 1.0, 0.0)),
        ([0, 1, 5], Vector3::new(0.0, -1.0, 0.0)),
        ([0, 5, 4], Vector3::new(0.0, -1.0, 0.0)),
    ];

    for (indices, normal) in faces {
        let v0 = mesh.add_vertex(Vertex::new(positions[indices[0]], normal));
        let v1 = mesh.add_vertex(Vertex::new(positions[indices[1]], normal));
        let v2 = mesh.add_vertex(Vertex::new(positions[indices[2]], normal));
        mesh.add_triangle(Triangle::new([v0, v1, v2]));
    }

    mesh
}

fn generate_sphere_mesh(radius: f64, segments: u32) -> Mesh {
    let mut mesh = Mesh::new();
    let stacks = segments as usize;
    let slices = segments as usize;

    for i in 0..=stacks {
        let phi = PI * i as f64 / stacks as f64;
        let y = radius * phi.cos();
        let r = radius * phi.sin();

        for j in 0..=slices {
            let theta = 2.0 * PI * j as f64 / slices as f64;
            let normal = Vector3::new(phi.sin() * theta.cos(), phi.cos(), phi.sin() * theta.sin());
            let position = Point3::new(r * theta.cos(), y, r * theta.sin());
            mesh.add_vertex(Vertex::new(position, normal));
        }
    }

    // Pole rows collapse to a point; skip the zero-area half of those quads
    for i in 0..stacks {
        for j in 0..slices {
            let first = i * (slices + 1) + j;
            let second = first + slices + 1;

            if i != 0 {
                mesh.add_triangle(Triangle::new([first, first + 1, second]));
            }
            if i != stacks - 1 {
                mesh.add_triangle(Triangle::new([second, first + 1, second + 1]));
            }
        }
    }

    mesh
}

fn generate_cone_mesh(height: f64, r1: f64, r2: f64, segments: u32) -> Mesh {
    let mut mesh = Mesh::new();
    let segments = segments as usize;

    let bottom_center = mesh.add_vertex(Vertex::new(
        Point3::new(0.0, 0.0, 0.0),
        Vector3::new(0.0, 0.0, -1.0),
    ));
    let top_center = mesh.add_vertex(Vertex::new(
        Point3::new(0.0, 0.0, height),
        Vector3::new(0.0, 0.0, 1.0),
    ));

    let mut bottom = Vec::with_capacity(segments);
    let mut top = Vec::with_capacity(segments);
    for i in 0..segments {
        let angle = 2.0 * PI * i as f64 / segments as f64;
        let (sin, cos) = angle.sin_cos();
        bottom.push(mesh.add_vertex(Vertex::new(
            Point3::new(r1 * cos, r1 * sin, 0.0),
            Vector3::new(cos, sin, 0.0),
        )));
        top.push(mesh.add_vertex(Vertex::new(
            Point3::new(r2 * cos, r2 * sin, height),
            Vector3::new(cos, sin, 0.0),
        )));
    }

    for i in 0..segments {
        let next = (i + 1) % segments;
        let (bi, bn, ti, tn) = (bottom[i], bottom[next], top[i], top[next]);

        mesh.add_triangle(Triangle::new([bottom_center, bn, bi]));
        mesh.add_triangle(Triangle::new([top_center, ti, tn]));
        mesh.add_triangle(Triangle::new([bi, bn, ti]));
        mesh.add_triangle(Triangle::new([ti, bn, tn]));
    }

    mesh.recompute_normals();
    mesh
}
