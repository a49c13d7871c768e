// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Geometry module - shapes, meshes and the boolean evaluators zones fold through

mod bbox;
mod csg;
mod evaluator;
mod implicit;
mod mesh;
mod primitives;
mod shape;

pub use bbox::BoundingBox;
pub use csg::{CacheStats, MeshEvaluator, MeshSolid};
pub use evaluator::{fold_row, fold_rows, CsgEvaluator, MeshConversion, ShapeResolver};
pub use implicit::{ImplicitEvaluator, ImplicitSolid};
pub use mesh::{Mesh, Triangle, Vertex};
pub use primitives::Primitive;
pub use shape::{Shape, ShapeRegistry};
