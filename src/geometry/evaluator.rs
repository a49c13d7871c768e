// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Evaluator seam between zone rows and solid geometry
//!
//! A zone never builds geometry itself. It folds its rows through a
//! [`CsgEvaluator`], resolving shape ids through a [`ShapeResolver`]:
//!
//! ```text
//! row      = ((s0 op1 s1) op2 s2) ...
//! zone     = row0 ∪ row1 ∪ ...
//! ```

use super::{Mesh, Shape};
use crate::error::{ZoneError, ZoneResult};
use crate::zone::{Mode, Row, ShapeId};
use rayon::prelude::*;
use tracing::trace;

/// Looks up live shapes by id
pub trait ShapeResolver: Sync {
    fn resolve(&self, id: ShapeId) -> Option<&Shape>;
}

/// Boolean solid engine
pub trait CsgEvaluator: Send + Sync {
    type Solid: Clone + Send + Sync;

    fn empty(&self) -> Self::Solid;
    fn solid_from_shape(&self, shape: &Shape) -> Self::Solid;
    fn union(&self, a: &Self::Solid, b: &Self::Solid) -> Self::Solid;
    fn intersect(&self, a: &Self::Solid, b: &Self::Solid) -> Self::Solid;
    /// `a` minus `b`
    fn subtract(&self, a: &Self::Solid, b: &Self::Solid) -> Self::Solid;

    /// Apply one row step to the accumulator
    fn combine(&self, acc: &Self::Solid, mode: Mode, operand: &Self::Solid) -> Self::Solid {
        match mode {
            Mode::Union => self.union(acc, operand),
            Mode::Intersection => self.intersect(acc, operand),
            Mode::Subtraction => self.subtract(acc, operand),
            Mode::ReverseSubtraction => self.subtract(operand, acc),
        }
    }

    /// Release anything cached for a shape that no longer exists
    fn forget(&self, _id: ShapeId) {}
}

/// Evaluators whose solids can be displayed as triangle meshes
pub trait MeshConversion: CsgEvaluator {
    fn from_mesh(&self, mesh: &Mesh) -> Self::Solid;
    fn to_mesh(&self, solid: &Self::Solid) -> Mesh;
}

/// Fold one row left to right, starting from the empty solid
pub fn fold_row<E, R>(evaluator: &E, resolver: &R, row: &Row) -> ZoneResult<E::Solid>
where
    E: CsgEvaluator + ?Sized,
    R: ShapeResolver + ?Sized,
{
    let mut acc = evaluator.empty();
    for operation in row {
        let shape = resolver
            .resolve(operation.shape_ref)
            .ok_or(ZoneError::UnresolvedShape(operation.shape_ref))?;
        let operand = evaluator.solid_from_shape(shape);
        acc = evaluator.combine(&acc, operation.mode, &operand);
        trace!(shape = %operation.shape_ref, mode = %operation.mode, "row step");
    }
    Ok(acc)
}

/// Fold every row and union the results in row order.
///
/// Rows are independent, so with `parallel` set they are folded on the rayon
/// pool; the final union still runs in row order.
pub fn fold_rows<E, R>(
    evaluator: &E,
    resolver: &R,
    rows: &[Row],
    parallel: bool,
) -> ZoneResult<E::Solid>
where
    E: CsgEvaluator + ?Sized,
    R: ShapeResolver + ?Sized,
{
    let solids: Vec<E::Solid> = if parallel && rows.len() > 1 {
        rows.par_iter()
            .map(|row| fold_row(evaluator, resolver, row))
            .collect::<ZoneResult<_>>()?
    } else {
        rows.iter()
            .map(|row| fold_row(evaluator, resolver, row))
            .collect::<ZoneResult<_>>()?
    };

    Ok(solids
        .iter()
        .fold(evaluator.empty(), |acc, solid| evaluator.union(&acc, solid)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{ImplicitEvaluator, Primitive, ShapeRegistry};
    use crate::zone::Operation;
    use nalgebra::{Point3, Vector3};

    fn registry() -> ShapeRegistry {
        [
            Shape::new(1, Primitive::sphere(2.0, 0), Vector3::zeros()),
            Shape::new(2, Primitive::sphere(1.0, 0), Vector3::new(1.5, 0.0, 0.0)),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_reverse_subtraction_swaps_operands() {
        let evaluator = ImplicitEvaluator::new();
        let row = Row::from_operations(vec![
            Operation::union(1),
            Operation::reverse_subtraction(2),
        ]);
        let solid = fold_row(&evaluator, &registry(), &row).unwrap();

        // Shape 2 minus shape 1: only the part of the small sphere outside the big one
        assert!(solid.contains(&Point3::new(2.3, 0.0, 0.0)));
        assert!(!solid.contains(&Point3::new(1.5, 0.0, 0.0)));
        assert!(!solid.contains(&Point3::new(-1.0, 0.0, 0.0)));
    }

    #[test]
    fn test_unresolved_shape_is_reported() {
        let evaluator = ImplicitEvaluator::new();
        let rows = vec![Row::from_operations(vec![Operation::union(9)])];
        let err = fold_rows(&evaluator, &registry(), &rows, false).unwrap_err();
        assert_eq!(err, ZoneError::UnresolvedShape(ShapeId(9)));
    }

    #[test]
    fn test_parallel_fold_matches_sequential() {
        let evaluator = ImplicitEvaluator::new();
        let rows = vec![
            Row::from_operations(vec![Operation::union(1), Operation::subtraction(2)]),
            Row::from_operations(vec![Operation::union(2)]),
            Row::new(),
        ];
        let sequential = fold_rows(&evaluator, &registry(), &rows, false).unwrap();
        let parallel = fold_rows(&evaluator, &registry(), &rows, true).unwrap();

        for x in [-2.5, -1.0, 0.0, 1.0, 1.5, 2.2, 2.6] {
            let p = Point3::new(x, 0.0, 0.0);
            assert_eq!(sequential.contains(&p), parallel.contains(&p), "x = {x}");
        }
        assert!(sequential.contains(&Point3::new(1.5, 0.0, 0.0)));
    }
}
