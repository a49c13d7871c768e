// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Zonekit
//!
//! Boolean zone algebra for simulation geometry. A zone is an ordered list of
//! rows; each row folds union / intersection / subtraction / reverse
//! subtraction over referenced shapes. Zones keep a debounced CSG preview of
//! their solid and export their definition in disjunctive normal form.

pub mod cli;
pub mod config;
pub mod dnf;
pub mod error;
pub mod geometry;
pub mod io;
pub mod scene;
pub mod zone;

pub use config::EngineConfig;
pub use dnf::{row_to_expression, zone_to_expression, DnfExpression, Literal};
pub use error::{ZoneError, ZoneResult};
pub use geometry::{CsgEvaluator, ImplicitEvaluator, Mesh, MeshEvaluator, Primitive, Shape, ShapeRegistry};
pub use io::{GeoCardWriter, SceneDocument, ZoneState};
pub use scene::{Scene, ZoneHandle};
pub use zone::{Mode, Operation, Row, ShapeId, Zone, ZoneEvent};

/// Textual definition of a zone given as raw operation lists
pub fn zone_definition(rows: &[Vec<Operation>]) -> String {
    let rows: Vec<Row> = rows.iter().cloned().map(Row::from_operations).collect();
    zone_to_expression(&rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zone_definition() {
        let rows = vec![
            vec![Operation::union(1), Operation::intersection(2)],
            vec![Operation::union(3), Operation::reverse_subtraction(4)],
        ];
        assert_eq!(zone_definition(&rows), "+1 +2 OR -3 +4");
    }
}
