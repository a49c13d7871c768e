// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Row and zone definitions for export

use super::{DnfExpression, Literal};
use crate::zone::Row;

/// Fold a row's operations into its DNF expression
pub fn row_expression(row: &Row) -> DnfExpression {
    row.iter().fold(DnfExpression::new(), |mut expr, op| {
        expr.parse_operation(op);
        expr
    })
}

/// Textual definition of one row
pub fn row_to_expression(row: &Row) -> String {
    row_expression(row).to_string()
}

/// All clauses of a zone, row by row. Empty rows contribute nothing.
pub fn zone_expression(rows: &[Row]) -> Vec<Vec<Literal>> {
    rows.iter()
        .flat_map(|row| row_expression(row).clauses())
        .collect()
}

/// Textual definition of a zone: row definitions joined by `OR`
pub fn zone_to_expression(rows: &[Row]) -> String {
    rows.iter()
        .filter(|row| !row.is_empty())
        .map(row_to_expression)
        .collect::<Vec<_>>()
        .join(" OR ")
}
