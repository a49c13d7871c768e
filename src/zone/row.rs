// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Row: an ordered chain of operations evaluating to one solid

use super::{Mode, Operation, ShapeId};
use serde::{Deserialize, Serialize};

/// Ordered sequence of operations.
///
/// The head of a non-empty row must be a union; it seeds the accumulator
/// from the empty solid. `Row` itself does not police that, the owning
/// zone does.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Row {
    operations: Vec<Operation>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_operations(operations: Vec<Operation>) -> Self {
        Self { operations }
    }

    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Operation> {
        self.operations.get(index)
    }

    pub fn head(&self) -> Option<&Operation> {
        self.operations.first()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Operation> {
        self.operations.iter()
    }

    pub fn push(&mut self, operation: Operation) {
        self.operations.push(operation);
    }

    pub fn insert(&mut self, index: usize, operation: Operation) {
        self.operations.insert(index, operation);
    }

    pub fn remove(&mut self, index: usize) -> Operation {
        self.operations.remove(index)
    }

    /// True when the row is empty or starts with a union
    pub fn has_valid_head(&self) -> bool {
        self.head().map_or(true, |op| op.mode == Mode::Union)
    }

    /// Force the head operation to union. Returns whether anything changed.
    pub fn enforce_union_head(&mut self) -> bool {
        match self.operations.first_mut() {
            Some(head) if head.mode != Mode::Union => {
                head.mode = Mode::Union;
                true
            }
            _ => false,
        }
    }

    /// Number of slots referencing `shape`
    pub fn references(&self, shape: ShapeId) -> usize {
        self.operations
            .iter()
            .filter(|op| op.shape_ref == shape)
            .count()
    }

    /// Remove every slot referencing `shape`, returning how many were removed
    pub fn remove_shape(&mut self, shape: ShapeId) -> usize {
        let before = self.operations.len();
        self.operations.retain(|op| op.shape_ref != shape);
        before - self.operations.len()
    }
}

impl From<Vec<Operation>> for Row {
    fn from(operations: Vec<Operation>) -> Self {
        Self::from_operations(operations)
    }
}

impl<'a> IntoIterator for &'a Row {
    type Item = &'a Operation;
    type IntoIter = std::slice::Iter<'a, Operation>;

    fn into_iter(self) -> Self::IntoIter {
        self.operations.iter()
    }
}
