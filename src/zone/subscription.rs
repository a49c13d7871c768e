// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Reference-counted subscription table

use super::{Row, ShapeId};
use crate::error::{ZoneError, ZoneResult};
use ahash::AHashMap;
use std::collections::BTreeMap;

/// Counting multiset of shape identifiers.
///
/// Tracks how many operation slots across all rows of a zone reference each
/// shape. Only used as a cheap relevance filter for external change
/// notifications; it owns nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubscriptionTable {
    counts: AHashMap<ShapeId, usize>,
}

impl SubscriptionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the table that matches the given rows exactly
    pub fn from_rows(rows: &[Row]) -> Self {
        let mut table = Self::new();
        for op in rows.iter().flat_map(|row| row.iter()) {
            table.increment(op.shape_ref);
        }
        table
    }

    /// Returns the new count
    pub fn increment(&mut self, shape: ShapeId) -> usize {
        let count = self.counts.entry(shape).or_insert(0);
        *count += 1;
        *count
    }

    /// Returns the new count. Keys reaching zero are dropped.
    pub fn decrement(&mut self, shape: ShapeId) -> ZoneResult<usize> {
        let count = self
            .counts
            .get_mut(&shape)
            .ok_or(ZoneError::SubscriptionUnderflow(shape))?;
        *count -= 1;
        let remaining = *count;
        if remaining == 0 {
            self.counts.remove(&shape);
        }
        Ok(remaining)
    }

    pub fn has(&self, shape: ShapeId) -> bool {
        self.counts.contains_key(&shape)
    }

    pub fn count(&self, shape: ShapeId) -> usize {
        self.counts.get(&shape).copied().unwrap_or(0)
    }

    /// Number of distinct shapes referenced
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ShapeId, usize)> + '_ {
        self.counts.iter().map(|(id, count)| (*id, *count))
    }

    /// Sorted snapshot, used for persistence
    pub fn to_map(&self) -> BTreeMap<ShapeId, usize> {
        self.iter().collect()
    }

    /// Check the recorded counts against the rows they are meant to describe
    pub fn validate(&self, rows: &[Row]) -> ZoneResult<()> {
        let actual = Self::from_rows(rows);

        for (shape, recorded) in self.iter() {
            let found = actual.count(shape);
            if found != recorded {
                return Err(ZoneError::SubscriptionMismatch {
                    shape,
                    recorded,
                    actual: found,
                });
            }
        }
        for (shape, found) in actual.iter() {
            if !self.has(shape) {
                return Err(ZoneError::SubscriptionMismatch {
                    shape,
                    recorded: 0,
                    actual: found,
                });
            }
        }

        Ok(())
    }
}

impl FromIterator<(ShapeId, usize)> for SubscriptionTable {
    fn from_iter<I: IntoIterator<Item = (ShapeId, usize)>>(iter: I) -> Self {
        Self {
            counts: iter.into_iter().filter(|(_, count)| *count > 0).collect(),
        }
    }
}
