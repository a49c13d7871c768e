// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Consistency errors raised by the zone engine
//!
//! None of these are user-recoverable: they signal a broken invariant in the
//! caller (a stale index, a shape destroyed before its zones were told, a
//! corrupted subscription table). The engine never repairs them silently.

use crate::zone::{Mode, ShapeId};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ZoneError {
    #[error("row index {index} out of range (zone has {len} rows)")]
    RowOutOfRange { index: usize, len: usize },

    #[error("operation index {index} out of range (row {row} has {len} operations)")]
    OperationOutOfRange { row: usize, index: usize, len: usize },

    #[error("shape {0} could not be resolved; it was destroyed before its zones were notified")]
    UnresolvedShape(ShapeId),

    #[error("subscription count for shape {0} would drop below zero")]
    SubscriptionUnderflow(ShapeId),

    #[error("row {row} must start with a union operation, found {mode}")]
    InvalidRowHead { row: usize, mode: Mode },

    #[error("subscription table records {recorded} references to shape {shape}, rows contain {actual}")]
    SubscriptionMismatch {
        shape: ShapeId,
        recorded: usize,
        actual: usize,
    },
}

pub type ZoneResult<T> = std::result::Result<T, ZoneError>;
