// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Operation slots: a shape reference paired with a boolean mode

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identifier of a shape living in an external registry.
///
/// Zones hold shapes by identifier only; the number doubles as the body
/// number in exported zone definitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShapeId(pub u32);

impl ShapeId {
    /// Literal including this shape (`+id`)
    pub fn positive(self) -> i64 {
        i64::from(self.0)
    }

    /// Literal excluding this shape (`-id`)
    pub fn negative(self) -> i64 {
        -i64::from(self.0)
    }
}

impl From<u32> for ShapeId {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl fmt::Display for ShapeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How an operation combines its shape with the row accumulator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Mode {
    /// `acc ∪ shape`
    Union,
    /// `acc ∩ shape`
    Intersection,
    /// `acc − shape`
    Subtraction,
    /// `shape − acc`
    ReverseSubtraction,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Union => "union",
            Mode::Intersection => "intersection",
            Mode::Subtraction => "subtraction",
            Mode::ReverseSubtraction => "reverse-subtraction",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One slot of a row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    pub shape_ref: ShapeId,
    pub mode: Mode,
}

impl Operation {
    pub fn new(shape_ref: impl Into<ShapeId>, mode: Mode) -> Self {
        Self {
            shape_ref: shape_ref.into(),
            mode,
        }
    }

    pub fn union(shape_ref: impl Into<ShapeId>) -> Self {
        Self::new(shape_ref, Mode::Union)
    }

    pub fn intersection(shape_ref: impl Into<ShapeId>) -> Self {
        Self::new(shape_ref, Mode::Intersection)
    }

    pub fn subtraction(shape_ref: impl Into<ShapeId>) -> Self {
        Self::new(shape_ref, Mode::Subtraction)
    }

    pub fn reverse_subtraction(shape_ref: impl Into<ShapeId>) -> Self {
        Self::new(shape_ref, Mode::ReverseSubtraction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_json_shape() {
        let op = Operation::reverse_subtraction(7);
        let json = serde_json::to_string(&op).unwrap();
        assert_eq!(json, r#"{"shapeRef":7,"mode":"reverse-subtraction"}"#);

        let back: Operation = serde_json::from_str(&json).unwrap();
        assert_eq!(back, op);
    }

    #[test]
    fn test_shape_literals() {
        let id = ShapeId(12);
        assert_eq!(id.positive(), 12);
        assert_eq!(id.negative(), -12);
    }
}
