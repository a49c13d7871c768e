// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Signed literals and constructor argument normalization

use std::fmt;

/// Signed shape identifier: `+id` includes the shape, `-id` excludes it
pub type Literal = i64;

/// Renders a literal with an explicit sign. Zero has no sign.
pub struct Signed(pub Literal);

impl fmt::Display for Signed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 > 0 {
            write!(f, "+{}", self.0)
        } else {
            write!(f, "{}", self.0)
        }
    }
}

/// Loosely shaped constructor argument: a scalar, a list, or a list of lists
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Nested {
    Null,
    Scalar(Literal),
    List(Vec<Nested>),
}

impl Nested {
    /// 0 for a scalar, 1 for a flat list, 2 for a list of lists, -1 when the
    /// value is null or holds no scalar at any depth.
    ///
    /// A list takes the dimension of its first element that has one.
    pub fn dimension(&self) -> i32 {
        match self {
            Nested::Null => -1,
            Nested::Scalar(_) => 0,
            Nested::List(items) => items
                .iter()
                .map(Nested::dimension)
                .find(|dim| *dim >= 0)
                .map_or(-1, |dim| dim + 1),
        }
    }

    /// Scalars directly inside this value, in order
    pub(crate) fn scalars(&self) -> Vec<Literal> {
        match self {
            Nested::Null => Vec::new(),
            Nested::Scalar(value) => vec![*value],
            Nested::List(items) => items
                .iter()
                .filter_map(|item| match item {
                    Nested::Scalar(value) => Some(*value),
                    _ => None,
                })
                .collect(),
        }
    }

    /// Lists directly inside this value, each flattened to its scalars
    pub(crate) fn lists(&self) -> Vec<Vec<Literal>> {
        match self {
            Nested::List(items) => items.iter().map(Nested::scalars).collect(),
            _ => Vec::new(),
        }
    }
}

impl From<Literal> for Nested {
    fn from(value: Literal) -> Self {
        Nested::Scalar(value)
    }
}

impl From<Vec<Literal>> for Nested {
    fn from(values: Vec<Literal>) -> Self {
        Nested::List(values.into_iter().map(Nested::Scalar).collect())
    }
}

impl From<Vec<Vec<Literal>>> for Nested {
    fn from(values: Vec<Vec<Literal>>) -> Self {
        Nested::List(values.into_iter().map(Nested::from).collect())
    }
}

impl<T: Into<Nested>> From<Option<T>> for Nested {
    fn from(value: Option<T>) -> Self {
        value.map_or(Nested::Null, Into::into)
    }
}
