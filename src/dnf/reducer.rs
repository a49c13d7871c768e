// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! DNF reducer: turns an ordered operation chain into OR-of-AND clauses
//!
//! The accumulator is kept factored as `AND(prefix) AND OR(AND(tail)...)`,
//! with an empty tail list standing for `true`. Intersection and
//! subtraction only ever grow the prefix; reverse subtraction negates the
//! whole expression and pushes it into the tails.

use super::literal::{Literal, Nested, Signed};
use crate::zone::{Mode, Operation};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::trace;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnfExpression {
    prefix: Vec<Literal>,
    tails: Vec<Vec<Literal>>,
}

impl DnfExpression {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_parts(prefix: Vec<Literal>, tails: Vec<Vec<Literal>>) -> Self {
        Self { prefix, tails }
    }

    /// Build from loosely shaped arguments.
    ///
    /// A scalar prefix becomes a one-literal prefix. A scalar tail becomes a
    /// single one-literal tail, a flat list a single tail, a list of lists
    /// the tails themselves. Anything else is treated as empty.
    pub fn from_nested(prefix: impl Into<Nested>, tails: impl Into<Nested>) -> Self {
        let prefix = prefix.into();
        let tails = tails.into();

        let prefix = match prefix.dimension() {
            0 | 1 => prefix.scalars(),
            _ => Vec::new(),
        };
        let tails = match tails.dimension() {
            0 | 1 => vec![tails.scalars()],
            2 => tails.lists(),
            _ => Vec::new(),
        };

        Self { prefix, tails }
    }

    pub fn prefix(&self) -> &[Literal] {
        &self.prefix
    }

    pub fn tails(&self) -> &[Vec<Literal>] {
        &self.tails
    }

    pub fn is_empty(&self) -> bool {
        self.prefix.is_empty() && self.tails.is_empty()
    }

    /// AND a literal onto every clause
    pub fn extend_prefix(&mut self, literal: Literal) {
        self.prefix.insert(0, literal);
    }

    /// Replace the expression `E` with `literal AND NOT E`
    pub fn shift_tails(&mut self, literal: Literal) {
        let mut tails: Vec<Vec<Literal>> = self.prefix.iter().map(|p| vec![-p]).collect();
        tails.extend(negate_disjunction(&self.tails));

        trace!(
            literal,
            prefix = ?self.prefix,
            old_tails = self.tails.len(),
            new_tails = tails.len(),
            "shifted tails"
        );

        self.tails = tails;
        self.prefix = vec![literal];
    }

    /// Replace the expression `E` with `E OR literal`.
    ///
    /// The prefix no longer spans every clause, so it is folded into the
    /// tails and the literal joins them as its own clause.
    pub fn append_clause(&mut self, literal: Literal) {
        let prefix = std::mem::take(&mut self.prefix);
        if self.tails.is_empty() {
            self.tails.push(prefix);
        } else {
            for tail in &mut self.tails {
                tail.extend_from_slice(&prefix);
            }
        }
        self.tails.push(vec![literal]);
    }

    /// Apply one operation of a row.
    ///
    /// On an empty accumulator a union seeds the prefix; this is how the
    /// mandatory leading union of a row is consumed.
    pub fn parse_operation(&mut self, operation: &Operation) {
        let id = operation.shape_ref;
        match operation.mode {
            Mode::Union if self.is_empty() => self.prefix = vec![id.positive()],
            Mode::Union => self.append_clause(id.positive()),
            Mode::Intersection => self.extend_prefix(id.positive()),
            Mode::Subtraction => self.extend_prefix(id.negative()),
            Mode::ReverseSubtraction => self.shift_tails(id.positive()),
        }
    }

    /// Clauses in rendering order.
    ///
    /// Tails are visited last to first; each clause lists its tail literals
    /// in reverse, then the prefix literals in reverse.
    pub fn clauses(&self) -> Vec<Vec<Literal>> {
        let prefix: Vec<Literal> = self.prefix.iter().rev().copied().collect();
        if self.tails.is_empty() {
            return if prefix.is_empty() { Vec::new() } else { vec![prefix] };
        }

        self.tails
            .iter()
            .rev()
            .map(|tail| {
                tail.iter()
                    .rev()
                    .copied()
                    .chain(prefix.iter().copied())
                    .collect()
            })
            .collect()
    }

    /// Evaluate the expression for one point: `member(id)` tells whether the
    /// point lies inside shape `id`
    pub fn holds(&self, mut member: impl FnMut(Literal) -> bool) -> bool {
        let mut satisfied = |literal: &Literal| member(literal.abs()) == (*literal > 0);

        self.prefix.iter().all(&mut satisfied)
            && (self.tails.is_empty()
                || self.tails.iter().any(|tail| tail.iter().all(&mut satisfied)))
    }
}

/// `NOT OR(AND(tail))` distributed back into OR-of-AND form.
///
/// Tail literals are visited right to left and partial clauses right to
/// left, matching the established output order. A partial clause already
/// holding the negated literal is carried over as is rather than receiving a
/// duplicate.
fn negate_disjunction(tails: &[Vec<Literal>]) -> Vec<Vec<Literal>> {
    let mut tails = tails.iter();
    let Some(first) = tails.next() else {
        return Vec::new();
    };

    let mut partial: Vec<Vec<Literal>> = first.iter().map(|l| vec![-l]).collect();
    for tail in tails {
        let mut next: Vec<Vec<Literal>> = Vec::with_capacity(partial.len() * tail.len());
        for literal in tail.iter().rev() {
            let negated = -literal;
            for clause in partial.iter().rev() {
                let candidate = if clause.contains(&negated) {
                    clause.clone()
                } else {
                    let mut extended = clause.clone();
                    extended.push(negated);
                    extended
                };
                if !next.contains(&candidate) {
                    next.push(candidate);
                }
            }
        }
        partial = next;
    }

    partial
}

impl fmt::Display for DnfExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, clause) in self.clauses().iter().enumerate() {
            if i > 0 {
                f.write_str(" OR ")?;
            }
            for (j, literal) in clause.iter().enumerate() {
                if j > 0 {
                    f.write_str(" ")?;
                }
                write!(f, "{}", Signed(*literal))?;
            }
        }
        Ok(())
    }
}
