// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Disjunctive normal form of zone rows
//!
//! Transport codes only understand "regions, each an AND of signed body
//! numbers, OR'd together". This module derives that form from a row's
//! operation chain without touching any geometry.

mod literal;
mod reducer;
mod export;

pub use literal::{Literal, Nested, Signed};
pub use reducer::DnfExpression;
pub use export::{row_expression, row_to_expression, zone_expression, zone_to_expression};
