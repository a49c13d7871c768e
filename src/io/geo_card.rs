// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Zone block of a SHIELD-HIT12A `geo.dat`
//!
//! One card per line: a 3-character zone name (first line of a zone only),
//! the 1-based zone number, then up to N constructions of the form
//! `%2s%5s` (operator, signed body number). The operator is `OR` for the
//! first literal of every clause but the first, blank otherwise.

use crate::config::EngineConfig;
use crate::dnf::{self, Literal, Signed};
use crate::zone::Row;

const NAME_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const NAME_LENGTH: usize = 3;

/// Generated zone name: base-36 digits over `A-Z0-9`, least significant first
pub fn zone_name(mut n: usize) -> String {
    let mut name = String::with_capacity(NAME_LENGTH);
    for _ in 0..NAME_LENGTH {
        name.push(NAME_CHARSET[n % NAME_CHARSET.len()] as char);
        n /= NAME_CHARSET.len();
    }
    name
}

#[derive(Debug, Clone, Copy)]
pub struct GeoCardWriter {
    constructions_per_line: usize,
}

impl Default for GeoCardWriter {
    fn default() -> Self {
        Self::new(9)
    }
}

impl GeoCardWriter {
    pub fn new(constructions_per_line: usize) -> Self {
        Self {
            constructions_per_line: constructions_per_line.max(1),
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.constructions_per_line)
    }

    /// Render zones given by their rows; zone numbers follow slice order
    pub fn render_zones<'a>(&self, zones: impl IntoIterator<Item = &'a [Row]>) -> String {
        let clauses: Vec<Vec<Vec<Literal>>> =
            zones.into_iter().map(dnf::zone_expression).collect();
        self.render_clauses(&clauses)
    }

    /// Render zones given directly as DNF clauses. Zones without clauses
    /// produce no cards but still take up a number.
    pub fn render_clauses(&self, zones: &[Vec<Vec<Literal>>]) -> String {
        let mut out = String::new();
        for (n, clauses) in zones.iter().enumerate() {
            let constructions: Vec<(&str, Literal)> = clauses
                .iter()
                .enumerate()
                .flat_map(|(c, clause)| {
                    clause.iter().enumerate().map(move |(i, literal)| {
                        let op = if c > 0 && i == 0 { "OR" } else { "" };
                        (op, *literal)
                    })
                })
                .collect();

            for (line, chunk) in constructions.chunks(self.constructions_per_line).enumerate() {
                let name = if line == 0 { zone_name(n) } else { String::new() };
                out.push_str(&format!("{:>2}{:>3}{:>5}", "", name, n + 1));
                for (op, literal) in chunk {
                    out.push_str(&format!("{:>2}{:>5}", op, Signed(*literal).to_string()));
                }
                out.push('\n');
            }
        }
        out.push_str("  END\n");
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zone::Operation;

    #[test]
    fn test_zone_names() {
        assert_eq!(zone_name(0), "AAA");
        assert_eq!(zone_name(1), "BAA");
        assert_eq!(zone_name(2), "CAA");
        assert_eq!(zone_name(36), "ABA");
        assert_eq!(zone_name(35), "9AA");
    }

    #[test]
    fn test_card_layout() {
        let zones = vec![
            vec![vec![1, 3, -4], vec![2, 3, -4]],
            vec![vec![5], vec![6]],
            vec![
                vec![7, -8, -1, -2, -5, -6],
                vec![7, -8, -3, -5, -6],
                vec![7, -8, 4, -5, -6],
            ],
        ];
        let expected = concat!(
            "  AAA    1     +1     +3     -4OR   +2     +3     -4\n",
            "  BAA    2     +5OR   +6\n",
            "  CAA    3     +7     -8     -1     -2     -5     -6OR   +7     -8     -3\n",
            "         3     -5     -6OR   +7     -8     +4     -5     -6\n",
            "  END\n",
        );
        assert_eq!(GeoCardWriter::default().render_clauses(&zones), expected);
    }

    #[test]
    fn test_render_from_rows() {
        let zone_a = vec![Row::from_operations(vec![
            Operation::union(1),
            Operation::subtraction(2),
        ])];
        let zone_b = vec![
            Row::from_operations(vec![Operation::union(3)]),
            Row::from_operations(vec![Operation::union(4)]),
        ];
        let card = GeoCardWriter::new(2)
            .render_zones([zone_a.as_slice(), zone_b.as_slice()]);
        assert_eq!(
            card,
            "  AAA    1     +1     -2\n  BAA    2     +3OR   +4\n  END\n"
        );
    }

    #[test]
    fn test_empty_zone_keeps_its_number() {
        let zones = vec![vec![], vec![vec![2]]];
        assert_eq!(
            GeoCardWriter::default().render_clauses(&zones),
            "  BAA    2     +2\n  END\n"
        );
    }
}
