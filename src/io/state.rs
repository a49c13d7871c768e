// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Persisted zone state
//!
//! ```json
//! { "rows": [[{"shapeRef": 1, "mode": "union"}]], "subscriptions": {"1": 1} }
//! ```

use crate::config::EngineConfig;
use crate::error::{ZoneError, ZoneResult};
use crate::geometry::CsgEvaluator;
use crate::zone::{Clock, Mode, Row, ShapeId, SubscriptionTable, Zone};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tracing::warn;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneState {
    pub rows: Vec<Row>,
    #[serde(default)]
    pub subscriptions: BTreeMap<ShapeId, usize>,
}

impl ZoneState {
    pub fn from_zone<E: CsgEvaluator>(zone: &Zone<E>) -> Self {
        Self {
            rows: zone.rows().to_vec(),
            subscriptions: zone.subscriptions().to_map(),
        }
    }

    /// Build the state for a set of rows with a freshly derived table
    pub fn from_rows(rows: Vec<Row>) -> Self {
        let subscriptions = SubscriptionTable::from_rows(&rows).to_map();
        Self {
            rows,
            subscriptions,
        }
    }

    /// Check union heads and that the recorded table matches the rows
    pub fn validate(&self) -> ZoneResult<()> {
        self.check_heads()?;
        let table: SubscriptionTable = self.subscriptions.iter().map(|(k, v)| (*k, *v)).collect();
        table.validate(&self.rows)
    }

    /// Rebuild a zone. A subscription table that disagrees with the rows is
    /// logged and replaced by one derived from the rows; a row with a
    /// non-union head is rejected.
    pub fn into_zone<E: CsgEvaluator>(
        self,
        name: impl Into<String>,
        evaluator: Arc<E>,
        config: &EngineConfig,
        clock: Arc<dyn Clock>,
    ) -> ZoneResult<Zone<E>> {
        let name = name.into();
        match self.validate() {
            Ok(()) => {}
            Err(err @ ZoneError::InvalidRowHead { .. }) => return Err(err),
            Err(err) => warn!(zone = %name, %err, "rebuilding subscription table from rows"),
        }
        Zone::from_rows(name, self.rows, evaluator, config, clock)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize zone state")
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse zone state")
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path.as_ref(), self.to_json()?)
            .with_context(|| format!("Failed to write zone state: {:?}", path.as_ref()))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read zone state: {:?}", path.as_ref()))?;
        Self::from_json(&content)
    }

    fn check_heads(&self) -> ZoneResult<()> {
        for (index, row) in self.rows.iter().enumerate() {
            if let Some(head) = row.head() {
                if head.mode != Mode::Union {
                    return Err(ZoneError::InvalidRowHead {
                        row: index,
                        mode: head.mode,
                    });
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::ImplicitEvaluator;
    use crate::zone::{ManualClock, Operation};

    fn rows() -> Vec<Row> {
        vec![
            Row::from_operations(vec![
                Operation::union(1),
                Operation::subtraction(2),
                Operation::union(1),
            ]),
            Row::from_operations(vec![
                Operation::union(3),
                Operation::reverse_subtraction(2),
            ]),
        ]
    }

    #[test]
    fn test_json_shape() {
        let state = ZoneState::from_rows(rows());
        let value: serde_json::Value = serde_json::from_str(&state.to_json().unwrap()).unwrap();

        assert_eq!(value["rows"][0][1]["shapeRef"], 2);
        assert_eq!(value["rows"][0][1]["mode"], "subtraction");
        assert_eq!(value["rows"][1][1]["mode"], "reverse-subtraction");
        assert_eq!(value["subscriptions"]["1"], 2);
        assert_eq!(value["subscriptions"]["2"], 2);
        assert_eq!(value["subscriptions"]["3"], 1);
    }

    #[test]
    fn test_round_trip_preserves_order() {
        let state = ZoneState::from_rows(rows());
        let json = state.to_json().unwrap();
        let back = ZoneState::from_json(&json).unwrap();
        assert_eq!(back, state);
        assert_eq!(back.to_json().unwrap(), json);
        assert!(back.validate().is_ok());
    }

    #[test]
    fn test_mismatched_table_is_rebuilt() {
        let mut state = ZoneState::from_rows(rows());
        state.subscriptions.insert(ShapeId(1), 7);
        assert!(matches!(
            state.validate(),
            Err(ZoneError::SubscriptionMismatch { .. })
        ));

        let zone = state
            .into_zone(
                "restored",
                Arc::new(ImplicitEvaluator::new()),
                &EngineConfig::default(),
                Arc::new(ManualClock::new()),
            )
            .unwrap();
        assert_eq!(zone.subscriptions().count(ShapeId(1)), 2);
        assert!(zone.is_recompute_pending());
    }

    #[test]
    fn test_invalid_head_is_rejected() {
        let json = r#"{"rows": [[{"shapeRef": 4, "mode": "intersection"}]], "subscriptions": {"4": 1}}"#;
        let state = ZoneState::from_json(json).unwrap();
        assert_eq!(
            state.validate(),
            Err(ZoneError::InvalidRowHead {
                row: 0,
                mode: Mode::Intersection
            })
        );
    }
}
