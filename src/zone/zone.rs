// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Zone: composite solid plus the mutation API that keeps it consistent

use super::{
    Clock, Mode, Operation, RecomputeScheduler, Row, ShapeId, SubscriptionTable, SystemClock,
    ZoneEvent,
};
use crate::config::EngineConfig;
use crate::dnf;
use crate::error::{ZoneError, ZoneResult};
use crate::geometry::{fold_rows, CsgEvaluator, Mesh, MeshConversion, ShapeResolver};
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Snapshot of the rows a pending recompute has to fold.
///
/// Detached from the zone so the fold can run on another thread; hand the
/// result back through [`Zone::finish_recompute`].
#[derive(Debug, Clone)]
pub struct RecomputeJob {
    pub generation: u64,
    pub rows: Vec<Row>,
    pub parallel: bool,
}

impl RecomputeJob {
    pub fn run<E, R>(&self, evaluator: &E, resolver: &R) -> ZoneResult<E::Solid>
    where
        E: CsgEvaluator,
        R: ShapeResolver + ?Sized,
    {
        fold_rows(evaluator, resolver, &self.rows, self.parallel)
    }
}

/// Compound solid expressed as the OR of its rows
pub struct Zone<E: CsgEvaluator> {
    name: String,
    rows: Vec<Row>,
    subscriptions: SubscriptionTable,
    scheduler: RecomputeScheduler,
    clock: Arc<dyn Clock>,
    evaluator: Arc<E>,
    solid: E::Solid,
    events: Vec<ZoneEvent>,
    parallel: bool,
}

impl<E: CsgEvaluator> Zone<E> {
    /// Create a zone holding exactly one empty row
    pub fn new(name: impl Into<String>, evaluator: Arc<E>, config: &EngineConfig) -> Self {
        Self::with_clock(name, evaluator, config, Arc::new(SystemClock))
    }

    pub fn with_clock(
        name: impl Into<String>,
        evaluator: Arc<E>,
        config: &EngineConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let solid = evaluator.empty();
        Self {
            name: name.into(),
            rows: vec![Row::new()],
            subscriptions: SubscriptionTable::new(),
            scheduler: RecomputeScheduler::new(config.debounce_window()),
            clock,
            evaluator,
            solid,
            events: Vec::new(),
            parallel: config.parallel_rows,
        }
    }

    /// Rebuild a zone from persisted rows.
    ///
    /// Every non-empty row must start with a union. The subscription table
    /// is derived from the rows; the zone starts with a recompute pending.
    pub fn from_rows(
        name: impl Into<String>,
        rows: Vec<Row>,
        evaluator: Arc<E>,
        config: &EngineConfig,
        clock: Arc<dyn Clock>,
    ) -> ZoneResult<Self> {
        for (index, row) in rows.iter().enumerate() {
            Self::check_head(index, row)?;
        }

        let mut zone = Self::with_clock(name, evaluator, config, clock);
        zone.subscriptions = SubscriptionTable::from_rows(&rows);
        zone.rows = rows;
        zone.schedule_recompute();
        Ok(zone)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> Option<&Row> {
        self.rows.get(index)
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn subscriptions(&self) -> &SubscriptionTable {
        &self.subscriptions
    }

    pub fn evaluator(&self) -> &Arc<E> {
        &self.evaluator
    }

    /// Last successfully recomputed composite solid
    pub fn solid(&self) -> &E::Solid {
        &self.solid
    }

    pub fn is_recompute_pending(&self) -> bool {
        self.scheduler.is_pending()
    }

    pub fn recompute_deadline(&self) -> Option<Instant> {
        self.scheduler.deadline()
    }

    /// Take every queued notification, oldest first
    pub fn drain_events(&mut self) -> Vec<ZoneEvent> {
        std::mem::take(&mut self.events)
    }

    /// Textual zone definition: the rows' DNF expressions joined by `OR`
    pub fn expression(&self) -> String {
        dnf::zone_to_expression(&self.rows)
    }

    /// Insert a row at `index` (default: after the last row)
    pub fn add_row(&mut self, index: Option<usize>, operations: Vec<Operation>) -> ZoneResult<()> {
        let len = self.rows.len();
        let index = index.unwrap_or(len);
        if index > len {
            return Err(ZoneError::RowOutOfRange { index, len });
        }

        let row = Row::from_operations(operations);
        Self::check_head(index, &row)?;

        for op in &row {
            self.subscriptions.increment(op.shape_ref);
        }
        self.rows.insert(index, row);

        self.announce_changed_state();
        Ok(())
    }

    /// Replace the contents of a row
    pub fn update_row(&mut self, index: usize, operations: Vec<Operation>) -> ZoneResult<()> {
        self.check_row(index)?;
        let row = Row::from_operations(operations);
        Self::check_head(index, &row)?;

        let mut subscriptions = self.subscriptions.clone();
        for op in &self.rows[index] {
            subscriptions.decrement(op.shape_ref)?;
        }
        for op in &row {
            subscriptions.increment(op.shape_ref);
        }

        self.subscriptions = subscriptions;
        self.rows[index] = row;

        self.announce_changed_state();
        Ok(())
    }

    /// Remove a row (default: the last one). Emits [`ZoneEvent::Emptied`]
    /// when no rows remain.
    pub fn remove_row(&mut self, index: Option<usize>) -> ZoneResult<()> {
        let len = self.rows.len();
        let index = match index {
            Some(index) => index,
            None if len > 0 => len - 1,
            None => return Err(ZoneError::RowOutOfRange { index: 0, len }),
        };
        self.check_row(index)?;

        let mut subscriptions = self.subscriptions.clone();
        for op in &self.rows[index] {
            subscriptions.decrement(op.shape_ref)?;
        }

        self.subscriptions = subscriptions;
        self.rows.remove(index);

        self.announce_changed_state();
        if self.rows.is_empty() {
            self.events.push(ZoneEvent::Emptied);
        }
        Ok(())
    }

    /// Append an operation to a row
    pub fn add_operation(&mut self, row: usize, operation: Operation) -> ZoneResult<()> {
        self.check_row(row)?;
        let index = self.rows[row].len();
        self.insert_operation(row, index, operation)
    }

    /// Insert an operation at an arbitrary slot of a row
    pub fn insert_operation(
        &mut self,
        row: usize,
        index: usize,
        operation: Operation,
    ) -> ZoneResult<()> {
        self.check_row(row)?;
        let len = self.rows[row].len();
        if index > len {
            return Err(ZoneError::OperationOutOfRange { row, index, len });
        }
        if index == 0 && operation.mode != Mode::Union {
            return Err(ZoneError::InvalidRowHead {
                row,
                mode: operation.mode,
            });
        }

        self.subscriptions.increment(operation.shape_ref);
        self.rows[row].insert(index, operation);

        self.announce_changed_state();
        Ok(())
    }

    /// Remove one operation. When the head goes, the new head becomes a union.
    pub fn remove_operation(&mut self, row: usize, index: usize) -> ZoneResult<()> {
        self.check_operation(row, index)?;

        let shape = self.rows[row].operations()[index].shape_ref;
        self.subscriptions.decrement(shape)?;
        self.rows[row].remove(index);
        if index == 0 {
            self.rows[row].enforce_union_head();
        }

        self.announce_changed_state();
        Ok(())
    }

    /// A referenced shape changed its geometry. Returns whether a recompute
    /// was scheduled.
    pub fn on_external_shape_changed(&mut self, shape: ShapeId) -> bool {
        if !self.subscriptions.has(shape) {
            return false;
        }

        self.schedule_recompute();
        true
    }

    /// A shape is about to be destroyed: drop every slot referencing it.
    ///
    /// Rows left without operations are removed, surviving rows get a union
    /// head. Returns whether the zone referenced the shape at all.
    ///
    /// A zone that never referenced the shape is left alone and no recompute
    /// is scheduled: its rows and solid cannot change.
    pub fn on_external_shape_removed(&mut self, shape: ShapeId) -> ZoneResult<bool> {
        if !self.subscriptions.has(shape) {
            return Ok(false);
        }

        let mut subscriptions = self.subscriptions.clone();
        let mut rows = self.rows.clone();
        for row in &mut rows {
            for _ in 0..row.remove_shape(shape) {
                subscriptions.decrement(shape)?;
            }
        }
        rows.retain(|row| !row.is_empty());
        for row in &mut rows {
            row.enforce_union_head();
        }

        self.subscriptions = subscriptions;
        self.rows = rows;

        if self.rows.is_empty() {
            self.events.push(ZoneEvent::Emptied);
        }
        self.announce_changed_state();
        Ok(true)
    }

    /// Hand out the pending recompute once its quiescence window has passed
    pub fn begin_recompute(&mut self) -> Option<RecomputeJob> {
        let generation = self.scheduler.take_due(self.clock.now())?;
        Some(self.job(generation))
    }

    /// Hand out the pending recompute without waiting for the window
    pub fn begin_recompute_now(&mut self) -> Option<RecomputeJob> {
        let generation = self.scheduler.take()?;
        Some(self.job(generation))
    }

    /// Install the result of a job. Results for superseded generations are
    /// discarded; returns whether the solid was replaced.
    pub fn finish_recompute(&mut self, generation: u64, solid: E::Solid) -> bool {
        if !self.scheduler.is_current(generation) {
            debug!(
                zone = %self.name,
                generation,
                latest = self.scheduler.generation(),
                "discarding superseded recompute"
            );
            return false;
        }

        self.solid = solid;
        self.events.push(ZoneEvent::GeometryChanged);
        true
    }

    /// Run the pending recompute if it is due
    pub fn poll<R: ShapeResolver + ?Sized>(&mut self, resolver: &R) -> ZoneResult<bool> {
        match self.begin_recompute() {
            Some(job) => self.run_job(job, resolver),
            None => Ok(false),
        }
    }

    /// Run the pending recompute immediately, if there is one
    pub fn flush<R: ShapeResolver + ?Sized>(&mut self, resolver: &R) -> ZoneResult<bool> {
        match self.begin_recompute_now() {
            Some(job) => self.run_job(job, resolver),
            None => Ok(false),
        }
    }

    /// Recompute unconditionally, superseding anything pending
    pub fn recompute<R: ShapeResolver + ?Sized>(&mut self, resolver: &R) -> ZoneResult<()> {
        let generation = self.scheduler.request(self.clock.now());
        self.scheduler.cancel();
        self.run_job(self.job(generation), resolver)?;
        Ok(())
    }

    fn run_job<R: ShapeResolver + ?Sized>(
        &mut self,
        job: RecomputeJob,
        resolver: &R,
    ) -> ZoneResult<bool> {
        let start = Instant::now();
        let solid = job.run(self.evaluator.as_ref(), resolver)?;
        debug!(
            zone = %self.name,
            generation = job.generation,
            rows = job.rows.len(),
            elapsed = ?start.elapsed(),
            "recomputed zone solid"
        );
        Ok(self.finish_recompute(job.generation, solid))
    }

    fn job(&self, generation: u64) -> RecomputeJob {
        RecomputeJob {
            generation,
            rows: self.rows.clone(),
            parallel: self.parallel,
        }
    }

    fn schedule_recompute(&mut self) {
        let coalesced = self.scheduler.is_pending();
        let generation = self.scheduler.request(self.clock.now());
        debug!(zone = %self.name, generation, coalesced, "recompute scheduled");
    }

    fn announce_changed_state(&mut self) {
        self.schedule_recompute();
        self.events.push(ZoneEvent::DefinitionChanged);
    }

    fn check_row(&self, index: usize) -> ZoneResult<()> {
        if index < self.rows.len() {
            Ok(())
        } else {
            Err(ZoneError::RowOutOfRange {
                index,
                len: self.rows.len(),
            })
        }
    }

    fn check_operation(&self, row: usize, index: usize) -> ZoneResult<()> {
        self.check_row(row)?;
        let len = self.rows[row].len();
        if index < len {
            Ok(())
        } else {
            Err(ZoneError::OperationOutOfRange { row, index, len })
        }
    }

    fn check_head(index: usize, row: &Row) -> ZoneResult<()> {
        match row.head() {
            Some(head) if head.mode != Mode::Union => Err(ZoneError::InvalidRowHead {
                row: index,
                mode: head.mode,
            }),
            _ => Ok(()),
        }
    }
}

impl<E: MeshConversion> Zone<E> {
    /// Renderable mesh of the cached solid
    pub fn mesh(&self) -> Mesh {
        self.evaluator.to_mesh(&self.solid)
    }
}
