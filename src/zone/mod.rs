// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Zone module - ordered boolean rows over referenced shapes
//!
//! A zone is the OR of its rows; each row is a left fold of operations
//! starting from the empty solid.

mod operation;
mod row;
mod subscription;
mod scheduler;
mod events;
#[allow(clippy::module_inception)]
mod zone;

pub use operation::{Mode, Operation, ShapeId};
pub use row::Row;
pub use subscription::SubscriptionTable;
pub use scheduler::{Clock, ManualClock, RecomputeScheduler, SystemClock};
pub use events::ZoneEvent;
pub use zone::{RecomputeJob, Zone};
