// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Notifications produced by a zone

/// Events a zone queues for its owner to drain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ZoneEvent {
    /// The cached composite solid was replaced by a fresh recompute
    GeometryChanged,
    /// The last row was removed; the owner should drop the zone
    Emptied,
    /// Rows or operations changed, so the exported definition may differ
    DefinitionChanged,
}
