// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! I/O module - zone state persistence, scene documents and geo card export

mod document;
mod geo_card;
mod state;

pub use document::{SceneDocument, ZoneEntry};
pub use geo_card::{zone_name, GeoCardWriter};
pub use state::ZoneState;
