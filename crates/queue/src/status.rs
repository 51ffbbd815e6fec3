// SPDX-License-Identifier: LGPL-2.1-or-later
// Copyright (C) 2025 Shahzad A. Bhatti <bhatti@plexobject.com>
//
// This file is part of PlexGate.
//
// PlexGate is free software: you can redistribute it and/or modify
// it under the terms of the GNU Lesser General Public License as published by
// the Free Software Foundation, either version 2.1 of the License, or
// (at your option) any later version.
//
// PlexGate is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Lesser General Public License for more details.
//
// You should have received a copy of the GNU Lesser General Public License
// along with PlexGate. If not, see <https://www.gnu.org/licenses/>.

//! Derived queue state for a (resource, user) pair.
//!
//! Status is never persisted: it is recomputed from membership in the waiting
//! and processing structures every time it is asked for.

use serde::{Deserialize, Serialize};

/// Where a user stands relative to the admission gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QueueStatus {
    /// Holds a waiting entry, not yet admitted
    Waiting,
    /// Holds a waiting entry and the next promotion would admit them
    CanEnter,
    /// A processing member, permitted to act
    Processing,
    /// Present in neither structure
    NotInQueue,
}

impl QueueStatus {
    /// Derive status from waiting position and the advisory entry check.
    pub fn determine(position: Option<u64>, can_enter: bool) -> Self {
        match (position, can_enter) {
            (None, true) => QueueStatus::Processing,
            (None, false) => QueueStatus::NotInQueue,
            (Some(_), true) => QueueStatus::CanEnter,
            (Some(_), false) => QueueStatus::Waiting,
        }
    }
}

/// Snapshot of a user's standing, as reported to polling callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueInfo {
    /// User the snapshot describes
    pub user_id: String,
    /// Resource being gated
    pub resource_id: String,
    /// 0-based waiting position, absent once processing (or not queued)
    pub position: Option<u64>,
    /// Advisory entry hint; may be stale
    pub can_enter: bool,
    /// Derived status
    pub status: QueueStatus,
}
