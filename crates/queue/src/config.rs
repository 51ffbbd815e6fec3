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

//! Configuration for the queue structures.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tunables shared by every queue backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Maximum number of concurrent processing members per resource.
    pub max_processing_count: usize,
    /// Idle timeout of a resource's waiting structure, refreshed on
    /// membership-affecting writes.
    pub waiting_timeout: Duration,
    /// Idle timeout of a resource's processing set, refreshed on add/add_all.
    pub entry_timeout: Duration,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            max_processing_count: 100,
            waiting_timeout: Duration::from_secs(1800),
            entry_timeout: Duration::from_secs(300),
        }
    }
}
