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

//! Key namespacing for the queue structures.
//!
//! One ordered structure and one set per resource, each under a stable prefix
//! so the structures never collide in a shared store.

/// Prefix for the per-resource waiting sorted structure.
pub const WAITING_QUEUE_PREFIX: &str = "QUEUE:WAITING:";

/// Prefix for the per-resource processing set.
pub const PROCESSING_SET_PREFIX: &str = "QUEUE:PROCESSING:";

/// Storage key of the waiting structure for a resource.
pub fn waiting_queue(resource_id: &str) -> String {
    format!("{WAITING_QUEUE_PREFIX}{resource_id}")
}

/// Storage key of the processing set for a resource.
pub fn processing_set(resource_id: &str) -> String {
    format!("{PROCESSING_SET_PREFIX}{resource_id}")
}
