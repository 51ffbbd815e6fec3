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

//! Lock manager trait and lock handle for distributed lock/lease coordination.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::time::Duration;

use crate::LockResult;

/// A held (or observed) lock lease.
///
/// The `version` is regenerated on every successful acquisition, which is what
/// lets [`LockManager::release`] distinguish "I still hold this lease" from
/// "my lease expired and somebody else re-acquired the key".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockHandle {
    /// Key the lock is registered under
    pub lock_key: String,
    /// Identity of the holder that acquired this lease
    pub holder_id: String,
    /// Acquisition version (fresh ULID per successful acquire)
    pub version: String,
    /// Instant at which the lease lapses
    pub expires_at: DateTime<Utc>,
}

impl LockHandle {
    /// Whether the lease has lapsed.
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }
}

/// Trait for distributed lock/lease management.
///
/// ## Purpose
/// Provides atomic single-attempt operations for acquiring and releasing named
/// locks. Waiting is not a backend concern: the bounded wait loop
/// lives in [`LockTemplate`](crate::LockTemplate) so every backend shares the
/// same policy.
///
/// ## Behavior
/// - **Acquire**: if the lock doesn't exist, or exists but its lease expired,
///   it is granted with a fresh version. If it is validly held by a different
///   holder, [`LockError::LockAlreadyHeld`](crate::LockError::LockAlreadyHeld)
///   is returned. Re-acquisition by the same holder returns the existing lease.
/// - **Release**: validates holder and version before removing the entry, so a
///   stale handle can never release a re-acquired lock.
#[async_trait]
pub trait LockManager: Send + Sync {
    /// Attempt to acquire `key` for `holder_id` with the given lease duration.
    ///
    /// ## Returns
    /// - `Ok(LockHandle)`: lock acquired (or already held by `holder_id`)
    /// - `Err(LockError::LockAlreadyHeld)`: validly held by a different holder
    /// - `Err(LockError::BackendError)`: backend failure
    async fn acquire(&self, key: &str, holder_id: &str, lease: Duration) -> LockResult<LockHandle>;

    /// Release a previously acquired lease.
    ///
    /// ## Returns
    /// - `Ok(())`: released
    /// - `Err(LockError::LockNotFound)`: no lock stored under the key
    /// - `Err(LockError::VersionMismatch)`: the stored lease is not the one
    ///   presented (it expired and was re-acquired); nothing is released
    /// - `Err(LockError::LockAlreadyHeld)`: stored lease belongs to another
    ///   holder; nothing is released
    async fn release(&self, handle: &LockHandle) -> LockResult<()>;

    /// Current lock state (non-blocking), if any.
    async fn get(&self, key: &str) -> LockResult<Option<LockHandle>>;
}
