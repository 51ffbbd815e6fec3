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

//! Bounded-wait lock wrapper around a [`LockManager`] backend.

use crate::{LockError, LockManager, LockResult};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};
use ulid::Ulid;

const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_millis(50);

/// Runs actions under a named distributed lock with a bounded wait and a
/// bounded lease.
///
/// ## Behavior
/// `with_lock` polls the backend until the lock is granted or `wait_time`
/// elapses. On timeout it fails with
/// [`LockError::AcquisitionTimeout`] and the action never runs. On success the
/// action runs while the lease is held, and release is attempted on every exit
/// path. Release validates the lease version, so if the lease expired mid-action
/// and was re-acquired by another holder, nothing foreign is released; the
/// failed release is logged and the lease is left to lapse.
///
/// Each `with_lock` call acquires under a fresh holder identity, so nested
/// calls for the same key from one task behave like two distinct holders: the
/// inner call waits and times out rather than corrupting the outer lease.
///
/// Cancellation while waiting leaves nothing held; cancellation while the
/// action is running skips the release and the lease expires on its own.
#[derive(Clone)]
pub struct LockTemplate {
    manager: Arc<dyn LockManager>,
    wait_time: Duration,
    lease_time: Duration,
    retry_interval: Duration,
}

impl LockTemplate {
    /// Create a template with the given wait window and lease duration.
    pub fn new(manager: Arc<dyn LockManager>, wait_time: Duration, lease_time: Duration) -> Self {
        Self {
            manager,
            wait_time,
            lease_time,
            retry_interval: DEFAULT_RETRY_INTERVAL,
        }
    }

    /// Override the acquisition polling interval.
    pub fn with_retry_interval(mut self, retry_interval: Duration) -> Self {
        self.retry_interval = retry_interval;
        self
    }

    /// The backing lock manager.
    pub fn manager(&self) -> &Arc<dyn LockManager> {
        &self.manager
    }

    /// Run `action` while holding the lock named `key`.
    ///
    /// ## Returns
    /// - `Ok(T)`: the action's output; the lock was held for its duration
    /// - `Err(LockError::AcquisitionTimeout)`: not acquired within the wait
    ///   window; the action never ran
    /// - `Err(LockError::BackendError)`: backend failure during acquisition
    pub async fn with_lock<F, Fut, T>(&self, key: &str, action: F) -> LockResult<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let holder_id = Ulid::new().to_string();
        let deadline = Instant::now() + self.wait_time;

        let handle = loop {
            match self.manager.acquire(key, &holder_id, self.lease_time).await {
                Ok(handle) => break handle,
                Err(LockError::LockAlreadyHeld(holder)) => {
                    if Instant::now() >= deadline {
                        debug!(key, held_by = %holder, "lock wait window elapsed");
                        return Err(LockError::AcquisitionTimeout(key.to_string()));
                    }
                    tokio::time::sleep(self.retry_interval).await;
                }
                Err(e) => return Err(e),
            }
        };

        let result = action().await;

        if let Err(e) = self.manager.release(&handle).await {
            // The lease will lapse on its own; nothing else to do here.
            warn!(key, error = %e, "failed to release lock");
        }

        Ok(result)
    }
}
