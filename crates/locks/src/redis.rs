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

//! Redis-based lock manager implementation.
//!
//! Acquisition is a single `SET key value NX PX lease-ms`; the stored value is
//! `"{holder_id}:{version}"`. Release is a WATCH/MULTI/EXEC compare-and-delete
//! against that value, so a lease that lapsed and was re-acquired by another
//! holder is never deleted by the stale handle.

use crate::{LockError, LockHandle, LockManager, LockResult};
use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use redis::{aio::ConnectionManager, AsyncCommands, Client};
use std::time::Duration;
use tracing::instrument;
use ulid::Ulid;

/// Redis lock manager.
///
/// ## Architecture
/// - `redis` crate with async [`ConnectionManager`] (pooled, auto-reconnect)
/// - Native `PX` lease expiry; no background reaper needed
/// - Value-checked release via WATCH/MULTI/EXEC
#[derive(Clone)]
pub struct RedisLockManager {
    manager: ConnectionManager,
}

impl RedisLockManager {
    /// Create a new Redis lock manager.
    ///
    /// Example URLs:
    /// - `redis://127.0.0.1/`
    /// - `redis+tls://host:6379/`
    pub async fn new(redis_url: &str) -> LockResult<Self> {
        let client = Client::open(redis_url)
            .map_err(|e| LockError::BackendError(format!("failed to create redis client: {e}")))?;
        let manager = ConnectionManager::new(client)
            .await
            .map_err(|e| LockError::BackendError(format!("failed to connect redis: {e}")))?;
        Ok(Self { manager })
    }

    fn encode(holder_id: &str, version: &str) -> String {
        format!("{}:{}", holder_id, version)
    }

    fn decode(value: &str) -> (String, String) {
        match value.split_once(':') {
            Some((holder, version)) => (holder.to_string(), version.to_string()),
            None => (value.to_string(), String::new()),
        }
    }
}

#[async_trait]
impl LockManager for RedisLockManager {
    #[instrument(skip(self, lease))]
    async fn acquire(&self, key: &str, holder_id: &str, lease: Duration) -> LockResult<LockHandle> {
        let mut conn = self.manager.clone();
        let version = Ulid::new().to_string();
        let value = Self::encode(holder_id, &version);
        let lease_ms = lease.as_millis() as u64;

        let set: Option<String> = redis::cmd("SET")
            .arg(key)
            .arg(&value)
            .arg("NX")
            .arg("PX")
            .arg(lease_ms)
            .query_async(&mut conn)
            .await
            .map_err(|e| LockError::BackendError(format!("Redis SET failed: {}", e)))?;

        if set.is_some() {
            return Ok(LockHandle {
                lock_key: key.to_string(),
                holder_id: holder_id.to_string(),
                version,
                expires_at: Utc::now() + ChronoDuration::milliseconds(lease_ms as i64),
            });
        }

        // Key already set; report the current holder (or the existing lease
        // when the same holder re-acquires).
        match self.get(key).await? {
            Some(existing) if existing.holder_id == holder_id => Ok(existing),
            Some(existing) => Err(LockError::LockAlreadyHeld(existing.holder_id)),
            // Lease lapsed between SET and GET; next attempt will win.
            None => Err(LockError::LockAlreadyHeld("<expired>".to_string())),
        }
    }

    #[instrument(skip(self, handle), fields(key = %handle.lock_key))]
    async fn release(&self, handle: &LockHandle) -> LockResult<()> {
        let mut conn = self.manager.clone();
        let expected = Self::encode(&handle.holder_id, &handle.version);

        redis::cmd("WATCH")
            .arg(&handle.lock_key)
            .query_async::<()>(&mut conn)
            .await
            .map_err(|e| LockError::BackendError(format!("Redis WATCH failed: {}", e)))?;

        let current: Option<String> = conn
            .get(&handle.lock_key)
            .await
            .map_err(|e| LockError::BackendError(format!("Redis GET failed: {}", e)))?;

        let stored = match current {
            Some(stored) => stored,
            None => {
                redis::cmd("UNWATCH")
                    .query_async::<()>(&mut conn)
                    .await
                    .map_err(|e| LockError::BackendError(format!("Redis UNWATCH failed: {}", e)))?;
                return Err(LockError::LockNotFound(handle.lock_key.clone()));
            }
        };

        if stored != expected {
            redis::cmd("UNWATCH")
                .query_async::<()>(&mut conn)
                .await
                .map_err(|e| LockError::BackendError(format!("Redis UNWATCH failed: {}", e)))?;
            let (stored_holder, stored_version) = Self::decode(&stored);
            if stored_holder != handle.holder_id {
                return Err(LockError::LockAlreadyHeld(stored_holder));
            }
            return Err(LockError::VersionMismatch {
                expected: stored_version,
                actual: handle.version.clone(),
            });
        }

        let mut pipe = redis::pipe();
        pipe.atomic().del(&handle.lock_key);

        let result: Option<Vec<i64>> = pipe
            .query_async(&mut conn)
            .await
            .map_err(|e| LockError::BackendError(format!("Redis EXEC failed: {}", e)))?;

        match result {
            Some(_) => Ok(()),
            // Value changed between WATCH and EXEC: the lease lapsed and was
            // re-acquired mid-release. Nothing was deleted.
            None => Err(LockError::VersionMismatch {
                expected: "<concurrently re-acquired>".to_string(),
                actual: handle.version.clone(),
            }),
        }
    }

    async fn get(&self, key: &str) -> LockResult<Option<LockHandle>> {
        let mut conn = self.manager.clone();

        let value: Option<String> = conn
            .get(key)
            .await
            .map_err(|e| LockError::BackendError(format!("Redis GET failed: {}", e)))?;

        let value = match value {
            Some(value) => value,
            None => return Ok(None),
        };

        let pttl_ms: i64 = redis::cmd("PTTL")
            .arg(key)
            .query_async(&mut conn)
            .await
            .map_err(|e| LockError::BackendError(format!("Redis PTTL failed: {}", e)))?;

        if pttl_ms <= 0 {
            // -2: gone between GET and PTTL; -1: no lease (foreign key)
            return Ok(None);
        }

        let (holder_id, version) = Self::decode(&value);
        Ok(Some(LockHandle {
            lock_key: key.to_string(),
            holder_id,
            version,
            expires_at: Utc::now() + ChronoDuration::milliseconds(pttl_ms),
        }))
    }
}
