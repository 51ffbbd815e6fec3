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

//! In-memory lock manager implementation.

use crate::{LockError, LockHandle, LockManager, LockResult};
use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use ulid::Ulid;

/// In-memory lock manager.
///
/// ## Purpose
/// Provides a simple in-memory implementation of [`LockManager`] for testing
/// and single-process deployments.
///
/// ## Limitations
/// - Not persistent (locks lost on restart)
/// - Not distributed (single process only)
/// - No background cleanup (expired leases are reclaimed on access)
#[derive(Clone, Default)]
pub struct MemoryLockManager {
    locks: Arc<RwLock<HashMap<String, LockHandle>>>,
}

impl MemoryLockManager {
    /// Create a new in-memory lock manager.
    pub fn new() -> Self {
        Self::default()
    }

    fn grant(key: &str, holder_id: &str, lease: Duration) -> LockHandle {
        LockHandle {
            lock_key: key.to_string(),
            holder_id: holder_id.to_string(),
            version: Ulid::new().to_string(),
            expires_at: Utc::now()
                + ChronoDuration::milliseconds(lease.as_millis() as i64),
        }
    }
}

#[async_trait]
impl LockManager for MemoryLockManager {
    async fn acquire(&self, key: &str, holder_id: &str, lease: Duration) -> LockResult<LockHandle> {
        let mut locks = self.locks.write().await;

        if let Some(existing) = locks.get(key) {
            if !existing.is_expired() {
                if existing.holder_id == holder_id {
                    // Same holder, return existing lease
                    return Ok(existing.clone());
                }
                return Err(LockError::LockAlreadyHeld(existing.holder_id.clone()));
            }
            // Expired lease falls through and is re-granted
        }

        let handle = Self::grant(key, holder_id, lease);
        locks.insert(key.to_string(), handle.clone());
        Ok(handle)
    }

    async fn release(&self, handle: &LockHandle) -> LockResult<()> {
        let mut locks = self.locks.write().await;

        let existing = locks
            .get(&handle.lock_key)
            .ok_or_else(|| LockError::LockNotFound(handle.lock_key.clone()))?;

        if existing.version != handle.version {
            return Err(LockError::VersionMismatch {
                expected: existing.version.clone(),
                actual: handle.version.clone(),
            });
        }

        if existing.holder_id != handle.holder_id {
            return Err(LockError::LockAlreadyHeld(existing.holder_id.clone()));
        }

        locks.remove(&handle.lock_key);
        Ok(())
    }

    async fn get(&self, key: &str) -> LockResult<Option<LockHandle>> {
        let locks = self.locks.read().await;
        Ok(locks.get(key).filter(|h| !h.is_expired()).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_acquire_lock() {
        let manager = MemoryLockManager::new();
        let handle = manager
            .acquire("test-lock", "node-1", Duration::from_secs(30))
            .await
            .unwrap();

        assert_eq!(handle.lock_key, "test-lock");
        assert_eq!(handle.holder_id, "node-1");
        assert!(!handle.is_expired());
    }

    #[tokio::test]
    async fn test_acquire_lock_already_held() {
        let manager = MemoryLockManager::new();
        manager
            .acquire("test-lock", "node-1", Duration::from_secs(30))
            .await
            .unwrap();

        let result = manager
            .acquire("test-lock", "node-2", Duration::from_secs(30))
            .await;

        assert!(matches!(result, Err(LockError::LockAlreadyHeld(_))));
    }

    #[tokio::test]
    async fn test_acquire_lock_same_holder() {
        let manager = MemoryLockManager::new();
        let first = manager
            .acquire("test-lock", "node-1", Duration::from_secs(30))
            .await
            .unwrap();

        // Same holder acquiring again should return the existing lease
        let second = manager
            .acquire("test-lock", "node-1", Duration::from_secs(30))
            .await
            .unwrap();

        assert_eq!(first.version, second.version);
    }

    #[tokio::test]
    async fn test_release_lock() {
        let manager = MemoryLockManager::new();
        let handle = manager
            .acquire("test-lock", "node-1", Duration::from_secs(30))
            .await
            .unwrap();

        manager.release(&handle).await.unwrap();
        assert!(manager.get("test-lock").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_release_lock_version_mismatch() {
        let manager = MemoryLockManager::new();
        let mut handle = manager
            .acquire("test-lock", "node-1", Duration::from_secs(30))
            .await
            .unwrap();
        handle.version = "stale-version".to_string();

        let result = manager.release(&handle).await;
        assert!(matches!(result, Err(LockError::VersionMismatch { .. })));

        // Lock is still held
        assert!(manager.get("test-lock").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_release_lock_not_found() {
        let manager = MemoryLockManager::new();
        let handle = LockHandle {
            lock_key: "missing".to_string(),
            holder_id: "node-1".to_string(),
            version: Ulid::new().to_string(),
            expires_at: Utc::now(),
        };

        let result = manager.release(&handle).await;
        assert!(matches!(result, Err(LockError::LockNotFound(_))));
    }

    #[tokio::test]
    async fn test_acquire_expired_lock() {
        let manager = MemoryLockManager::new();
        let old = manager
            .acquire("test-lock", "node-1", Duration::from_millis(20))
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(50)).await;

        // Different holder can take over the lapsed lease
        let new = manager
            .acquire("test-lock", "node-2", Duration::from_secs(30))
            .await
            .unwrap();

        assert_eq!(new.holder_id, "node-2");
        assert_ne!(new.version, old.version);

        // The stale handle can no longer release it
        let result = manager.release(&old).await;
        assert!(matches!(result, Err(LockError::VersionMismatch { .. })));
        assert!(manager.get("test-lock").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_get_filters_expired() {
        let manager = MemoryLockManager::new();
        manager
            .acquire("test-lock", "node-1", Duration::from_millis(20))
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(manager.get("test-lock").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_concurrent_lock_acquisition() {
        let manager = Arc::new(MemoryLockManager::new());
        let mut handles = vec![];

        for i in 0..10 {
            let manager = manager.clone();
            handles.push(tokio::spawn(async move {
                manager
                    .acquire("concurrent-lock", &format!("node-{}", i), Duration::from_secs(30))
                    .await
            }));
        }

        let mut successes = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                successes += 1;
            }
        }

        // Only one winner
        assert_eq!(successes, 1);
    }

    #[tokio::test]
    async fn test_multiple_locks() {
        let manager = MemoryLockManager::new();

        let lock1 = manager
            .acquire("lock-1", "node-1", Duration::from_secs(30))
            .await
            .unwrap();
        let lock2 = manager
            .acquire("lock-2", "node-1", Duration::from_secs(30))
            .await
            .unwrap();

        assert_ne!(lock1.lock_key, lock2.lock_key);
        assert!(manager.get("lock-1").await.unwrap().is_some());
        assert!(manager.get("lock-2").await.unwrap().is_some());
    }
}
