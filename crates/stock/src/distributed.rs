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

//! Distributed-lock stock guard.

use crate::{StockGuard, StockRepository, StockResult};
use async_trait::async_trait;
use plexgate_locks::LockTemplate;
use std::sync::Arc;

/// Prefix for the per-resource stock mutation lock.
pub const STOCK_LOCK_PREFIX: &str = "LOCK:STOCK:";

fn stock_lock_key(resource_id: &str) -> String {
    format!("{STOCK_LOCK_PREFIX}{resource_id}")
}

/// Named mutual exclusion around a plain read-modify-write.
///
/// Other writers wait on the lock; a wait-window timeout surfaces as
/// [`LockError::AcquisitionTimeout`](plexgate_locks::LockError::AcquisitionTimeout)
/// wrapped in [`StockError::Lock`](crate::StockError::Lock). Works across
/// independent processes when backed by a shared lock store.
pub struct DistributedLockStockGuard {
    repository: Arc<dyn StockRepository>,
    locks: LockTemplate,
}

impl DistributedLockStockGuard {
    /// Create a guard using the given lock template for serialization.
    pub fn new(repository: Arc<dyn StockRepository>, locks: LockTemplate) -> Self {
        Self { repository, locks }
    }
}

#[async_trait]
impl StockGuard for DistributedLockStockGuard {
    async fn decrease(&self, resource_id: &str, quantity: u32) -> StockResult<()> {
        self.locks
            .with_lock(&stock_lock_key(resource_id), || async move {
                self.repository.decrease_unguarded(resource_id, quantity).await
            })
            .await?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{InMemoryStockRepository, StockError, StockRecord};
    use plexgate_locks::{LockError, LockManager, MemoryLockManager};
    use std::time::Duration;

    fn template(manager: Arc<dyn LockManager>) -> LockTemplate {
        LockTemplate::new(manager, Duration::from_secs(5), Duration::from_secs(3))
            .with_retry_interval(Duration::from_millis(2))
    }

    #[tokio::test]
    async fn test_decrease_under_lock() {
        let repo = Arc::new(InMemoryStockRepository::new());
        repo.insert(StockRecord::new("c1", 10)).await.unwrap();
        let guard =
            DistributedLockStockGuard::new(repo.clone(), template(Arc::new(MemoryLockManager::new())));

        guard.decrease("c1", 3).await.unwrap();
        let record = repo.find("c1").await.unwrap().unwrap();
        assert_eq!(record.remaining_quantity, 7);
    }

    #[tokio::test]
    async fn test_lock_timeout_surfaces_and_leaves_stock_unchanged() {
        let manager: Arc<dyn LockManager> = Arc::new(MemoryLockManager::new());
        let repo = Arc::new(InMemoryStockRepository::new());
        repo.insert(StockRecord::new("c1", 10)).await.unwrap();

        // Somebody else holds the stock lock
        manager
            .acquire("LOCK:STOCK:c1", "other-node", Duration::from_secs(30))
            .await
            .unwrap();

        let locks = LockTemplate::new(manager, Duration::from_millis(30), Duration::from_secs(3))
            .with_retry_interval(Duration::from_millis(5));
        let guard = DistributedLockStockGuard::new(repo.clone(), locks);

        let err = guard.decrease("c1", 1).await.unwrap_err();
        assert!(matches!(
            err,
            StockError::Lock(LockError::AcquisitionTimeout(_))
        ));
        let record = repo.find("c1").await.unwrap().unwrap();
        assert_eq!(record.remaining_quantity, 10);
    }

    #[tokio::test]
    async fn test_concurrent_decrements_conserve_stock() {
        let repo = Arc::new(InMemoryStockRepository::new());
        repo.insert(StockRecord::new("c1", 25)).await.unwrap();
        let guard = Arc::new(DistributedLockStockGuard::new(
            repo.clone(),
            template(Arc::new(MemoryLockManager::new())),
        ));

        let mut tasks = vec![];
        for _ in 0..40 {
            let guard = guard.clone();
            tasks.push(tokio::spawn(async move { guard.decrease("c1", 1).await }));
        }

        let mut successes = 0;
        let mut insufficient = 0;
        for task in tasks {
            match task.await.unwrap() {
                Ok(()) => successes += 1,
                Err(StockError::InsufficientStock { .. }) => insufficient += 1,
                Err(e) => panic!("unexpected error: {e}"),
            }
        }

        assert_eq!(successes, 25);
        assert_eq!(insufficient, 15);
        let record = repo.find("c1").await.unwrap().unwrap();
        assert_eq!(record.remaining_quantity, 0);
    }
}
