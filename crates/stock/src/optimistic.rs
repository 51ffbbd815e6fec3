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

//! Optimistic (version-checked) stock guard.

use crate::{StockError, StockGuard, StockRepository, StockResult};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Version-checked read-modify-write with bounded retries.
///
/// Conflicting writers are detected at commit via the record version; the
/// loser re-reads and retries after a short delay. Insufficient stock fails
/// immediately (retrying cannot make units reappear). When the attempt bound
/// is exhausted the guard fails with [`StockError::RetriesExhausted`], a
/// server-side failure distinct from a stock conflict.
///
/// Works in a single process or distributed, since the version check lives in
/// storage.
pub struct OptimisticStockGuard {
    repository: Arc<dyn StockRepository>,
    max_attempts: u32,
    retry_delay: Duration,
}

impl OptimisticStockGuard {
    /// Create a guard with the given retry bound and delay between attempts.
    pub fn new(repository: Arc<dyn StockRepository>, max_attempts: u32, retry_delay: Duration) -> Self {
        Self {
            repository,
            max_attempts: max_attempts.max(1),
            retry_delay,
        }
    }
}

#[async_trait]
impl StockGuard for OptimisticStockGuard {
    async fn decrease(&self, resource_id: &str, quantity: u32) -> StockResult<()> {
        for attempt in 1..=self.max_attempts {
            let record = self
                .repository
                .find(resource_id)
                .await?
                .ok_or_else(|| StockError::NotFound(resource_id.to_string()))?;

            let mut updated = record.clone();
            updated.decrease(quantity)?;

            if self
                .repository
                .update_if_version(resource_id, record.version, updated.remaining_quantity)
                .await?
            {
                return Ok(());
            }

            debug!(resource_id, attempt, "stock version conflict, retrying");
            tokio::time::sleep(self.retry_delay).await;
        }

        Err(StockError::RetriesExhausted {
            resource_id: resource_id.to_string(),
            attempts: self.max_attempts,
        })
    }
}
