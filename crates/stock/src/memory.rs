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

//! In-memory stock repository implementation.

use crate::{StockError, StockRecord, StockRepository, StockResult};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// In-memory stock repository.
///
/// ## Purpose
/// RwLock-backed record store for testing and single-process deployments.
///
/// ## Consistency levels
/// - `update_if_version` is an atomic compare-and-set on the record version
/// - `decrease_exclusive` holds the store's write guard across its whole
///   read-validate-write (the record-lock equivalent)
/// - `decrease_unguarded` reads and writes in two separate guard
///   acquisitions and loses updates unless the caller serializes it
#[derive(Clone, Default)]
pub struct InMemoryStockRepository {
    records: Arc<RwLock<HashMap<String, StockRecord>>>,
}

impl InMemoryStockRepository {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StockRepository for InMemoryStockRepository {
    async fn insert(&self, record: StockRecord) -> StockResult<()> {
        let mut records = self.records.write().await;
        records.insert(record.resource_id.clone(), record);
        Ok(())
    }

    async fn find(&self, resource_id: &str) -> StockResult<Option<StockRecord>> {
        let records = self.records.read().await;
        Ok(records.get(resource_id).cloned())
    }

    async fn update_if_version(
        &self,
        resource_id: &str,
        expected_version: u64,
        remaining: u32,
    ) -> StockResult<bool> {
        let mut records = self.records.write().await;
        let record = records
            .get_mut(resource_id)
            .ok_or_else(|| StockError::NotFound(resource_id.to_string()))?;

        if record.version != expected_version {
            return Ok(false);
        }
        record.remaining_quantity = remaining;
        record.version += 1;
        Ok(true)
    }

    async fn decrease_exclusive(&self, resource_id: &str, quantity: u32) -> StockResult<()> {
        let mut records = self.records.write().await;
        let record = records
            .get_mut(resource_id)
            .ok_or_else(|| StockError::NotFound(resource_id.to_string()))?;
        record.decrease(quantity)
    }

    async fn decrease_unguarded(&self, resource_id: &str, quantity: u32) -> StockResult<()> {
        let mut record = {
            let records = self.records.read().await;
            records
                .get(resource_id)
                .cloned()
                .ok_or_else(|| StockError::NotFound(resource_id.to_string()))?
        };

        record.decrease(quantity)?;

        let mut records = self.records.write().await;
        records.insert(resource_id.to_string(), record);
        Ok(())
    }
}
