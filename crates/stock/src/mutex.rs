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

//! In-process mutual-exclusion stock guard.

use crate::{StockGuard, StockRepository, StockResult};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;

/// One in-memory mutex serializes all callers of this process.
///
/// Provides **no** protection against concurrent writers in other processes:
/// a horizontally scaled deployment must use the optimistic, pessimistic, or
/// distributed-lock strategy instead. Included as the single-process baseline
/// for comparison.
pub struct MutexStockGuard {
    repository: Arc<dyn StockRepository>,
    serializer: Mutex<()>,
}

impl MutexStockGuard {
    /// Create a guard over the given repository.
    pub fn new(repository: Arc<dyn StockRepository>) -> Self {
        Self {
            repository,
            serializer: Mutex::new(()),
        }
    }
}

#[async_trait]
impl StockGuard for MutexStockGuard {
    async fn decrease(&self, resource_id: &str, quantity: u32) -> StockResult<()> {
        let _guard = self.serializer.lock().await;
        self.repository.decrease_unguarded(resource_id, quantity).await
    }
}
