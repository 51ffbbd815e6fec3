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

//! Pessimistic (exclusive record lock) stock guard.

use crate::{StockGuard, StockRepository, StockResult};
use async_trait::async_trait;
use std::sync::Arc;

/// Exclusive read-lock on the record for the duration of the mutation.
///
/// Other writers block in the storage engine until the lock is released; no
/// retry is needed. Requires a backend with record-level locking
/// ([`decrease_exclusive`](StockRepository::decrease_exclusive)).
pub struct PessimisticStockGuard {
    repository: Arc<dyn StockRepository>,
}

impl PessimisticStockGuard {
    /// Create a guard over the given repository.
    pub fn new(repository: Arc<dyn StockRepository>) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl StockGuard for PessimisticStockGuard {
    async fn decrease(&self, resource_id: &str, quantity: u32) -> StockResult<()> {
        self.repository.decrease_exclusive(resource_id, quantity).await
    }
}
