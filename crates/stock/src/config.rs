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

//! Strategy selection for the stock guard.
//!
//! Exactly one strategy is active per deployment. Selection happens once at
//! startup through [`build_stock_guard`]; call sites only ever see the
//! [`StockGuard`] trait.

use crate::{
    DistributedLockStockGuard, MutexStockGuard, OptimisticStockGuard, PessimisticStockGuard,
    StockGuard, StockRepository,
};
use plexgate_locks::LockTemplate;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

/// Which concurrency-control strategy guards the stock counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StockStrategy {
    /// Version-checked read-modify-write with bounded retries
    Optimistic,
    /// Exclusive record lock in the storage engine
    Pessimistic,
    /// Named distributed lock around a plain read-modify-write
    Distributed,
    /// One in-process mutex; single-process deployments only
    InProcess,
}

impl FromStr for StockStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "optimistic" => Ok(StockStrategy::Optimistic),
            "pessimistic" => Ok(StockStrategy::Pessimistic),
            "distributed" => Ok(StockStrategy::Distributed),
            "in-process" | "inprocess" => Ok(StockStrategy::InProcess),
            other => Err(format!("unknown stock strategy: {other}")),
        }
    }
}

/// Tuning knobs for the optimistic strategy's retry loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockTuning {
    /// Attempts before the optimistic strategy gives up
    pub max_attempts: u32,
    /// Delay between optimistic attempts
    pub retry_delay: Duration,
}

impl Default for StockTuning {
    fn default() -> Self {
        Self {
            max_attempts: 30,
            retry_delay: Duration::from_millis(30),
        }
    }
}

/// Build the configured guard over a repository.
///
/// The distributed strategy serializes through `locks`; the other strategies
/// ignore it.
pub fn build_stock_guard(
    strategy: StockStrategy,
    repository: Arc<dyn StockRepository>,
    locks: LockTemplate,
    tuning: StockTuning,
) -> Arc<dyn StockGuard> {
    match strategy {
        StockStrategy::Optimistic => Arc::new(OptimisticStockGuard::new(
            repository,
            tuning.max_attempts,
            tuning.retry_delay,
        )),
        StockStrategy::Pessimistic => Arc::new(PessimisticStockGuard::new(repository)),
        StockStrategy::Distributed => Arc::new(DistributedLockStockGuard::new(repository, locks)),
        StockStrategy::InProcess => Arc::new(MutexStockGuard::new(repository)),
    }
}
