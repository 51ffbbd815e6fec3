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

//! # PlexGate Stock
//!
//! ## Purpose
//! Owns the scarce counter the admission gate protects: a per-resource
//! [`StockRecord`] and the bounded decrement that must never oversell under
//! concurrency.
//!
//! ## Architecture Context
//! [`StockGuard::decrease`] is the only mutation path. Four interchangeable
//! strategies implement it, selected once at startup (see [`StockStrategy`]
//! and [`build_stock_guard`]), all composing the same [`StockRepository`]
//! storage primitives:
//!
//! | Strategy | Mechanism | Conflict handling |
//! |---|---|---|
//! | [`OptimisticStockGuard`] | version-checked read-modify-write | bounded retries, fatal on exhaustion |
//! | [`PessimisticStockGuard`] | exclusive record lock in the store | writers block, no retry |
//! | [`DistributedLockStockGuard`] | named lock around a plain read-modify-write | writers wait on the lock |
//! | [`MutexStockGuard`] | one in-process mutex | single process only |
//!
//! All four preserve the same observable invariant: for concurrent
//! `decrease` calls, final `remaining = initial − Σ successful quantities`,
//! never negative.
//!
//! ## Backend Support
//! - **InMemory**: RwLock store, always available
//! - **SQLite**: sqlx-backed, versioned rows (feature: `sqlite-backend`)

#![warn(missing_docs)]
#![warn(clippy::all)]

use async_trait::async_trait;

pub mod config;
pub mod distributed;
pub mod error;
pub mod memory;
pub mod mutex;
pub mod optimistic;
pub mod pessimistic;
pub mod record;

#[cfg(feature = "sqlite-backend")]
pub mod sql;

pub use config::{build_stock_guard, StockStrategy, StockTuning};
pub use distributed::DistributedLockStockGuard;
pub use error::{StockError, StockResult};
pub use memory::InMemoryStockRepository;
pub use mutex::MutexStockGuard;
pub use optimistic::OptimisticStockGuard;
pub use pessimistic::PessimisticStockGuard;
pub use record::StockRecord;

#[cfg(feature = "sqlite-backend")]
pub use sql::SqliteStockRepository;

/// Storage primitives for [`StockRecord`]s.
///
/// The repository exposes three mutation shapes so each guard strategy can
/// pick the consistency level it is built around. None of them is a public
/// decrement API; that is [`StockGuard`]'s job.
#[async_trait]
pub trait StockRepository: Send + Sync {
    /// Store a record, replacing any previous one for the resource (seeding).
    async fn insert(&self, record: StockRecord) -> StockResult<()>;

    /// Load the record for a resource.
    async fn find(&self, resource_id: &str) -> StockResult<Option<StockRecord>>;

    /// Commit `remaining` only if the stored version still equals
    /// `expected_version`, bumping the version on success.
    ///
    /// ## Returns
    /// - `Ok(true)`: committed
    /// - `Ok(false)`: version conflict; nothing written
    /// - `Err(StockError::NotFound)`: no record for the resource
    async fn update_if_version(
        &self,
        resource_id: &str,
        expected_version: u64,
        remaining: u32,
    ) -> StockResult<bool>;

    /// Read-validate-write under the backend's exclusive record lock.
    async fn decrease_exclusive(&self, resource_id: &str, quantity: u32) -> StockResult<()>;

    /// Plain read-validate-write with no concurrency protection of its own;
    /// callers must serialize it externally.
    async fn decrease_unguarded(&self, resource_id: &str, quantity: u32) -> StockResult<()>;
}

/// The bounded decrement of a resource's remaining stock.
///
/// ## Behavior
/// - missing record → [`StockError::NotFound`]
/// - `quantity` of zero → [`StockError::InvalidQuantity`]
/// - `quantity > remaining` → [`StockError::InsufficientStock`], record
///   unchanged
/// - otherwise `remaining -= quantity`, atomically with respect to every
///   other `decrease` caller of the same deployment's strategy
#[async_trait]
pub trait StockGuard: Send + Sync {
    /// Decrease the resource's remaining stock by `quantity`.
    async fn decrease(&self, resource_id: &str, quantity: u32) -> StockResult<()>;
}
