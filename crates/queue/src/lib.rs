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

//! # PlexGate Queue
//!
//! ## Purpose
//! Provides the two membership structures of the admission gate:
//!
//! - [`WaitingQueue`]: per-resource FIFO line, ordered by arrival score
//!   (epoch milliseconds), with a whole-structure idle timeout
//! - [`ProcessingSet`]: per-resource set of users currently permitted to act,
//!   cooperatively bounded by `max_processing_count`, with a whole-structure
//!   entry timeout
//!
//! ## Design Decisions
//! - **Store as source of truth**: no application-side cache; every operation
//!   reads or writes the backing structure so multiple gate instances never
//!   diverge.
//! - **Whole-structure TTLs**: expiry is one clock per resource structure,
//!   refreshed on membership-affecting writes. An abandoned queue vanishes as
//!   a unit; a single idle entry among active ones is not evicted on its own.
//! - **No intrinsic cross-call atomicity**: [`WaitingQueue::poll_top`] is the
//!   only read+delete sequence; concurrent `poll_top`/`add` callers must
//!   serialize it through a distributed lock. The backends make each single
//!   call safe, nothing more.
//! - **Tie-break**: entries with equal arrival scores order lexicographically
//!   by user id (ordered-set semantics). Strict first-come-first-served is
//!   therefore probabilistic under same-millisecond registration bursts.
//!
//! ## Backend Support
//! - **InMemory**: ordered-set emulation, always available
//! - **Redis**: sorted set + set per resource (feature: `redis-backend`)
//!
//! ## Examples
//! ```rust
//! use plexgate_queue::{InMemoryQueueStore, QueueConfig, WaitingQueue};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = InMemoryQueueStore::new(QueueConfig::default());
//!
//! store.add("concert-1", "user-a").await?;
//! assert_eq!(store.rank("concert-1", "user-a").await?, Some(0));
//!
//! let promoted = store.poll_top("concert-1", 10).await?;
//! assert_eq!(promoted, vec!["user-a".to_string()]);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

use async_trait::async_trait;

pub mod config;
pub mod error;
pub mod keys;
pub mod memory;
pub mod status;

#[cfg(feature = "redis-backend")]
pub mod redis;

pub use config::QueueConfig;
pub use error::{QueueError, QueueResult};
pub use memory::InMemoryQueueStore;
pub use status::{QueueInfo, QueueStatus};

#[cfg(feature = "redis-backend")]
pub use redis::RedisQueueStore;

/// Per-resource FIFO waiting line.
///
/// Members are ranked ascending by arrival score; rank 0 is next in line.
/// Callers are expected to have verified non-membership (under the
/// registration lock) before calling [`add`](WaitingQueue::add); adding an
/// existing member refreshes its score rather than duplicating it.
#[async_trait]
pub trait WaitingQueue: Send + Sync {
    /// Whether the user holds a waiting entry for the resource.
    async fn contains(&self, resource_id: &str, user_id: &str) -> QueueResult<bool>;

    /// Register the user with the current arrival score and refresh the
    /// structure's idle timeout.
    async fn add(&self, resource_id: &str, user_id: &str) -> QueueResult<()>;

    /// Remove the user's waiting entry, if present.
    async fn remove(&self, resource_id: &str, user_id: &str) -> QueueResult<()>;

    /// 0-based position in arrival order, or `None` when not waiting.
    async fn rank(&self, resource_id: &str, user_id: &str) -> QueueResult<Option<u64>>;

    /// All waiting users in arrival order.
    async fn all(&self, resource_id: &str) -> QueueResult<Vec<String>>;

    /// Remove and return up to `count` lowest-ranked users as a batch.
    ///
    /// Cross-call atomicity against concurrent `poll_top`/`add` is the
    /// caller's responsibility (serialize through the promotion lock).
    async fn poll_top(&self, resource_id: &str, count: u64) -> QueueResult<Vec<String>>;
}

/// Per-resource set of users currently permitted to act on the resource.
///
/// The capacity bound is cooperative: [`size`](ProcessingSet::size) can
/// transiently exceed the maximum under unlocked advisory checks; the locked
/// batch-promotion path is the only one required to respect it strictly.
#[async_trait]
pub trait ProcessingSet: Send + Sync {
    /// Whether the user is a processing member for the resource.
    async fn contains(&self, resource_id: &str, user_id: &str) -> QueueResult<bool>;

    /// Add one user and refresh the structure's entry timeout.
    async fn add(&self, resource_id: &str, user_id: &str) -> QueueResult<()>;

    /// Add a batch of users and refresh the structure's entry timeout once.
    async fn add_all(&self, resource_id: &str, user_ids: &[String]) -> QueueResult<()>;

    /// Remove the user, if present.
    async fn remove(&self, resource_id: &str, user_id: &str) -> QueueResult<()>;

    /// Current member count.
    async fn size(&self, resource_id: &str) -> QueueResult<usize>;

    /// Whether another user fits under `max_processing_count`.
    async fn has_capacity(&self, resource_id: &str) -> QueueResult<bool>;

    /// How many more users fit under `max_processing_count`.
    async fn remaining_capacity(&self, resource_id: &str) -> QueueResult<usize>;
}
