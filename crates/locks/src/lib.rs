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

//! # PlexGate Distributed Locks
//!
//! ## Purpose
//! Provides named mutual-exclusion locks with bounded lease times, used to make
//! check-then-act sequences atomic across processes. The admission gate takes a
//! per-(resource,user) lock for queue registration and a per-resource lock for
//! batch promotion; the distributed-lock stock strategy takes a per-resource
//! lock around its counter decrement.
//!
//! ## Design Decisions
//! - **Lease-based expiry**: every acquisition carries a lease; a crashed
//!   holder's lock becomes acquirable once the lease lapses.
//! - **Version-checked release**: each acquisition is stamped with a fresh
//!   [`ulid::Ulid`] version, and release validates key, holder, and version.
//!   A lease that expired and was re-acquired elsewhere can never be released
//!   by the stale holder.
//! - **Non-blocking backends, blocking template**: backends expose a single
//!   atomic `acquire` attempt; [`LockTemplate`] layers the bounded wait loop
//!   on top so all backends share one waiting policy.
//!
//! ## Backend Support
//! - **InMemory**: HashMap-based, always available, single process
//! - **Redis**: `SET NX PX` acquisition with transactional release
//!   (feature: `redis-backend`)
//!
//! ## Examples
//! ```rust,no_run
//! use plexgate_locks::{LockTemplate, MemoryLockManager};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let template = LockTemplate::new(
//!     Arc::new(MemoryLockManager::new()),
//!     Duration::from_secs(5),
//!     Duration::from_secs(3),
//! );
//!
//! let value = template
//!     .with_lock("LOCK:QUEUE:RESOURCE:42", || async {
//!         // critical section; the lock is released on every exit path
//!         1 + 1
//!     })
//!     .await?;
//! assert_eq!(value, 2);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod manager;
pub mod memory;
pub mod template;

#[cfg(feature = "redis-backend")]
pub mod redis;

pub use error::{LockError, LockResult};
pub use manager::{LockHandle, LockManager};
pub use memory::MemoryLockManager;
pub use template::LockTemplate;

#[cfg(feature = "redis-backend")]
pub use redis::RedisLockManager;
