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

//! PlexGate: a queue-gated admission engine for scarce stock.
//!
//! A FIFO waiting queue and a capacity-bounded processing set stand between
//! clients and a finite counter; promotions are serialized per resource, and
//! the counter decrement runs behind one of four interchangeable
//! concurrency-control strategies (optimistic, pessimistic, distributed lock,
//! in-process mutex) so their tradeoffs can be compared under load.
//!
//! The member crates own the building blocks:
//! - `plexgate-locks`: distributed locks with bounded wait and lease expiry
//! - `plexgate-queue`: the waiting/processing membership structures
//! - `plexgate-stock`: the guarded counter and its four strategies
//! - `plexgate-admission`: the orchestration state machine, notification
//!   channels, and the gated purchase
//!
//! This crate re-exports them and adds the configuration surface plus the
//! [`PlexGate`] assembly.
//!
//! ```rust
//! use plexgate::{GateConfig, PlexGate};
//! use plexgate::stock::{StockRecord, StockRepository};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let gate = PlexGate::in_memory(GateConfig::default());
//! gate.stock().insert(StockRecord::new("concert-1", 500)).await?;
//!
//! let mut events = gate.register_and_subscribe("concert-1", "user-1").await?;
//! // ... wait for the enter event, then:
//! gate.purchase("concert-1", "user-1", 2).await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

// Independent crates - re-export them here
pub use plexgate_admission as admission;
pub use plexgate_locks as locks;
pub use plexgate_queue as queue;
pub use plexgate_stock as stock;

pub mod config;
pub mod gate;

pub use config::{ConfigError, GateConfig};
pub use gate::PlexGate;

// Re-export the operation-level types for convenience
pub use admission::{
    AdmissionError, AdmissionOrchestrator, AdmissionResult, ChannelRegistry, EventSubscription,
    PurchaseService, QueueEvent,
};
pub use queue::{QueueInfo, QueueStatus};
pub use stock::{StockGuard, StockRecord, StockStrategy};
