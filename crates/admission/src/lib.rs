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

//! # PlexGate Admission
//!
//! ## Purpose
//! Drives the admission gate's state machine and the purchase operation it
//! protects. Users move through
//! `NOT_IN_QUEUE → WAITING → {CAN_ENTER | PROCESSING} → NOT_IN_QUEUE`,
//! with promotions serialized per resource and registrations serialized per
//! (resource, user).
//!
//! ## Key Components
//! - [`AdmissionOrchestrator`]: registration, promotion, completion,
//!   cancellation, and the notification side effects of each
//! - [`ChannelRegistry`] / [`InMemoryChannelRegistry`]: per-(resource, user)
//!   one-way push channels with explicit lifecycle; channel state is
//!   per-instance and never replicated across gate instances
//! - [`PurchaseService`]: the gated decrement (membership check, stock
//!   guard, and the cleanup that always runs)
//!
//! ## Concurrency Model
//! Promotion for a resource passes through exactly one lock key, so no two
//! promotions for the same resource run concurrently; this is the only path
//! that strictly enforces the processing capacity. Advisory reads
//! ([`AdmissionOrchestrator::can_enter`],
//! [`AdmissionOrchestrator::queue_info`]) are lock-free and may
//! be stale: cheap hints for polling clients, not authorization. The only
//! authorization boundary is the live membership check inside
//! [`PurchaseService::purchase`].

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod events;
pub mod notify;
pub mod orchestrator;
pub mod purchase;

pub use error::{AdmissionError, AdmissionResult};
pub use events::QueueEvent;
pub use notify::{ChannelRegistry, EventSubscription, InMemoryChannelRegistry};
pub use orchestrator::AdmissionOrchestrator;
pub use purchase::PurchaseService;
