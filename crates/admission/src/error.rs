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

//! Error types for admission operations.
//!
//! Every variant is an expected, distinguishable outcome the caller reacts to
//! differently: conflicts surface as [`AdmissionError::AlreadyInQueue`] /
//! [`AdmissionError::Stock`], authorization failures as
//! [`AdmissionError::QueueAccessDenied`], lookups of unknown users as
//! [`AdmissionError::NotInQueue`]. Only notification delivery failures are
//! ever swallowed (and logged) instead of surfacing here.

use plexgate_locks::LockError;
use plexgate_queue::QueueError;
use plexgate_stock::StockError;
use thiserror::Error;

/// Result type for admission operations.
pub type AdmissionResult<T> = Result<T, AdmissionError>;

/// Errors that can occur while driving the admission gate.
#[derive(Error, Debug)]
pub enum AdmissionError {
    /// Registration attempted while already waiting or processing
    #[error("User {user_id} is already queued for resource {resource_id}")]
    AlreadyInQueue {
        /// Resource being gated
        resource_id: String,
        /// User that double-registered
        user_id: String,
    },

    /// Purchase attempted without processing membership
    #[error("User {user_id} is not in the processing set for resource {resource_id}")]
    QueueAccessDenied {
        /// Resource being gated
        resource_id: String,
        /// User that was denied
        user_id: String,
    },

    /// Cancel attempted for a user with no queue record
    #[error("User {user_id} has no queue entry for resource {resource_id}")]
    NotInQueue {
        /// Resource being gated
        resource_id: String,
        /// Unknown user
        user_id: String,
    },

    /// Lock failure (acquisition timeout or backend)
    #[error(transparent)]
    Lock(#[from] LockError),

    /// Queue structure failure
    #[error(transparent)]
    Queue(#[from] QueueError),

    /// Stock failure (insufficient stock, retry exhaustion, backend)
    #[error(transparent)]
    Stock(#[from] StockError),
}
