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

//! Error types for distributed lock operations.

use thiserror::Error;

/// Result type for lock operations.
pub type LockResult<T> = Result<T, LockError>;

/// Errors that can occur during lock operations.
#[derive(Error, Debug)]
pub enum LockError {
    /// Lock not found
    #[error("Lock not found: {0}")]
    LockNotFound(String),

    /// Lock already held by another holder
    #[error("Lock already held by: {0}")]
    LockAlreadyHeld(String),

    /// Lock not acquired within the configured wait window. The guarded
    /// action never ran.
    #[error("Failed to acquire lock within wait time: {0}")]
    AcquisitionTimeout(String),

    /// Version mismatch (the lease was lost and possibly re-acquired)
    #[error("Version mismatch: expected {expected}, got {actual}")]
    VersionMismatch {
        /// Version currently stored for the lock
        expected: String,
        /// Version presented by the caller
        actual: String,
    },

    /// Backend error (store, network, etc.)
    #[error("Backend error: {0}")]
    BackendError(String),
}

#[cfg(feature = "redis-backend")]
impl From<redis::RedisError> for LockError {
    fn from(err: redis::RedisError) -> Self {
        LockError::BackendError(format!("Redis error: {}", err))
    }
}
