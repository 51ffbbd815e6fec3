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

//! Error types for stock operations.

use plexgate_locks::LockError;
use thiserror::Error;

/// Result type for stock operations.
pub type StockResult<T> = Result<T, StockError>;

/// Errors that can occur while reading or decrementing stock.
///
/// Callers react per kind: [`StockError::InsufficientStock`] is an expected
/// conflict, [`StockError::RetriesExhausted`] is a server-side failure, and
/// a wrapped [`LockError::AcquisitionTimeout`] is retryable by the caller.
#[derive(Error, Debug)]
pub enum StockError {
    /// No stock record exists for the resource
    #[error("Stock record not found: {0}")]
    NotFound(String),

    /// Requested more than remains; the record is unchanged
    #[error("Insufficient stock: remaining {remaining}, requested {requested}")]
    InsufficientStock {
        /// Units still available
        remaining: u32,
        /// Units the caller asked for
        requested: u32,
    },

    /// Quantity must be positive
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(u32),

    /// Optimistic strategy gave up after too many version conflicts
    #[error("Too many retries decreasing stock for resource {resource_id} ({attempts} attempts)")]
    RetriesExhausted {
        /// Resource whose record kept conflicting
        resource_id: String,
        /// Attempts made before giving up
        attempts: u32,
    },

    /// Distributed-lock strategy failure (timeout or backend)
    #[error(transparent)]
    Lock(#[from] LockError),

    /// Backend error (store, network, etc.)
    #[error("Backend error: {0}")]
    BackendError(String),
}

#[cfg(feature = "sqlite-backend")]
impl From<sqlx::Error> for StockError {
    fn from(err: sqlx::Error) -> Self {
        StockError::BackendError(format!("SQL error: {}", err))
    }
}
