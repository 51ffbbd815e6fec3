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

//! Configuration surface of the gate.
//!
//! ## Environment Variables
//!
//! - `PLEXGATE_MAX_PROCESSING_COUNT`: processing capacity per resource
//!   (default: 100)
//! - `PLEXGATE_ENTRY_TIMEOUT_SECONDS`: processing-set idle timeout
//!   (default: 300)
//! - `PLEXGATE_WAITING_TIMEOUT_SECONDS`: waiting-queue idle timeout
//!   (default: 1800)
//! - `PLEXGATE_LOCK_WAIT_TIME_SECONDS`: bounded lock wait (default: 5)
//! - `PLEXGATE_LOCK_LEASE_TIME_SECONDS`: lock lease (default: 3)
//! - `PLEXGATE_LOCK_RETRY_INTERVAL_MS`: lock polling interval (default: 50)
//! - `PLEXGATE_CHANNEL_TIMEOUT_MS`: notification channel lifetime
//!   (default: 600000)
//! - `PLEXGATE_STOCK_STRATEGY`: `optimistic` | `pessimistic` | `distributed`
//!   | `in-process` (default: distributed)
//! - `PLEXGATE_STOCK_MAX_ATTEMPTS`: optimistic retry bound (default: 30)
//! - `PLEXGATE_STOCK_RETRY_DELAY_MS`: optimistic retry delay (default: 30)

use plexgate_queue::QueueConfig;
use plexgate_stock::{StockStrategy, StockTuning};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Configuration failure (unparsable environment value).
#[derive(Error, Debug)]
#[error("Configuration error: {0}")]
pub struct ConfigError(pub String);

/// Every recognized tunable of the admission gate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateConfig {
    /// Processing capacity per resource
    pub max_processing_count: usize,
    /// Processing-set idle timeout, seconds
    pub entry_timeout_seconds: u64,
    /// Waiting-queue idle timeout, seconds
    pub waiting_timeout_seconds: u64,
    /// Bounded wait for distributed locks, seconds
    pub lock_wait_time_seconds: u64,
    /// Distributed lock lease, seconds
    pub lock_lease_time_seconds: u64,
    /// Lock acquisition polling interval, milliseconds
    pub lock_retry_interval_ms: u64,
    /// Notification channel lifetime, milliseconds
    pub channel_timeout_ms: u64,
    /// Active stock guard strategy
    pub stock_strategy: StockStrategy,
    /// Optimistic strategy retry bound
    pub stock_max_attempts: u32,
    /// Optimistic strategy retry delay, milliseconds
    pub stock_retry_delay_ms: u64,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            max_processing_count: 100,
            entry_timeout_seconds: 300,
            waiting_timeout_seconds: 1800,
            lock_wait_time_seconds: 5,
            lock_lease_time_seconds: 3,
            lock_retry_interval_ms: 50,
            channel_timeout_ms: 600_000,
            stock_strategy: StockStrategy::Distributed,
            stock_max_attempts: 30,
            stock_retry_delay_ms: 30,
        }
    }
}

fn env_parse<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .parse()
            .map_err(|e| ConfigError(format!("{key}: {e}"))),
        Err(_) => Ok(default),
    }
}

impl GateConfig {
    /// Create configuration from `PLEXGATE_*` environment variables, falling
    /// back to defaults for anything unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            max_processing_count: env_parse(
                "PLEXGATE_MAX_PROCESSING_COUNT",
                defaults.max_processing_count,
            )?,
            entry_timeout_seconds: env_parse(
                "PLEXGATE_ENTRY_TIMEOUT_SECONDS",
                defaults.entry_timeout_seconds,
            )?,
            waiting_timeout_seconds: env_parse(
                "PLEXGATE_WAITING_TIMEOUT_SECONDS",
                defaults.waiting_timeout_seconds,
            )?,
            lock_wait_time_seconds: env_parse(
                "PLEXGATE_LOCK_WAIT_TIME_SECONDS",
                defaults.lock_wait_time_seconds,
            )?,
            lock_lease_time_seconds: env_parse(
                "PLEXGATE_LOCK_LEASE_TIME_SECONDS",
                defaults.lock_lease_time_seconds,
            )?,
            lock_retry_interval_ms: env_parse(
                "PLEXGATE_LOCK_RETRY_INTERVAL_MS",
                defaults.lock_retry_interval_ms,
            )?,
            channel_timeout_ms: env_parse(
                "PLEXGATE_CHANNEL_TIMEOUT_MS",
                defaults.channel_timeout_ms,
            )?,
            stock_strategy: env_parse("PLEXGATE_STOCK_STRATEGY", defaults.stock_strategy)?,
            stock_max_attempts: env_parse(
                "PLEXGATE_STOCK_MAX_ATTEMPTS",
                defaults.stock_max_attempts,
            )?,
            stock_retry_delay_ms: env_parse(
                "PLEXGATE_STOCK_RETRY_DELAY_MS",
                defaults.stock_retry_delay_ms,
            )?,
        })
    }

    /// Queue tunables.
    pub fn queue_config(&self) -> QueueConfig {
        QueueConfig {
            max_processing_count: self.max_processing_count,
            waiting_timeout: Duration::from_secs(self.waiting_timeout_seconds),
            entry_timeout: Duration::from_secs(self.entry_timeout_seconds),
        }
    }

    /// Optimistic retry tunables.
    pub fn stock_tuning(&self) -> StockTuning {
        StockTuning {
            max_attempts: self.stock_max_attempts,
            retry_delay: Duration::from_millis(self.stock_retry_delay_ms),
        }
    }

    /// Bounded lock wait window.
    pub fn lock_wait_time(&self) -> Duration {
        Duration::from_secs(self.lock_wait_time_seconds)
    }

    /// Lock lease duration.
    pub fn lock_lease_time(&self) -> Duration {
        Duration::from_secs(self.lock_lease_time_seconds)
    }

    /// Lock polling interval.
    pub fn lock_retry_interval(&self) -> Duration {
        Duration::from_millis(self.lock_retry_interval_ms)
    }

    /// Notification channel lifetime.
    pub fn channel_timeout(&self) -> Duration {
        Duration::from_millis(self.channel_timeout_ms)
    }
}
