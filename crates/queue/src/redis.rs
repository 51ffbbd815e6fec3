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

//! Redis-based queue store implementation.
//!
//! ## Purpose
//! Provides the distributed backend for the waiting/processing structures:
//! one sorted set (score = arrival epoch millis) and one plain set per
//! resource, with native `EXPIRE` carrying the whole-structure timeouts.
//!
//! ## Design Decisions
//! - **Why ConnectionManager**: automatic pooling and reconnection
//! - **Why a namespace prefix**: lets several deployments share one Redis
//! - **Why per-member ZREM in `poll_top`**: the batch is already serialized
//!   under the promotion lock; a read-then-remove loop keeps the backend free
//!   of scripting while the lock provides the cross-call atomicity

use crate::{keys, ProcessingSet, QueueConfig, QueueError, QueueResult, WaitingQueue};
use async_trait::async_trait;
use chrono::Utc;
use redis::{aio::ConnectionManager, AsyncCommands, Client};
use tracing::instrument;

/// Redis implementation of [`WaitingQueue`] and [`ProcessingSet`].
#[derive(Clone)]
pub struct RedisQueueStore {
    manager: ConnectionManager,
    namespace: String,
    config: QueueConfig,
}

impl RedisQueueStore {
    /// Create a new Redis-backed queue store.
    ///
    /// ## Arguments
    /// * `url` - Redis connection URL (e.g. `redis://localhost:6379`)
    /// * `namespace` - key prefix for isolation (e.g. `plexgate`)
    /// * `config` - shared queue tunables
    pub async fn new(url: &str, namespace: &str, config: QueueConfig) -> QueueResult<Self> {
        let client = Client::open(url)
            .map_err(|e| QueueError::BackendError(format!("failed to create redis client: {e}")))?;
        let manager = ConnectionManager::new(client)
            .await
            .map_err(|e| QueueError::BackendError(format!("failed to connect redis: {e}")))?;
        Ok(Self {
            manager,
            namespace: format!("{}:", namespace),
            config,
        })
    }

    fn waiting_key(&self, resource_id: &str) -> String {
        format!("{}{}", self.namespace, keys::waiting_queue(resource_id))
    }

    fn processing_key(&self, resource_id: &str) -> String {
        format!("{}{}", self.namespace, keys::processing_set(resource_id))
    }
}

#[async_trait]
impl WaitingQueue for RedisQueueStore {
    async fn contains(&self, resource_id: &str, user_id: &str) -> QueueResult<bool> {
        let mut conn = self.manager.clone();
        let key = self.waiting_key(resource_id);
        let score: Option<f64> = conn.zscore(&key, user_id).await?;
        Ok(score.is_some())
    }

    #[instrument(skip(self))]
    async fn add(&self, resource_id: &str, user_id: &str) -> QueueResult<()> {
        let mut conn = self.manager.clone();
        let key = self.waiting_key(resource_id);
        let score = Utc::now().timestamp_millis();

        conn.zadd::<_, _, _, ()>(&key, user_id, score).await?;
        conn.expire::<_, ()>(&key, self.config.waiting_timeout.as_secs() as i64)
            .await?;
        Ok(())
    }

    async fn remove(&self, resource_id: &str, user_id: &str) -> QueueResult<()> {
        let mut conn = self.manager.clone();
        let key = self.waiting_key(resource_id);
        conn.zrem::<_, _, ()>(&key, user_id).await?;
        conn.expire::<_, ()>(&key, self.config.waiting_timeout.as_secs() as i64)
            .await?;
        Ok(())
    }

    async fn rank(&self, resource_id: &str, user_id: &str) -> QueueResult<Option<u64>> {
        let mut conn = self.manager.clone();
        let key = self.waiting_key(resource_id);
        let rank: Option<i64> = conn.zrank(&key, user_id).await?;
        Ok(rank.map(|r| r as u64))
    }

    async fn all(&self, resource_id: &str) -> QueueResult<Vec<String>> {
        let mut conn = self.manager.clone();
        let key = self.waiting_key(resource_id);
        let users: Vec<String> = conn.zrange(&key, 0, -1).await?;
        Ok(users)
    }

    #[instrument(skip(self))]
    async fn poll_top(&self, resource_id: &str, count: u64) -> QueueResult<Vec<String>> {
        if count == 0 {
            return Ok(Vec::new());
        }
        let mut conn = self.manager.clone();
        let key = self.waiting_key(resource_id);

        let users: Vec<String> = conn.zrange(&key, 0, count as isize - 1).await?;
        for user_id in &users {
            conn.zrem::<_, _, ()>(&key, user_id).await?;
        }
        conn.expire::<_, ()>(&key, self.config.waiting_timeout.as_secs() as i64)
            .await?;
        Ok(users)
    }
}

#[async_trait]
impl ProcessingSet for RedisQueueStore {
    async fn contains(&self, resource_id: &str, user_id: &str) -> QueueResult<bool> {
        let mut conn = self.manager.clone();
        let key = self.processing_key(resource_id);
        let member: bool = conn.sismember(&key, user_id).await?;
        Ok(member)
    }

    #[instrument(skip(self))]
    async fn add(&self, resource_id: &str, user_id: &str) -> QueueResult<()> {
        let mut conn = self.manager.clone();
        let key = self.processing_key(resource_id);
        conn.sadd::<_, _, ()>(&key, user_id).await?;
        conn.expire::<_, ()>(&key, self.config.entry_timeout.as_secs() as i64)
            .await?;
        Ok(())
    }

    #[instrument(skip(self, user_ids), fields(batch = user_ids.len()))]
    async fn add_all(&self, resource_id: &str, user_ids: &[String]) -> QueueResult<()> {
        if user_ids.is_empty() {
            return Ok(());
        }
        let mut conn = self.manager.clone();
        let key = self.processing_key(resource_id);
        for user_id in user_ids {
            conn.sadd::<_, _, ()>(&key, user_id).await?;
        }
        conn.expire::<_, ()>(&key, self.config.entry_timeout.as_secs() as i64)
            .await?;
        Ok(())
    }

    async fn remove(&self, resource_id: &str, user_id: &str) -> QueueResult<()> {
        let mut conn = self.manager.clone();
        let key = self.processing_key(resource_id);
        conn.srem::<_, _, ()>(&key, user_id).await?;
        Ok(())
    }

    async fn size(&self, resource_id: &str) -> QueueResult<usize> {
        let mut conn = self.manager.clone();
        let key = self.processing_key(resource_id);
        let size: i64 = conn.scard(&key).await?;
        Ok(size.max(0) as usize)
    }

    async fn has_capacity(&self, resource_id: &str) -> QueueResult<bool> {
        Ok(ProcessingSet::size(self, resource_id).await? < self.config.max_processing_count)
    }

    async fn remaining_capacity(&self, resource_id: &str) -> QueueResult<usize> {
        let size = ProcessingSet::size(self, resource_id).await?;
        Ok(self.config.max_processing_count.saturating_sub(size))
    }
}
