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

//! In-memory queue store implementation.
//!
//! ## Purpose
//! Provides an ordered-set emulation of the waiting/processing structures for
//! testing and single-process deployments.
//!
//! ## Features
//! - Arrival order by `(score, member)`: equal millisecond scores tie-break
//!   lexicographically by user id, matching sorted-set semantics
//! - Whole-structure TTLs with lazy expiry (expired structures are treated as
//!   absent on access)
//!
//! ## Limitations
//! - Not persistent, not distributed (single process only)

use crate::{keys, ProcessingSet, QueueConfig, QueueResult, WaitingQueue};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct WaitingState {
    scores: HashMap<String, i64>,
    ordered: BTreeSet<(i64, String)>,
    expires_at: Option<Instant>,
}

impl WaitingState {
    fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|exp| Instant::now() >= exp)
    }

    fn insert(&mut self, user_id: &str, score: i64) {
        if let Some(old) = self.scores.insert(user_id.to_string(), score) {
            self.ordered.remove(&(old, user_id.to_string()));
        }
        self.ordered.insert((score, user_id.to_string()));
    }

    fn remove(&mut self, user_id: &str) {
        if let Some(score) = self.scores.remove(user_id) {
            self.ordered.remove(&(score, user_id.to_string()));
        }
    }
}

#[derive(Debug, Default)]
struct ProcessingState {
    members: HashSet<String>,
    expires_at: Option<Instant>,
}

impl ProcessingState {
    fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|exp| Instant::now() >= exp)
    }
}

/// In-memory implementation of [`WaitingQueue`] and [`ProcessingSet`].
///
/// ## Example
/// ```rust
/// use plexgate_queue::{InMemoryQueueStore, QueueConfig, WaitingQueue};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = InMemoryQueueStore::new(QueueConfig::default());
/// store.add("concert-1", "user-a").await?;
/// assert!(store.contains("concert-1", "user-a").await?);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct InMemoryQueueStore {
    config: QueueConfig,
    waiting: Arc<RwLock<HashMap<String, WaitingState>>>,
    processing: Arc<RwLock<HashMap<String, ProcessingState>>>,
}

impl InMemoryQueueStore {
    /// Create a new in-memory queue store.
    pub fn new(config: QueueConfig) -> Self {
        Self {
            config,
            waiting: Arc::new(RwLock::new(HashMap::new())),
            processing: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// The configured tunables.
    pub fn config(&self) -> &QueueConfig {
        &self.config
    }

    fn arrival_score() -> i64 {
        Utc::now().timestamp_millis()
    }

    /// Fetch the waiting structure for mutation, resetting it when the idle
    /// clock lapsed.
    fn waiting_entry<'a>(
        map: &'a mut HashMap<String, WaitingState>,
        key: &str,
    ) -> &'a mut WaitingState {
        let state = map.entry(key.to_string()).or_default();
        if state.is_expired() {
            *state = WaitingState::default();
        }
        state
    }

    fn processing_entry<'a>(
        map: &'a mut HashMap<String, ProcessingState>,
        key: &str,
    ) -> &'a mut ProcessingState {
        let state = map.entry(key.to_string()).or_default();
        if state.is_expired() {
            *state = ProcessingState::default();
        }
        state
    }

    #[cfg(test)]
    async fn add_with_score(&self, resource_id: &str, user_id: &str, score: i64) {
        let key = keys::waiting_queue(resource_id);
        let mut map = self.waiting.write().await;
        let state = Self::waiting_entry(&mut map, &key);
        state.insert(user_id, score);
        state.expires_at = Some(Instant::now() + self.config.waiting_timeout);
    }
}

#[async_trait]
impl WaitingQueue for InMemoryQueueStore {
    async fn contains(&self, resource_id: &str, user_id: &str) -> QueueResult<bool> {
        let key = keys::waiting_queue(resource_id);
        let map = self.waiting.read().await;
        Ok(map
            .get(&key)
            .filter(|s| !s.is_expired())
            .is_some_and(|s| s.scores.contains_key(user_id)))
    }

    async fn add(&self, resource_id: &str, user_id: &str) -> QueueResult<()> {
        let key = keys::waiting_queue(resource_id);
        let score = Self::arrival_score();
        let mut map = self.waiting.write().await;
        let state = Self::waiting_entry(&mut map, &key);
        state.insert(user_id, score);
        state.expires_at = Some(Instant::now() + self.config.waiting_timeout);
        Ok(())
    }

    async fn remove(&self, resource_id: &str, user_id: &str) -> QueueResult<()> {
        let key = keys::waiting_queue(resource_id);
        let mut map = self.waiting.write().await;
        let state = Self::waiting_entry(&mut map, &key);
        state.remove(user_id);
        state.expires_at = Some(Instant::now() + self.config.waiting_timeout);
        Ok(())
    }

    async fn rank(&self, resource_id: &str, user_id: &str) -> QueueResult<Option<u64>> {
        let key = keys::waiting_queue(resource_id);
        let map = self.waiting.read().await;
        let Some(state) = map.get(&key).filter(|s| !s.is_expired()) else {
            return Ok(None);
        };
        let Some(score) = state.scores.get(user_id) else {
            return Ok(None);
        };
        let position = state
            .ordered
            .range(..&(*score, user_id.to_string()))
            .count() as u64;
        Ok(Some(position))
    }

    async fn all(&self, resource_id: &str) -> QueueResult<Vec<String>> {
        let key = keys::waiting_queue(resource_id);
        let map = self.waiting.read().await;
        Ok(map
            .get(&key)
            .filter(|s| !s.is_expired())
            .map(|s| s.ordered.iter().map(|(_, user)| user.clone()).collect())
            .unwrap_or_default())
    }

    async fn poll_top(&self, resource_id: &str, count: u64) -> QueueResult<Vec<String>> {
        let key = keys::waiting_queue(resource_id);
        let mut map = self.waiting.write().await;
        let state = Self::waiting_entry(&mut map, &key);

        let top: Vec<String> = state
            .ordered
            .iter()
            .take(count as usize)
            .map(|(_, user)| user.clone())
            .collect();
        for user in &top {
            state.remove(user);
        }
        state.expires_at = Some(Instant::now() + self.config.waiting_timeout);
        Ok(top)
    }
}

#[async_trait]
impl ProcessingSet for InMemoryQueueStore {
    async fn contains(&self, resource_id: &str, user_id: &str) -> QueueResult<bool> {
        let key = keys::processing_set(resource_id);
        let map = self.processing.read().await;
        Ok(map
            .get(&key)
            .filter(|s| !s.is_expired())
            .is_some_and(|s| s.members.contains(user_id)))
    }

    async fn add(&self, resource_id: &str, user_id: &str) -> QueueResult<()> {
        let key = keys::processing_set(resource_id);
        let mut map = self.processing.write().await;
        let state = Self::processing_entry(&mut map, &key);
        state.members.insert(user_id.to_string());
        state.expires_at = Some(Instant::now() + self.config.entry_timeout);
        Ok(())
    }

    async fn add_all(&self, resource_id: &str, user_ids: &[String]) -> QueueResult<()> {
        let key = keys::processing_set(resource_id);
        let mut map = self.processing.write().await;
        let state = Self::processing_entry(&mut map, &key);
        for user_id in user_ids {
            state.members.insert(user_id.clone());
        }
        state.expires_at = Some(Instant::now() + self.config.entry_timeout);
        Ok(())
    }

    async fn remove(&self, resource_id: &str, user_id: &str) -> QueueResult<()> {
        let key = keys::processing_set(resource_id);
        let mut map = self.processing.write().await;
        if let Some(state) = map.get_mut(&key) {
            if state.is_expired() {
                *state = ProcessingState::default();
            } else {
                state.members.remove(user_id);
            }
        }
        Ok(())
    }

    async fn size(&self, resource_id: &str) -> QueueResult<usize> {
        let key = keys::processing_set(resource_id);
        let map = self.processing.read().await;
        Ok(map
            .get(&key)
            .filter(|s| !s.is_expired())
            .map(|s| s.members.len())
            .unwrap_or(0))
    }

    async fn has_capacity(&self, resource_id: &str) -> QueueResult<bool> {
        Ok(ProcessingSet::size(self, resource_id).await? < self.config.max_processing_count)
    }

    async fn remaining_capacity(&self, resource_id: &str) -> QueueResult<usize> {
        let size = ProcessingSet::size(self, resource_id).await?;
        Ok(self.config.max_processing_count.saturating_sub(size))
    }
}
