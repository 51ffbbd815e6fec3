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

//! Notification channel registry.
//!
//! ## Purpose
//! One live push channel per (resource, user), owned by the orchestrator:
//! created on registration, fed position/admission events, and completed when
//! the user leaves the gate (or after a lifetime timeout).
//!
//! ## Design Decisions
//! - **Injected registry, explicit lifecycle**: the registry is an
//!   abstraction with `create`/`send`/`complete`, not a process-global table,
//!   so the orchestrator never owns singleton state.
//! - **Best-effort sends**: a delivery failure tears the channel down with a
//!   warning and never aborts the state transition that triggered it.
//! - **Per-instance only**: channels live in this process. A user that
//!   reconnects to a different gate instance forfeits the old channel; the
//!   replacement `create` on the new instance is the fresh start.

use crate::QueueEvent;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, warn};
use ulid::Ulid;

const CHANNEL_BUFFER: usize = 32;

/// Receiving half of a user's notification channel.
///
/// The stream ends (`recv` returns `None`) when the channel is completed:
/// explicitly, by replacement, by a failed delivery, or by timeout.
#[derive(Debug)]
pub struct EventSubscription {
    receiver: mpsc::Receiver<QueueEvent>,
}

impl EventSubscription {
    /// Wait for the next event; `None` once the channel completes.
    pub async fn recv(&mut self) -> Option<QueueEvent> {
        self.receiver.recv().await
    }

    /// Non-blocking poll for an already-delivered event.
    pub fn try_recv(&mut self) -> Option<QueueEvent> {
        self.receiver.try_recv().ok()
    }
}

/// Registry of live notification channels with explicit lifecycle.
#[async_trait]
pub trait ChannelRegistry: Send + Sync {
    /// Open a channel for the key, replacing (and force-completing) any
    /// existing one. At most one live channel per (resource, user).
    async fn create(&self, resource_id: &str, user_id: &str) -> EventSubscription;

    /// Best-effort delivery. A failure removes the channel and is logged;
    /// it never propagates.
    async fn send(&self, resource_id: &str, user_id: &str, event: QueueEvent);

    /// Complete and remove the channel. Completing an absent channel is a
    /// no-op.
    async fn complete(&self, resource_id: &str, user_id: &str);
}

struct ChannelHandle {
    sender: mpsc::Sender<QueueEvent>,
    // Identifies this incarnation so a stale timeout task never removes a
    // replacement channel installed under the same key.
    epoch: Ulid,
}

/// In-memory channel registry backed by tokio mpsc channels.
pub struct InMemoryChannelRegistry {
    channels: Arc<RwLock<HashMap<String, ChannelHandle>>>,
    channel_timeout: Duration,
}

impl InMemoryChannelRegistry {
    /// Create a registry whose channels self-complete after
    /// `channel_timeout`.
    pub fn new(channel_timeout: Duration) -> Self {
        Self {
            channels: Arc::new(RwLock::new(HashMap::new())),
            channel_timeout,
        }
    }

    /// Number of live channels (subscribers may still hold drained receivers).
    pub async fn len(&self) -> usize {
        self.channels.read().await.len()
    }

    /// Whether no channels are live.
    pub async fn is_empty(&self) -> bool {
        self.channels.read().await.is_empty()
    }

    fn build_key(resource_id: &str, user_id: &str) -> String {
        format!("{}:{}", resource_id, user_id)
    }
}

#[async_trait]
impl ChannelRegistry for InMemoryChannelRegistry {
    async fn create(&self, resource_id: &str, user_id: &str) -> EventSubscription {
        let key = Self::build_key(resource_id, user_id);
        let (sender, receiver) = mpsc::channel(CHANNEL_BUFFER);
        let epoch = Ulid::new();

        {
            let mut channels = self.channels.write().await;
            // Dropping a previous handle's sender completes its stream
            if channels.insert(key.clone(), ChannelHandle { sender, epoch }).is_some() {
                debug!(key = %key, "replaced existing notification channel");
            }
        }

        let channels = self.channels.clone();
        let timeout = self.channel_timeout;
        let task_key = key.clone();
        tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            let mut channels = channels.write().await;
            if channels.get(&task_key).is_some_and(|h| h.epoch == epoch) {
                channels.remove(&task_key);
                debug!(key = %task_key, "notification channel timed out");
            }
        });

        EventSubscription { receiver }
    }

    async fn send(&self, resource_id: &str, user_id: &str, event: QueueEvent) {
        let key = Self::build_key(resource_id, user_id);

        let (sender, epoch) = {
            let channels = self.channels.read().await;
            match channels.get(&key) {
                Some(handle) => (handle.sender.clone(), handle.epoch),
                None => return,
            }
        };

        if let Err(e) = sender.try_send(event) {
            warn!(resource_id, user_id, error = %e, "failed to deliver queue event");
            let mut channels = self.channels.write().await;
            if channels.get(&key).is_some_and(|h| h.epoch == epoch) {
                channels.remove(&key);
            }
        }
    }

    async fn complete(&self, resource_id: &str, user_id: &str) {
        let key = Self::build_key(resource_id, user_id);
        self.channels.write().await.remove(&key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> InMemoryChannelRegistry {
        InMemoryChannelRegistry::new(Duration::from_secs(600))
    }

    #[tokio::test]
    async fn test_create_send_receive() {
        let registry = registry();
        let mut subscription = registry.create("c1", "alice").await;

        registry.send("c1", "alice", QueueEvent::position(4)).await;

        assert_eq!(subscription.recv().await, Some(QueueEvent::position(4)));
    }

    #[tokio::test]
    async fn test_create_replaces_and_completes_previous_channel() {
        let registry = registry();
        let mut first = registry.create("c1", "alice").await;
        let mut second = registry.create("c1", "alice").await;

        // Old stream ends; new one receives
        assert_eq!(first.recv().await, None);
        registry.send("c1", "alice", QueueEvent::enter()).await;
        assert_eq!(second.recv().await, Some(QueueEvent::enter()));
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn test_complete_is_idempotent() {
        let registry = registry();
        let mut subscription = registry.create("c1", "alice").await;

        registry.complete("c1", "alice").await;
        registry.complete("c1", "alice").await;
        registry.complete("c1", "nobody").await;

        assert_eq!(subscription.recv().await, None);
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn test_send_to_absent_channel_is_silent() {
        let registry = registry();
        registry.send("c1", "ghost", QueueEvent::position(0)).await;
    }

    #[tokio::test]
    async fn test_failed_delivery_discards_channel() {
        let registry = registry();
        let subscription = registry.create("c1", "alice").await;
        // Receiver gone: the next send fails and removes the channel
        drop(subscription);

        for i in 0..(CHANNEL_BUFFER as u64 + 1) {
            registry.send("c1", "alice", QueueEvent::position(i)).await;
        }
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn test_channel_times_out() {
        let registry = InMemoryChannelRegistry::new(Duration::from_millis(30));
        let mut subscription = registry.create("c1", "alice").await;

        tokio::time::sleep(Duration::from_millis(80)).await;

        assert!(registry.is_empty().await);
        assert_eq!(subscription.recv().await, None);
    }

    #[tokio::test]
    async fn test_stale_timeout_does_not_remove_replacement() {
        let registry = InMemoryChannelRegistry::new(Duration::from_millis(100));
        let _first = registry.create("c1", "alice").await;
        tokio::time::sleep(Duration::from_millis(50)).await;

        // Replacement resets the lifetime under the same key
        let mut second = registry.create("c1", "alice").await;
        tokio::time::sleep(Duration::from_millis(60)).await;

        registry.send("c1", "alice", QueueEvent::position(1)).await;
        assert_eq!(second.recv().await, Some(QueueEvent::position(1)));
    }
}
