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

//! The admission state machine.
//!
//! Per (resource, user) the lifecycle is
//! `NOT_IN_QUEUE → WAITING → {CAN_ENTER | PROCESSING} → NOT_IN_QUEUE`,
//! re-enterable after the terminal state. Registration closes its
//! check-then-act race under a per-(resource, user) lock; promotion is
//! serialized under a distinct per-resource lock, the single point that
//! enforces the processing capacity.

use crate::{AdmissionError, AdmissionResult, ChannelRegistry, EventSubscription, QueueEvent};
use plexgate_locks::LockTemplate;
use plexgate_queue::{ProcessingSet, QueueInfo, QueueStatus, WaitingQueue};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Prefix for the per-(resource, user) registration lock.
pub const USER_LOCK_PREFIX: &str = "LOCK:QUEUE:USER:";

/// Prefix for the per-resource promotion lock.
pub const RESOURCE_LOCK_PREFIX: &str = "LOCK:QUEUE:RESOURCE:";

fn user_lock_key(resource_id: &str, user_id: &str) -> String {
    format!("{USER_LOCK_PREFIX}{resource_id}:{user_id}")
}

fn resource_lock_key(resource_id: &str) -> String {
    format!("{RESOURCE_LOCK_PREFIX}{resource_id}")
}

/// Orchestrates registration, promotion, completion, and cancellation, and
/// drives the notification side effects of each transition.
pub struct AdmissionOrchestrator {
    waiting: Arc<dyn WaitingQueue>,
    processing: Arc<dyn ProcessingSet>,
    channels: Arc<dyn ChannelRegistry>,
    locks: LockTemplate,
}

impl AdmissionOrchestrator {
    /// Wire an orchestrator over its collaborators.
    pub fn new(
        waiting: Arc<dyn WaitingQueue>,
        processing: Arc<dyn ProcessingSet>,
        channels: Arc<dyn ChannelRegistry>,
        locks: LockTemplate,
    ) -> Self {
        Self {
            waiting,
            processing,
            channels,
            locks,
        }
    }

    /// Register a user and open their notification channel.
    ///
    /// Under the per-user lock: a user already waiting or processing fails
    /// with [`AdmissionError::AlreadyInQueue`]; otherwise the user joins the
    /// waiting line. Afterwards the channel is created (replacing any stale
    /// one), and either a promotion round runs immediately (capacity
    /// permitting) or the user receives their initial position event.
    ///
    /// The subscription is the caller's means of receiving further events.
    #[instrument(skip(self))]
    pub async fn register_and_subscribe(
        &self,
        resource_id: &str,
        user_id: &str,
    ) -> AdmissionResult<EventSubscription> {
        let position = self
            .locks
            .with_lock(&user_lock_key(resource_id, user_id), || async move {
                if self.processing.contains(resource_id, user_id).await?
                    || WaitingQueue::contains(&*self.waiting, resource_id, user_id).await?
                {
                    return Err(AdmissionError::AlreadyInQueue {
                        resource_id: resource_id.to_string(),
                        user_id: user_id.to_string(),
                    });
                }

                self.waiting.add(resource_id, user_id).await?;
                let rank = self.waiting.rank(resource_id, user_id).await?;
                Ok(rank.unwrap_or_default())
            })
            .await??;

        let subscription = self.channels.create(resource_id, user_id).await;

        if self.processing.has_capacity(resource_id).await? {
            self.promote_and_notify(resource_id).await?;
        } else {
            self.channels
                .send(resource_id, user_id, QueueEvent::position(position))
                .await;
        }

        Ok(subscription)
    }

    /// Promote as many waiting users as capacity allows, FIFO order.
    ///
    /// Runs under the per-resource lock, the single serialization point for
    /// admission, so concurrent calls can never over-admit. Returns the
    /// promoted user ids; empty when the set is full or nobody waits.
    #[instrument(skip(self))]
    pub async fn permit_processing(&self, resource_id: &str) -> AdmissionResult<Vec<String>> {
        self.locks
            .with_lock(&resource_lock_key(resource_id), || async move {
                let remaining = self.processing.remaining_capacity(resource_id).await?;
                if remaining == 0 {
                    return Ok(Vec::new());
                }

                let promoted = self.waiting.poll_top(resource_id, remaining as u64).await?;
                if !promoted.is_empty() {
                    self.processing.add_all(resource_id, &promoted).await?;
                    debug!(resource_id, count = promoted.len(), "promoted waiting users");
                }
                Ok(promoted)
            })
            .await?
    }

    /// Completion hook of a purchase attempt (success or failure alike).
    ///
    /// Removes the user from the processing set, completes their channel, and
    /// unconditionally runs a promotion round to backfill the freed capacity.
    #[instrument(skip(self))]
    pub async fn on_purchase_complete(
        &self,
        resource_id: &str,
        user_id: &str,
    ) -> AdmissionResult<()> {
        self.processing.remove(resource_id, user_id).await?;
        self.channels.complete(resource_id, user_id).await;
        self.promote_and_notify(resource_id).await?;
        Ok(())
    }

    /// Explicit cancellation.
    ///
    /// Fails with [`AdmissionError::NotInQueue`] when the user is in neither
    /// structure; otherwise removes them from both, completes their channel,
    /// and backfills.
    #[instrument(skip(self))]
    pub async fn on_cancel(&self, resource_id: &str, user_id: &str) -> AdmissionResult<()> {
        let waiting = WaitingQueue::contains(&*self.waiting, resource_id, user_id).await?;
        let processing = self.processing.contains(resource_id, user_id).await?;
        if !waiting && !processing {
            return Err(AdmissionError::NotInQueue {
                resource_id: resource_id.to_string(),
                user_id: user_id.to_string(),
            });
        }

        self.waiting.remove(resource_id, user_id).await?;
        self.processing.remove(resource_id, user_id).await?;
        self.channels.complete(resource_id, user_id).await;
        self.promote_and_notify(resource_id).await?;
        Ok(())
    }

    /// Live processing membership, the purchase authorization read.
    pub async fn is_in_processing(&self, resource_id: &str, user_id: &str) -> AdmissionResult<bool> {
        Ok(self.processing.contains(resource_id, user_id).await?)
    }

    /// Advisory entry check: already processing, or ranked within the
    /// currently free slots. Lock-free and possibly stale: a hint
    /// for polling clients, not an authorization.
    pub async fn can_enter(&self, resource_id: &str, user_id: &str) -> AdmissionResult<bool> {
        if self.processing.contains(resource_id, user_id).await? {
            return Ok(true);
        }
        let Some(rank) = self.waiting.rank(resource_id, user_id).await? else {
            return Ok(false);
        };
        let available = self.processing.remaining_capacity(resource_id).await?;
        Ok((rank as usize) < available)
    }

    /// Current standing for polling callers. Same consistency level as
    /// [`can_enter`](Self::can_enter).
    pub async fn queue_info(&self, resource_id: &str, user_id: &str) -> AdmissionResult<QueueInfo> {
        let position = self.waiting.rank(resource_id, user_id).await?;
        let can_enter = self.can_enter(resource_id, user_id).await?;
        Ok(QueueInfo {
            user_id: user_id.to_string(),
            resource_id: resource_id.to_string(),
            position,
            can_enter,
            status: QueueStatus::determine(position, can_enter),
        })
    }

    /// Run a promotion round, then notify: each promoted user receives the
    /// admission event and has their channel completed; every user still
    /// waiting receives their refreshed position.
    async fn promote_and_notify(&self, resource_id: &str) -> AdmissionResult<Vec<String>> {
        let promoted = self.permit_processing(resource_id).await?;

        for user_id in &promoted {
            self.channels
                .send(resource_id, user_id, QueueEvent::enter())
                .await;
            self.channels.complete(resource_id, user_id).await;
        }

        let still_waiting = self.waiting.all(resource_id).await?;
        for (position, user_id) in still_waiting.iter().enumerate() {
            self.channels
                .send(resource_id, user_id, QueueEvent::position(position as u64))
                .await;
        }

        Ok(promoted)
    }
}
