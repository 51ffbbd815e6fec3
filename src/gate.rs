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

//! The assembled gate: configuration in, external interface out.

use crate::GateConfig;
use plexgate_admission::{
    AdmissionOrchestrator, AdmissionResult, EventSubscription, InMemoryChannelRegistry,
    PurchaseService,
};
use plexgate_locks::{LockTemplate, MemoryLockManager};
use plexgate_queue::{InMemoryQueueStore, QueueInfo};
use plexgate_stock::{build_stock_guard, InMemoryStockRepository, StockRepository};
use std::sync::Arc;

/// A fully wired admission gate.
///
/// The strategy and every timeout come from [`GateConfig`], resolved once at
/// construction. The external interface is a 1:1 translation target for an
/// HTTP or CLI layer: [`register_and_subscribe`](Self::register_and_subscribe),
/// [`cancel`](Self::cancel), [`purchase`](Self::purchase),
/// [`is_in_processing`](Self::is_in_processing), and the polling read
/// [`queue_info`](Self::queue_info).
pub struct PlexGate {
    orchestrator: Arc<AdmissionOrchestrator>,
    purchases: PurchaseService,
    stock: Arc<dyn StockRepository>,
}

impl PlexGate {
    /// Assemble a gate over in-memory backends.
    ///
    /// Suitable for a single-process deployment and for tests; distributed
    /// deployments wire the Redis/SQL backends through the member crates
    /// instead.
    pub fn in_memory(config: GateConfig) -> Self {
        let queue_store = Arc::new(InMemoryQueueStore::new(config.queue_config()));
        let locks = LockTemplate::new(
            Arc::new(MemoryLockManager::new()),
            config.lock_wait_time(),
            config.lock_lease_time(),
        )
        .with_retry_interval(config.lock_retry_interval());

        let orchestrator = Arc::new(AdmissionOrchestrator::new(
            queue_store.clone(),
            queue_store,
            Arc::new(InMemoryChannelRegistry::new(config.channel_timeout())),
            locks.clone(),
        ));

        let stock: Arc<InMemoryStockRepository> = Arc::new(InMemoryStockRepository::new());
        let guard = build_stock_guard(
            config.stock_strategy,
            stock.clone(),
            locks,
            config.stock_tuning(),
        );

        Self {
            purchases: PurchaseService::new(orchestrator.clone(), guard),
            orchestrator,
            stock,
        }
    }

    /// Join the waiting line and receive the event channel.
    pub async fn register_and_subscribe(
        &self,
        resource_id: &str,
        user_id: &str,
    ) -> AdmissionResult<EventSubscription> {
        self.orchestrator
            .register_and_subscribe(resource_id, user_id)
            .await
    }

    /// Leave the gate entirely.
    pub async fn cancel(&self, resource_id: &str, user_id: &str) -> AdmissionResult<()> {
        self.orchestrator.on_cancel(resource_id, user_id).await
    }

    /// Purchase units of the resource; requires processing membership.
    pub async fn purchase(
        &self,
        resource_id: &str,
        user_id: &str,
        quantity: u32,
    ) -> AdmissionResult<()> {
        self.purchases.purchase(resource_id, user_id, quantity).await
    }

    /// Whether the user currently holds processing membership.
    pub async fn is_in_processing(
        &self,
        resource_id: &str,
        user_id: &str,
    ) -> AdmissionResult<bool> {
        self.orchestrator.is_in_processing(resource_id, user_id).await
    }

    /// Advisory standing snapshot for polling clients.
    pub async fn queue_info(&self, resource_id: &str, user_id: &str) -> AdmissionResult<QueueInfo> {
        self.orchestrator.queue_info(resource_id, user_id).await
    }

    /// The orchestrator, for callers needing the full operation set.
    pub fn orchestrator(&self) -> &Arc<AdmissionOrchestrator> {
        &self.orchestrator
    }

    /// The stock repository, for seeding and inspecting records.
    pub fn stock(&self) -> &Arc<dyn StockRepository> {
        &self.stock
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plexgate_admission::QueueEvent;
    use plexgate_queue::QueueStatus;
    use plexgate_stock::{StockRecord, StockRepository};

    #[tokio::test]
    async fn test_end_to_end_flow() {
        let gate = PlexGate::in_memory(GateConfig {
            max_processing_count: 1,
            ..GateConfig::default()
        });
        gate.stock().insert(StockRecord::new("c1", 2)).await.unwrap();

        let mut alice = gate.register_and_subscribe("c1", "alice").await.unwrap();
        assert_eq!(alice.recv().await, Some(QueueEvent::enter()));

        let mut bob = gate.register_and_subscribe("c1", "bob").await.unwrap();
        assert_eq!(bob.recv().await, Some(QueueEvent::position(0)));
        assert_eq!(
            gate.queue_info("c1", "bob").await.unwrap().status,
            QueueStatus::Waiting
        );

        gate.purchase("c1", "alice", 1).await.unwrap();

        // Alice's completion admitted bob
        assert_eq!(bob.recv().await, Some(QueueEvent::enter()));
        assert!(gate.is_in_processing("c1", "bob").await.unwrap());

        gate.purchase("c1", "bob", 1).await.unwrap();
        let record = gate.stock().find("c1").await.unwrap().unwrap();
        assert_eq!(record.remaining_quantity, 0);

        assert_eq!(
            gate.queue_info("c1", "bob").await.unwrap().status,
            QueueStatus::NotInQueue
        );
    }

    #[tokio::test]
    async fn test_cancel_flow() {
        let gate = PlexGate::in_memory(GateConfig::default());
        gate.register_and_subscribe("c1", "alice").await.unwrap();

        gate.cancel("c1", "alice").await.unwrap();
        assert!(!gate.is_in_processing("c1", "alice").await.unwrap());
        assert!(gate.cancel("c1", "alice").await.is_err());
    }
}
