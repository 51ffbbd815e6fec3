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

//! Cross-component properties of the admission gate: registration
//! uniqueness, FIFO rank assignment, the capacity cap, backfill, stock
//! conservation under every guard strategy, cleanup-on-failure, and access
//! gating.

use plexgate_admission::{
    AdmissionError, AdmissionOrchestrator, InMemoryChannelRegistry, PurchaseService,
};
use plexgate_locks::{LockTemplate, MemoryLockManager};
use plexgate_queue::{InMemoryQueueStore, QueueConfig, WaitingQueue};
use plexgate_stock::{
    build_stock_guard, InMemoryStockRepository, StockError, StockGuard, StockRecord,
    StockRepository, StockStrategy, StockTuning,
};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

struct Gate {
    orchestrator: Arc<AdmissionOrchestrator>,
    purchases: PurchaseService,
    queue_store: Arc<InMemoryQueueStore>,
    stock_repo: Arc<InMemoryStockRepository>,
}

async fn gate(max_processing_count: usize, stock: u32, strategy: StockStrategy) -> Gate {
    init_tracing();
    let queue_store = Arc::new(InMemoryQueueStore::new(QueueConfig {
        max_processing_count,
        ..QueueConfig::default()
    }));
    let locks = LockTemplate::new(
        Arc::new(MemoryLockManager::new()),
        Duration::from_secs(10),
        Duration::from_secs(5),
    )
    .with_retry_interval(Duration::from_millis(2));

    let orchestrator = Arc::new(AdmissionOrchestrator::new(
        queue_store.clone(),
        queue_store.clone(),
        Arc::new(InMemoryChannelRegistry::new(Duration::from_secs(600))),
        locks.clone(),
    ));

    let stock_repo = Arc::new(InMemoryStockRepository::new());
    stock_repo.insert(StockRecord::new("c1", stock)).await.unwrap();
    let guard = build_stock_guard(
        strategy,
        stock_repo.clone(),
        locks,
        StockTuning {
            max_attempts: 200,
            retry_delay: Duration::from_millis(1),
        },
    );

    Gate {
        purchases: PurchaseService::new(orchestrator.clone(), guard),
        orchestrator,
        queue_store,
        stock_repo,
    }
}

#[tokio::test]
async fn test_concurrent_registration_is_unique() {
    let gate = gate(0, 10, StockStrategy::Distributed).await;

    let mut tasks = vec![];
    for _ in 0..20 {
        let orchestrator = gate.orchestrator.clone();
        tasks.push(tokio::spawn(async move {
            orchestrator.register_and_subscribe("c1", "alice").await
        }));
    }

    let mut successes = 0;
    let mut conflicts = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(_) => successes += 1,
            Err(AdmissionError::AlreadyInQueue { .. }) => conflicts += 1,
            Err(e) => panic!("unexpected error: {e}"),
        }
    }

    assert_eq!(successes, 1);
    assert_eq!(conflicts, 19);
    assert_eq!(gate.queue_store.all("c1").await.unwrap(), vec!["alice".to_string()]);
}

#[tokio::test]
async fn test_concurrent_registration_assigns_distinct_fifo_ranks() {
    let gate = gate(0, 10, StockStrategy::Distributed).await;

    let mut tasks = vec![];
    for i in 0..100 {
        let orchestrator = gate.orchestrator.clone();
        tasks.push(tokio::spawn(async move {
            orchestrator
                .register_and_subscribe("c1", &format!("user-{i:03}"))
                .await
        }));
    }
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    let mut ranks = HashSet::new();
    for i in 0..100 {
        let rank = gate
            .queue_store
            .rank("c1", &format!("user-{i:03}"))
            .await
            .unwrap()
            .expect("registered user must hold a rank");
        ranks.insert(rank);
    }

    // 100 distinct ranks spanning [0, 99], no gaps or duplicates
    assert_eq!(ranks.len(), 100);
    assert_eq!(ranks, (0..100).collect::<HashSet<u64>>());
}

#[tokio::test]
async fn test_single_promotion_round_respects_capacity() {
    let gate = gate(100, 10, StockStrategy::Distributed).await;

    // Seed 200 waiting users directly; promotion happens below, once.
    for i in 0..200 {
        gate.queue_store
            .add("c1", &format!("user-{i:03}"))
            .await
            .unwrap();
    }

    let promoted = gate.orchestrator.permit_processing("c1").await.unwrap();
    assert_eq!(promoted.len(), 100);

    // FIFO: the first 100 registrants got in
    for user_id in &promoted {
        assert!(gate.orchestrator.is_in_processing("c1", user_id).await.unwrap());
    }
    assert_eq!(gate.queue_store.all("c1").await.unwrap().len(), 100);

    // No completions in between: a second round admits nobody
    let second = gate.orchestrator.permit_processing("c1").await.unwrap();
    assert!(second.is_empty());
}

#[tokio::test]
async fn test_completions_backfill_to_full_capacity() {
    let max = 20;
    let gate = gate(max, 10, StockStrategy::Distributed).await;

    for i in 0..max {
        gate.orchestrator
            .register_and_subscribe("c1", &format!("in-{i:02}"))
            .await
            .unwrap();
    }
    for i in 0..10 {
        gate.orchestrator
            .register_and_subscribe("c1", &format!("wait-{i:02}"))
            .await
            .unwrap();
    }

    for i in 0..10 {
        gate.orchestrator
            .on_purchase_complete("c1", &format!("in-{i:02}"))
            .await
            .unwrap();
    }

    // Every previously-waiting user was admitted; the set is full again
    for i in 0..10 {
        assert!(gate
            .orchestrator
            .is_in_processing("c1", &format!("wait-{i:02}"))
            .await
            .unwrap());
    }
    assert!(gate.queue_store.all("c1").await.unwrap().is_empty());
    assert!(gate.orchestrator.permit_processing("c1").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_stock_conservation_under_every_strategy() {
    for strategy in [
        StockStrategy::Optimistic,
        StockStrategy::Pessimistic,
        StockStrategy::Distributed,
        StockStrategy::InProcess,
    ] {
        let gate = gate(64, 25, strategy).await;
        let guard = build_stock_guard(
            strategy,
            gate.stock_repo.clone(),
            LockTemplate::new(
                Arc::new(MemoryLockManager::new()),
                Duration::from_secs(10),
                Duration::from_secs(5),
            )
            .with_retry_interval(Duration::from_millis(2)),
            StockTuning {
                max_attempts: 200,
                retry_delay: Duration::from_millis(1),
            },
        );

        let mut tasks = vec![];
        for _ in 0..40 {
            let guard = guard.clone();
            tasks.push(tokio::spawn(async move { guard.decrease("c1", 1).await }));
        }

        let mut successes = 0;
        let mut insufficient = 0;
        for task in tasks {
            match task.await.unwrap() {
                Ok(()) => successes += 1,
                Err(StockError::InsufficientStock { .. }) => insufficient += 1,
                Err(e) => panic!("unexpected error under {strategy:?}: {e}"),
            }
        }

        assert_eq!(successes, 25, "strategy {strategy:?}");
        assert_eq!(insufficient, 15, "strategy {strategy:?}");
        let record = gate.stock_repo.find("c1").await.unwrap().unwrap();
        assert_eq!(record.remaining_quantity, 0, "strategy {strategy:?}");
    }
}

#[tokio::test]
async fn test_failed_purchasers_are_evicted_too() {
    // 1 unit of stock, 2 admitted purchasers: one wins, one conflicts, both
    // end up out of the processing set.
    let gate = Arc::new(gate(2, 1, StockStrategy::Distributed).await);
    gate.orchestrator
        .register_and_subscribe("c1", "alice")
        .await
        .unwrap();
    gate.orchestrator
        .register_and_subscribe("c1", "bob")
        .await
        .unwrap();

    let a = {
        let gate = gate.clone();
        tokio::spawn(async move { gate.purchases.purchase("c1", "alice", 1).await })
    };
    let b = {
        let gate = gate.clone();
        tokio::spawn(async move { gate.purchases.purchase("c1", "bob", 1).await })
    };

    let outcomes = [a.await.unwrap(), b.await.unwrap()];
    let successes = outcomes.iter().filter(|o| o.is_ok()).count();
    let conflicts = outcomes
        .iter()
        .filter(|o| {
            matches!(
                o,
                Err(AdmissionError::Stock(StockError::InsufficientStock { .. }))
            )
        })
        .count();

    assert_eq!(successes, 1);
    assert_eq!(conflicts, 1);
    assert!(!gate.orchestrator.is_in_processing("c1", "alice").await.unwrap());
    assert!(!gate.orchestrator.is_in_processing("c1", "bob").await.unwrap());

    let record = gate.stock_repo.find("c1").await.unwrap().unwrap();
    assert_eq!(record.remaining_quantity, 0);
}

#[tokio::test]
async fn test_unadmitted_purchase_is_gated_and_leaves_stock_unchanged() {
    let gate = gate(1, 5, StockStrategy::Distributed).await;
    gate.orchestrator
        .register_and_subscribe("c1", "admitted")
        .await
        .unwrap();
    gate.orchestrator
        .register_and_subscribe("c1", "waiting")
        .await
        .unwrap();

    for user_id in ["waiting", "never-registered"] {
        let err = gate.purchases.purchase("c1", user_id, 1).await.unwrap_err();
        assert!(matches!(err, AdmissionError::QueueAccessDenied { .. }));
    }

    let record = gate.stock_repo.find("c1").await.unwrap().unwrap();
    assert_eq!(record.remaining_quantity, 5);
}
