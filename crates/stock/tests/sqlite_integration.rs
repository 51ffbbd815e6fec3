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

//! Integration tests for the SQLite stock backend.

#![cfg(feature = "sqlite-backend")]

use plexgate_stock::{
    OptimisticStockGuard, PessimisticStockGuard, SqliteStockRepository, StockError, StockGuard,
    StockRecord, StockRepository,
};
use sqlx::sqlite::SqlitePoolOptions;
use std::sync::Arc;
use std::time::Duration;

async fn create_repo() -> SqliteStockRepository {
    // One connection: a pooled `sqlite::memory:` would give each connection
    // its own private database.
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    SqliteStockRepository::with_pool(pool).await.unwrap()
}

#[tokio::test]
async fn test_insert_and_find_roundtrip() {
    let repo = create_repo().await;
    let seeded = StockRecord::new("c1", 40);
    repo.insert(seeded.clone()).await.unwrap();

    let loaded = repo.find("c1").await.unwrap().unwrap();
    assert_eq!(loaded, seeded);
    assert!(repo.find("missing").await.unwrap().is_none());
}

#[tokio::test]
async fn test_update_if_version_semantics() {
    let repo = create_repo().await;
    repo.insert(StockRecord::new("c1", 40)).await.unwrap();

    assert!(repo.update_if_version("c1", 0, 39).await.unwrap());
    assert!(!repo.update_if_version("c1", 0, 38).await.unwrap());

    let loaded = repo.find("c1").await.unwrap().unwrap();
    assert_eq!(loaded.remaining_quantity, 39);
    assert_eq!(loaded.version, 1);

    let result = repo.update_if_version("missing", 0, 1).await;
    assert!(matches!(result, Err(StockError::NotFound(_))));
}

#[tokio::test]
async fn test_decrease_exclusive_rolls_back_on_overdraw() {
    let repo = create_repo().await;
    repo.insert(StockRecord::new("c1", 2)).await.unwrap();

    repo.decrease_exclusive("c1", 2).await.unwrap();
    let err = repo.decrease_exclusive("c1", 1).await.unwrap_err();
    assert!(matches!(err, StockError::InsufficientStock { .. }));

    let loaded = repo.find("c1").await.unwrap().unwrap();
    assert_eq!(loaded.remaining_quantity, 0);
}

#[tokio::test]
async fn test_pessimistic_guard_conserves_stock() {
    let repo = Arc::new(create_repo().await);
    repo.insert(StockRecord::new("c1", 15)).await.unwrap();
    let guard = Arc::new(PessimisticStockGuard::new(repo.clone()));

    let mut tasks = vec![];
    for _ in 0..25 {
        let guard = guard.clone();
        tasks.push(tokio::spawn(async move { guard.decrease("c1", 1).await }));
    }

    let mut successes = 0;
    for task in tasks {
        if task.await.unwrap().is_ok() {
            successes += 1;
        }
    }

    assert_eq!(successes, 15);
    let loaded = repo.find("c1").await.unwrap().unwrap();
    assert_eq!(loaded.remaining_quantity, 0);
}

#[tokio::test]
async fn test_optimistic_guard_conserves_stock() {
    let repo = Arc::new(create_repo().await);
    repo.insert(StockRecord::new("c1", 10)).await.unwrap();
    let guard = Arc::new(OptimisticStockGuard::new(
        repo.clone(),
        50,
        Duration::from_millis(2),
    ));

    let mut tasks = vec![];
    for _ in 0..20 {
        let guard = guard.clone();
        tasks.push(tokio::spawn(async move { guard.decrease("c1", 1).await }));
    }

    let mut successes = 0;
    for task in tasks {
        if task.await.unwrap().is_ok() {
            successes += 1;
        }
    }

    assert_eq!(successes, 10);
    let loaded = repo.find("c1").await.unwrap().unwrap();
    assert_eq!(loaded.remaining_quantity, 0);
}
