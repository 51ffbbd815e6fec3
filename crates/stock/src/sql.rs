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

//! SQL-based stock repository (SQLite).
//!
//! This module provides the relational backend for [`StockRepository`]:
//!
//! - Row-per-resource records with an explicit version column
//! - Optimistic commits as version-conditioned UPDATEs
//! - Exclusive decrements inside an IMMEDIATE transaction (SQLite's write
//!   lock; the record-lock granularity this engine offers)
//!
//! PostgreSQL can be added by following the same pattern with a `PgPool` and
//! `SELECT ... FOR UPDATE` in place of the IMMEDIATE transaction.

use crate::{StockError, StockRecord, StockRepository, StockResult};
use async_trait::async_trait;
use sqlx::{Row, SqliteConnection, SqlitePool};
use tracing::instrument;

const SELECT_SQL: &str = r#"SELECT id, resource_id, total_quantity, remaining_quantity, version
   FROM stock_records WHERE resource_id = ?1"#;

/// SQLite-based stock repository.
///
/// Uses a single `stock_records` table:
///
/// ```sql
/// CREATE TABLE IF NOT EXISTS stock_records (
///   resource_id TEXT PRIMARY KEY,
///   id TEXT NOT NULL,
///   total_quantity INTEGER NOT NULL,
///   remaining_quantity INTEGER NOT NULL,
///   version INTEGER NOT NULL
/// );
/// ```
#[derive(Clone)]
pub struct SqliteStockRepository {
    pool: SqlitePool,
}

impl SqliteStockRepository {
    /// Create a new SQLite stock repository.
    ///
    /// `database_url` is any valid `sqlx` SQLite URL, e.g.:
    /// - `sqlite::memory:` (in-memory)
    /// - `sqlite://stock.db`
    #[instrument(skip(database_url))]
    pub async fn new(database_url: &str) -> StockResult<Self> {
        let pool = SqlitePool::connect(database_url)
            .await
            .map_err(|e| StockError::BackendError(format!("failed to connect SQLite: {e}")))?;
        Self::with_pool(pool).await
    }

    /// Create a repository over an existing pool.
    ///
    /// A pooled `sqlite::memory:` URL gives every connection its own private
    /// database; callers wanting an in-memory repository should hand in a
    /// single-connection pool instead.
    pub async fn with_pool(pool: SqlitePool) -> StockResult<Self> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS stock_records (
              resource_id TEXT PRIMARY KEY,
              id TEXT NOT NULL,
              total_quantity INTEGER NOT NULL,
              remaining_quantity INTEGER NOT NULL,
              version INTEGER NOT NULL
            );
        "#,
        )
        .execute(&pool)
        .await
        .map_err(|e| StockError::BackendError(format!("failed to create stock table: {e}")))?;

        Ok(Self { pool })
    }

    fn record_from_row(row: &sqlx::sqlite::SqliteRow) -> StockRecord {
        StockRecord {
            id: row.get("id"),
            resource_id: row.get("resource_id"),
            total_quantity: row.get::<i64, _>("total_quantity") as u32,
            remaining_quantity: row.get::<i64, _>("remaining_quantity") as u32,
            version: row.get::<i64, _>("version") as u64,
        }
    }

    async fn write_record(conn: &mut SqliteConnection, record: &StockRecord) -> StockResult<()> {
        sqlx::query(
            r#"UPDATE stock_records SET remaining_quantity = ?1, version = ?2
               WHERE resource_id = ?3"#,
        )
        .bind(record.remaining_quantity as i64)
        .bind(record.version as i64)
        .bind(&record.resource_id)
        .execute(&mut *conn)
        .await?;
        Ok(())
    }

    async fn decrease_in_tx(
        conn: &mut SqliteConnection,
        resource_id: &str,
        quantity: u32,
    ) -> StockResult<()> {
        let row = sqlx::query(SELECT_SQL)
            .bind(resource_id)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or_else(|| StockError::NotFound(resource_id.to_string()))?;

        let mut record = Self::record_from_row(&row);
        record.decrease(quantity)?;
        Self::write_record(conn, &record).await
    }
}

#[async_trait]
impl StockRepository for SqliteStockRepository {
    async fn insert(&self, record: StockRecord) -> StockResult<()> {
        sqlx::query(
            r#"INSERT OR REPLACE INTO stock_records
               (resource_id, id, total_quantity, remaining_quantity, version)
               VALUES (?1, ?2, ?3, ?4, ?5)"#,
        )
        .bind(&record.resource_id)
        .bind(&record.id)
        .bind(record.total_quantity as i64)
        .bind(record.remaining_quantity as i64)
        .bind(record.version as i64)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find(&self, resource_id: &str) -> StockResult<Option<StockRecord>> {
        let row = sqlx::query(SELECT_SQL)
            .bind(resource_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(Self::record_from_row))
    }

    async fn update_if_version(
        &self,
        resource_id: &str,
        expected_version: u64,
        remaining: u32,
    ) -> StockResult<bool> {
        let result = sqlx::query(
            r#"UPDATE stock_records SET remaining_quantity = ?1, version = version + 1
               WHERE resource_id = ?2 AND version = ?3"#,
        )
        .bind(remaining as i64)
        .bind(resource_id)
        .bind(expected_version as i64)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 1 {
            return Ok(true);
        }

        // Distinguish a version conflict from a missing record
        if self.find(resource_id).await?.is_none() {
            return Err(StockError::NotFound(resource_id.to_string()));
        }
        Ok(false)
    }

    #[instrument(skip(self))]
    async fn decrease_exclusive(&self, resource_id: &str, quantity: u32) -> StockResult<()> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| StockError::BackendError(format!("acquire conn: {e}")))?;

        // IMMEDIATE takes the write lock up front, so the read below is
        // already exclusive against other writers.
        sqlx::query("BEGIN IMMEDIATE").execute(&mut *conn).await?;

        match Self::decrease_in_tx(&mut conn, resource_id, quantity).await {
            Ok(()) => {
                sqlx::query("COMMIT").execute(&mut *conn).await?;
                Ok(())
            }
            Err(e) => {
                let _ = sqlx::query("ROLLBACK").execute(&mut *conn).await;
                Err(e)
            }
        }
    }

    async fn decrease_unguarded(&self, resource_id: &str, quantity: u32) -> StockResult<()> {
        let mut record = self
            .find(resource_id)
            .await?
            .ok_or_else(|| StockError::NotFound(resource_id.to_string()))?;

        record.decrease(quantity)?;

        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| StockError::BackendError(format!("acquire conn: {e}")))?;
        Self::write_record(&mut conn, &record).await
    }
}
