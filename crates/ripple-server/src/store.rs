//! Postgres-backed message persistence.
//!
//! Wired in only when a database URL is configured; otherwise the relay
//! runs with [`ripple_core::NullMessageStore`] and messages are
//! delivery-only.

use async_trait::async_trait;
use ripple_core::{ChatRecord, MessageStore, StoreError};
use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::info;

use crate::metrics;

/// Message store writing to a Postgres `messages` table.
#[derive(Debug, Clone)]
pub struct PgMessageStore {
    pool: PgPool,
}

impl PgMessageStore {
    /// Connect to Postgres and run pending migrations.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection or a migration fails.
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(url)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        info!("Message store connected");
        Ok(Self { pool })
    }
}

#[async_trait]
impl MessageStore for PgMessageStore {
    async fn persist(&self, record: &ChatRecord) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO messages (sender, receiver, group_id, message, kind, is_group, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(&record.sender)
        .bind(&record.receiver)
        .bind(&record.group)
        .bind(&record.message)
        .bind(&record.kind)
        .bind(record.is_group)
        .bind(record.created_at as i64)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            metrics::record_persistence_failure();
            StoreError::Write(e.to_string())
        })?;

        Ok(())
    }
}
