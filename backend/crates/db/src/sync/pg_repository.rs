use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};

use crate::sync::models::SyncCursor;
use crate::sync::repositories::SyncCursorRepository;
use hubsync_common::error::{HubsyncError, HubsyncResult};

#[derive(Clone)]
pub struct PgSyncCursorRepository {
    pool: PgPool,
}

impl PgSyncCursorRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn map_row(row: sqlx::postgres::PgRow) -> SyncCursor {
        SyncCursor {
            endpoint: row.get("endpoint"),
            last_synced_at: row.get("last_synced_at"),
            last_error: row.get("last_error"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        }
    }
}

#[async_trait]
impl SyncCursorRepository for PgSyncCursorRepository {
    async fn get(&self, endpoint: &str) -> HubsyncResult<Option<SyncCursor>> {
        let row = sqlx::query(
            "select endpoint, last_synced_at, last_error, created_at, updated_at
             from sync_cursors
             where endpoint = $1",
        )
        .bind(endpoint)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| HubsyncError::Database(e.to_string()))?;

        Ok(row.map(Self::map_row))
    }

    async fn set(&self, endpoint: &str, synced_at: DateTime<Utc>) -> HubsyncResult<SyncCursor> {
        let row = sqlx::query(
            "insert into sync_cursors (endpoint, last_synced_at)
             values ($1, $2)
             on conflict (endpoint) do update set
               last_synced_at = greatest(sync_cursors.last_synced_at, excluded.last_synced_at),
               last_error = null,
               updated_at = now()
             returning endpoint, last_synced_at, last_error, created_at, updated_at",
        )
        .bind(endpoint)
        .bind(synced_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| HubsyncError::Database(e.to_string()))?;

        Ok(Self::map_row(row))
    }

    async fn record_failure(&self, endpoint: &str, error_message: &str) -> HubsyncResult<()> {
        sqlx::query(
            "update sync_cursors
             set last_error = $1, updated_at = now()
             where endpoint = $2",
        )
        .bind(error_message)
        .bind(endpoint)
        .execute(&self.pool)
        .await
        .map_err(|e| HubsyncError::Database(e.to_string()))?;

        Ok(())
    }
}
