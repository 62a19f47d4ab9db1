pub mod entities;
pub mod sync;

use hubsync_common::error::{HubsyncError, HubsyncResult};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

/// Create a Postgres connection pool from a database URL.
pub async fn create_pool(database_url: &str, max_connections: u32) -> HubsyncResult<PgPool> {
    tracing::info!(max_connections, "connecting to database");
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
        .map_err(|e| HubsyncError::Database(e.to_string()))
}

const SCHEMA: &[&str] = &[
    "create table if not exists sync_cursors (
       endpoint text primary key,
       last_synced_at timestamptz,
       last_error text,
       created_at timestamptz not null default now(),
       updated_at timestamptz not null default now()
     )",
    "create table if not exists jobs (
       id bigserial primary key,
       job_id bigint not null unique,
       add_date timestamptz,
       add_user_id bigint,
       cancel_date date,
       contract_amount double precision,
       job_value double precision,
       hs_object_id bigint,
       hubspot_createdate timestamptz,
       hubspot_lastmodifieddate timestamptz,
       synced_at timestamptz not null default now()
     )",
    "create table if not exists divisions (
       id bigint primary key,
       abbreviation text,
       group_id bigint,
       is_corp bigint,
       is_inactive bigint,
       hs_object_id bigint,
       hubspot_createdate timestamptz,
       hubspot_lastmodifieddate timestamptz,
       synced_at timestamptz not null default now()
     )",
    "create table if not exists employees (
       id bigserial primary key,
       firstname text,
       lastname text,
       email text,
       employee_division_id bigint,
       employee_title_id bigint,
       hs_object_id bigint not null unique,
       hubspot_createdate timestamptz,
       hubspot_lastmodifieddate timestamptz,
       synced_at timestamptz not null default now()
     )",
    "create table if not exists hubspot_records (
       endpoint text not null,
       record_id text not null,
       data jsonb not null,
       synced_at timestamptz not null default now(),
       primary key (endpoint, record_id)
     )",
];

/// Create the sync tables if they do not exist yet.
pub async fn ensure_schema(pool: &PgPool) -> HubsyncResult<()> {
    for statement in SCHEMA {
        sqlx::query(statement)
            .execute(pool)
            .await
            .map_err(|e| HubsyncError::Database(e.to_string()))?;
    }
    tracing::debug!(tables = SCHEMA.len(), "schema ensured");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn create_pool_fails_with_invalid_url() {
        let result = create_pool("postgres://invalid:5432/nonexistent", 1).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn ensure_schema_is_repeatable() {
        let url = match std::env::var("TEST_DATABASE_URL") {
            Ok(url) => url,
            Err(_) => return,
        };
        let pool = create_pool(&url, 2).await.expect("db should connect");
        ensure_schema(&pool).await.expect("first run");
        ensure_schema(&pool).await.expect("second run");
    }
}
