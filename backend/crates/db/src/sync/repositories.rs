use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::sync::models::SyncCursor;
use hubsync_common::error::HubsyncResult;

#[async_trait]
pub trait SyncCursorRepository: Send + Sync {
    /// Fetch the cursor for an endpoint, `None` if it was never synced.
    async fn get(&self, endpoint: &str) -> HubsyncResult<Option<SyncCursor>>;

    /// Record a completed sync. Creates the row on first use.
    /// The stored watermark never moves backwards; `last_error` is cleared.
    async fn set(&self, endpoint: &str, synced_at: DateTime<Utc>) -> HubsyncResult<SyncCursor>;

    /// Remember why the latest sync of an endpoint failed.
    /// Leaves `last_synced_at` untouched and does nothing for never-synced endpoints.
    async fn record_failure(&self, endpoint: &str, error_message: &str) -> HubsyncResult<()>;
}
