use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Per-endpoint watermark. One row per endpoint, created on the first
/// successful sync and overwritten after every later one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncCursor {
    pub endpoint: String,
    pub last_synced_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
