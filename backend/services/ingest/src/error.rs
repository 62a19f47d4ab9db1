use hubsync_common::error::HubsyncError;

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("endpoint discovery failed: {0}")]
    DiscoveryFailed(String),

    #[error("fetch failed for endpoint {endpoint}: {reason}")]
    FetchFailed { endpoint: String, reason: String },

    #[error("{failed} record(s) failed to store for endpoint {endpoint}; cursor not advanced")]
    RecordsFailed { endpoint: String, failed: usize },

    #[error("store error for endpoint {endpoint}: {source}")]
    Store {
        endpoint: String,
        #[source]
        source: HubsyncError,
    },

    #[error("startup failed: {0}")]
    Startup(#[source] HubsyncError),
}

impl From<HubsyncError> for SyncError {
    fn from(err: HubsyncError) -> Self {
        match err {
            HubsyncError::Config(msg) => Self::Configuration(msg),
            other => Self::Startup(other),
        }
    }
}
