use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum EndpointStatus {
    Synced,
    Failed,
    SkippedEmpty,
}

impl EndpointStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Synced => "synced",
            Self::Failed => "failed",
            Self::SkippedEmpty => "skipped-empty",
        }
    }
}

/// Outcome of one endpoint's fetch loop.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EndpointReport {
    pub endpoint: String,
    pub status: EndpointStatus,
    pub pages: usize,
    pub fetched: usize,
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
    pub errors: usize,
    /// Watermark written at the end of the loop.
    pub synced_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
}

impl EndpointReport {
    pub fn new(endpoint: &str) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            status: EndpointStatus::Synced,
            pages: 0,
            fetched: 0,
            created: 0,
            updated: 0,
            skipped: 0,
            errors: 0,
            synced_at: None,
            error: None,
        }
    }

    pub fn fail(mut self, error: impl ToString) -> Self {
        self.status = EndpointStatus::Failed;
        self.error = Some(error.to_string());
        self
    }

    pub fn is_success(&self) -> bool {
        self.status != EndpointStatus::Failed
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub endpoints: Vec<EndpointReport>,
}

impl SyncReport {
    pub fn failed_count(&self) -> usize {
        self.endpoints.iter().filter(|e| !e.is_success()).count()
    }

    pub fn succeeded_count(&self) -> usize {
        self.endpoints.iter().filter(|e| e.is_success()).count()
    }

    /// True when at least one endpoint failed and none succeeded.
    pub fn is_failure(&self) -> bool {
        self.failed_count() > 0 && self.succeeded_count() == 0
    }
}
