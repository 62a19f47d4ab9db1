//! In-memory fakes of the store traits and the remote connector.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;

use hubsync_common::error::{HubsyncError, HubsyncResult};
use hubsync_db::entities::models::{Entity, EntityKind, FieldValue, GenericRecord, UpsertOutcome};
use hubsync_db::entities::repositories::EntityRepository;
use hubsync_db::sync::models::SyncCursor;
use hubsync_db::sync::repositories::SyncCursorRepository;

use crate::connector::{Connector, ConnectorError, Page, PageFilter, RawRecord};

/// Serializes tests that touch process environment variables.
pub static ENV_LOCK: Mutex<()> = Mutex::new(());

// ── Cursor store ────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct MemoryCursorRepo {
    pub cursors: Arc<Mutex<HashMap<String, SyncCursor>>>,
    pub failures: Arc<Mutex<Vec<(String, String)>>>,
    pub fail_writes: bool,
}

impl MemoryCursorRepo {
    pub fn with_cursor(endpoint: &str, last_synced_at: DateTime<Utc>) -> Self {
        let repo = Self::default();
        repo.cursors.lock().unwrap().insert(
            endpoint.to_string(),
            SyncCursor {
                endpoint: endpoint.to_string(),
                last_synced_at: Some(last_synced_at),
                last_error: None,
                created_at: last_synced_at,
                updated_at: last_synced_at,
            },
        );
        repo
    }

    pub fn last_synced_at(&self, endpoint: &str) -> Option<DateTime<Utc>> {
        self.cursors
            .lock()
            .unwrap()
            .get(endpoint)
            .and_then(|c| c.last_synced_at)
    }
}

#[async_trait]
impl SyncCursorRepository for MemoryCursorRepo {
    async fn get(&self, endpoint: &str) -> HubsyncResult<Option<SyncCursor>> {
        Ok(self.cursors.lock().unwrap().get(endpoint).cloned())
    }

    async fn set(&self, endpoint: &str, synced_at: DateTime<Utc>) -> HubsyncResult<SyncCursor> {
        if self.fail_writes {
            return Err(HubsyncError::Database("cursor table is read-only".to_string()));
        }
        let mut cursors = self.cursors.lock().unwrap();
        let now = Utc::now();
        let cursor = cursors
            .entry(endpoint.to_string())
            .or_insert_with(|| SyncCursor {
                endpoint: endpoint.to_string(),
                last_synced_at: None,
                last_error: None,
                created_at: now,
                updated_at: now,
            });
        cursor.last_synced_at = cursor.last_synced_at.max(Some(synced_at));
        cursor.last_error = None;
        cursor.updated_at = now;
        Ok(cursor.clone())
    }

    async fn record_failure(&self, endpoint: &str, error_message: &str) -> HubsyncResult<()> {
        self.failures
            .lock()
            .unwrap()
            .push((endpoint.to_string(), error_message.to_string()));
        if let Some(cursor) = self.cursors.lock().unwrap().get_mut(endpoint) {
            cursor.last_error = Some(error_message.to_string());
        }
        Ok(())
    }
}

// ── Entity store ────────────────────────────────────────────────

type Row = BTreeMap<&'static str, FieldValue>;

#[derive(Clone, Default)]
pub struct MemoryEntityRepo {
    pub rows: Arc<Mutex<HashMap<(EntityKind, String), Row>>>,
    pub generic: Arc<Mutex<HashMap<(String, String), Value>>>,
    /// Natural key values (as rendered by `{:?}`) whose upsert fails.
    pub failing_keys: Arc<Mutex<Vec<String>>>,
}

impl MemoryEntityRepo {
    pub fn row_count(&self, kind: EntityKind) -> usize {
        self.rows
            .lock()
            .unwrap()
            .keys()
            .filter(|(k, _)| *k == kind)
            .count()
    }

    pub fn row(&self, kind: EntityKind, key: &FieldValue) -> Option<Row> {
        self.rows
            .lock()
            .unwrap()
            .get(&(kind, format!("{key:?}")))
            .cloned()
    }

    pub fn generic_count(&self) -> usize {
        self.generic.lock().unwrap().len()
    }
}

#[async_trait]
impl EntityRepository for MemoryEntityRepo {
    async fn upsert(&self, entity: &Entity) -> HubsyncResult<UpsertOutcome> {
        let key = entity
            .natural_key()
            .map(|k| format!("{k:?}"))
            .ok_or_else(|| HubsyncError::Validation("missing natural key".to_string()))?;

        if self.failing_keys.lock().unwrap().contains(&key) {
            return Err(HubsyncError::Database(format!("constraint violated for {key}")));
        }

        let mut rows = self.rows.lock().unwrap();
        match rows.get_mut(&(entity.kind, key.clone())) {
            Some(row) => {
                row.extend(entity.fields.iter().map(|(c, v)| (*c, v.clone())));
                Ok(UpsertOutcome::Updated)
            }
            None => {
                rows.insert((entity.kind, key), entity.fields.clone());
                Ok(UpsertOutcome::Created)
            }
        }
    }

    async fn upsert_generic(&self, record: &GenericRecord) -> HubsyncResult<UpsertOutcome> {
        let previous = self.generic.lock().unwrap().insert(
            (record.endpoint.clone(), record.record_id.clone()),
            record.data.clone(),
        );
        Ok(match previous {
            Some(_) => UpsertOutcome::Updated,
            None => UpsertOutcome::Created,
        })
    }
}

// ── Connector ───────────────────────────────────────────────────

pub type ScriptedPage = Result<Vec<Value>, String>;

/// Serves pre-recorded pages per endpoint in order. Every page but the last
/// of an endpoint carries a next-page token.
#[derive(Clone, Default)]
pub struct ScriptedConnector {
    endpoints: Arc<Mutex<Option<Vec<String>>>>,
    pages: Arc<Mutex<HashMap<String, VecDeque<ScriptedPage>>>>,
    pub requests: Arc<Mutex<Vec<(String, PageFilter)>>>,
    pub discover_calls: Arc<AtomicUsize>,
    delay: Option<Duration>,
    in_flight: Arc<AtomicUsize>,
    pub max_in_flight: Arc<AtomicUsize>,
}

impl ScriptedConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// `None` makes discovery fail.
    pub fn with_discovery(self, endpoints: Option<Vec<&str>>) -> Self {
        *self.endpoints.lock().unwrap() =
            endpoints.map(|eps| eps.into_iter().map(String::from).collect());
        self
    }

    pub fn with_pages(self, endpoint: &str, pages: Vec<ScriptedPage>) -> Self {
        self.pages
            .lock()
            .unwrap()
            .insert(endpoint.to_string(), pages.into_iter().collect());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn requests_for(&self, endpoint: &str) -> Vec<PageFilter> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|(ep, _)| ep == endpoint)
            .map(|(_, f)| f.clone())
            .collect()
    }
}

#[async_trait]
impl Connector for ScriptedConnector {
    fn source_name(&self) -> &str {
        "scripted"
    }

    async fn discover_endpoints(&self) -> Result<Vec<String>, ConnectorError> {
        self.discover_calls.fetch_add(1, Ordering::SeqCst);
        self.endpoints
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| "HTTP 503: schemas unavailable".into())
    }

    async fn fetch_page(
        &self,
        endpoint: &str,
        filter: &PageFilter,
    ) -> Result<Page, ConnectorError> {
        self.requests
            .lock()
            .unwrap()
            .push((endpoint.to_string(), filter.clone()));

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let (next, remaining) = {
            let mut pages = self.pages.lock().unwrap();
            let queue = pages.entry(endpoint.to_string()).or_default();
            (queue.pop_front(), queue.len())
        };

        let records = match next {
            Some(Ok(records)) => records,
            Some(Err(reason)) => return Err(reason.into()),
            None => Vec::new(),
        };

        Ok(Page {
            records: records.into_iter().map(RawRecord::from_value).collect(),
            next_page_token: (remaining > 0).then(|| format!("{endpoint}-after-{remaining}")),
        })
    }
}
