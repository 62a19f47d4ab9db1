use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

pub type ConnectorError = Box<dyn std::error::Error + Send + Sync>;

/// Query for one page of an endpoint.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageFilter {
    /// Only records modified after this instant.
    pub updated_after: Option<DateTime<Utc>>,
    /// Continuation token returned by the previous page.
    pub after: Option<String>,
    /// Source field names to request; empty means the remote default set.
    pub properties: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct Page {
    pub records: Vec<RawRecord>,
    pub next_page_token: Option<String>,
}

/// A record as returned by the remote API, flattened to one field map.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    pub id: Option<String>,
    pub fields: Map<String, Value>,
    pub raw: Value,
}

impl RawRecord {
    /// Top-level keys become fields, then the entries of a nested
    /// `properties` object are laid over them. The id is the top-level `id`,
    /// falling back to a `job_id` field.
    pub fn from_value(raw: Value) -> Self {
        let mut fields = Map::new();
        let mut id = None;

        if let Value::Object(obj) = &raw {
            for (key, value) in obj {
                if key != "properties" {
                    fields.insert(key.clone(), value.clone());
                }
            }
            if let Some(Value::Object(properties)) = obj.get("properties") {
                for (key, value) in properties {
                    fields.insert(key.clone(), value.clone());
                }
            }
            id = obj
                .get("id")
                .and_then(record_id)
                .or_else(|| fields.get("job_id").and_then(record_id));
        }

        Self { id, fields, raw }
    }
}

fn record_id(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// A remote object store that can list its object types and page through them.
#[async_trait]
pub trait Connector: Send + Sync {
    fn source_name(&self) -> &str;

    async fn discover_endpoints(&self) -> Result<Vec<String>, ConnectorError>;

    async fn fetch_page(&self, endpoint: &str, filter: &PageFilter)
        -> Result<Page, ConnectorError>;
}
