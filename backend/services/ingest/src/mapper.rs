//! Record-to-entity projection.
//!
//! An endpoint name is resolved to an [`EntityKind`] through an alias table,
//! then the record's fields are projected onto that kind's static column
//! table. Unknown incoming fields are dropped and known fields that the
//! record does not carry stay out of the projection, so they are never
//! written as NULL.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::{Map, Value};

use hubsync_db::entities::models::{Entity, EntityKind, FieldType, FieldValue};

use crate::connector::RawRecord;

const BUILTIN_ALIASES: &[(&str, EntityKind)] = &[
    ("jobs", EntityKind::Job),
    ("p47947320_jobs", EntityKind::Job),
    ("2-37778614", EntityKind::Job),
    ("divisions", EntityKind::Division),
    ("p47947320_divisions", EntityKind::Division),
    ("2-37778609", EntityKind::Division),
    ("employees", EntityKind::Employee),
    ("p47947320_employees", EntityKind::Employee),
    ("2-38071071", EntityKind::Employee),
];

/// Case-insensitive endpoint name → entity kind lookup.
#[derive(Debug, Clone)]
pub struct AliasTable {
    aliases: HashMap<String, EntityKind>,
}

impl Default for AliasTable {
    fn default() -> Self {
        let mut table = Self {
            aliases: HashMap::new(),
        };
        for (alias, kind) in BUILTIN_ALIASES {
            table.insert(alias, *kind);
        }
        table
    }
}

impl AliasTable {
    pub fn insert(&mut self, alias: &str, kind: EntityKind) {
        self.aliases.insert(alias.trim().to_lowercase(), kind);
    }

    pub fn resolve(&self, endpoint: &str) -> Option<EntityKind> {
        self.aliases.get(&endpoint.trim().to_lowercase()).copied()
    }
}

/// Parse `alias=kind` pairs separated by commas, e.g. `2-99=jobs,crew=employees`.
pub fn parse_alias_pairs(raw: &str) -> Result<Vec<(String, EntityKind)>, String> {
    raw.split(',')
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (alias, kind) = pair
                .split_once('=')
                .ok_or_else(|| format!("alias entry '{pair}' must look like alias=kind"))?;
            let alias = alias.trim();
            if alias.is_empty() {
                return Err(format!("alias entry '{pair}' has an empty alias"));
            }
            Ok((alias.to_string(), kind.parse::<EntityKind>()?))
        })
        .collect()
}

/// Result of mapping one record.
#[derive(Debug, Clone, PartialEq)]
pub enum MappedRecord {
    Known(Entity),
    Unrecognized {
        endpoint: String,
        record_id: Option<String>,
        data: Value,
    },
}

#[derive(Debug, Clone, Default)]
pub struct EntityMapper {
    aliases: AliasTable,
}

impl EntityMapper {
    pub fn new(aliases: AliasTable) -> Self {
        Self { aliases }
    }

    pub fn resolve(&self, endpoint: &str) -> Option<EntityKind> {
        self.aliases.resolve(endpoint)
    }

    pub fn map(&self, endpoint: &str, record: &RawRecord) -> MappedRecord {
        match self.resolve(endpoint) {
            Some(kind) => MappedRecord::Known(project(kind, &record.fields)),
            None => MappedRecord::Unrecognized {
                endpoint: endpoint.to_string(),
                record_id: record.id.clone(),
                data: record.raw.clone(),
            },
        }
    }

    /// Source field names worth requesting for an endpoint; empty when unrecognized.
    pub fn requested_properties(&self, endpoint: &str) -> Vec<String> {
        self.resolve(endpoint)
            .map(|kind| {
                kind.fields()
                    .iter()
                    .flat_map(|spec| spec.sources.iter())
                    .map(|s| s.to_string())
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Project a field map onto the columns of `kind`.
pub fn project(kind: EntityKind, fields: &Map<String, Value>) -> Entity {
    let mut entity = Entity::new(kind);

    for spec in kind.fields() {
        let Some(value) = spec.sources.iter().find_map(|source| fields.get(*source)) else {
            continue;
        };
        match coerce(value, spec.ty) {
            Some(v) => {
                entity.fields.insert(spec.column, v);
            }
            None => {
                tracing::debug!(
                    kind = %kind,
                    column = spec.column,
                    value = %value,
                    "dropping field that does not fit its column type"
                );
            }
        }
    }

    entity
}

/// Convert a JSON value into a typed column value.
/// Returns `None` when the value cannot represent the type.
pub fn coerce(value: &Value, ty: FieldType) -> Option<FieldValue> {
    if value.is_null() {
        return Some(FieldValue::null(ty));
    }
    if ty != FieldType::Text && value.as_str().is_some_and(|s| s.trim().is_empty()) {
        return Some(FieldValue::null(ty));
    }

    match ty {
        FieldType::Int => to_i64(value).map(|v| FieldValue::Int(Some(v))),
        FieldType::Float => to_f64(value).map(|v| FieldValue::Float(Some(v))),
        FieldType::Text => Some(FieldValue::Text(Some(to_text(value)))),
        FieldType::Timestamp => to_timestamp(value).map(|v| FieldValue::Timestamp(Some(v))),
        FieldType::Date => to_date(value).map(|v| FieldValue::Date(Some(v))),
    }
}

fn integral(f: f64) -> Option<i64> {
    (f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64).then_some(f as i64)
}

fn to_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(integral)),
        Value::Bool(b) => Some(i64::from(*b)),
        Value::String(s) => {
            let s = s.trim();
            match s.to_ascii_lowercase().as_str() {
                "true" => Some(1),
                "false" => Some(0),
                _ => s
                    .parse::<i64>()
                    .ok()
                    .or_else(|| s.parse::<f64>().ok().and_then(integral)),
            }
        }
        _ => None,
    }
}

fn to_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }
}

fn to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn to_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Number(n) => n.as_i64().and_then(DateTime::from_timestamp_millis),
        Value::String(s) => {
            let s = s.trim();
            DateTime::parse_from_rfc3339(s)
                .map(|dt| dt.with_timezone(&Utc))
                .ok()
                .or_else(|| s.parse::<i64>().ok().and_then(DateTime::from_timestamp_millis))
                .or_else(|| {
                    NaiveDate::parse_from_str(s, "%Y-%m-%d")
                        .ok()
                        .and_then(|d| d.and_hms_opt(0, 0, 0))
                        .map(|dt| dt.and_utc())
                })
        }
        _ => None,
    }
}

fn to_date(value: &Value) -> Option<NaiveDate> {
    match value {
        Value::String(s) => {
            let s = s.trim();
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .or_else(|| to_timestamp(value).map(|dt| dt.date_naive()))
        }
        Value::Number(_) => to_timestamp(value).map(|dt| dt.date_naive()),
        _ => None,
    }
}
