use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::entities::schema;

/// The fixed set of object kinds that have a typed table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Job,
    Division,
    Employee,
}

impl EntityKind {
    pub const ALL: [EntityKind; 3] = [Self::Job, Self::Division, Self::Employee];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Job => "job",
            Self::Division => "division",
            Self::Employee => "employee",
        }
    }

    pub fn table(&self) -> &'static str {
        match self {
            Self::Job => "jobs",
            Self::Division => "divisions",
            Self::Employee => "employees",
        }
    }

    /// Column that identifies a row for upserts.
    pub fn natural_key(&self) -> &'static str {
        match self {
            Self::Job => "job_id",
            Self::Division => "id",
            Self::Employee => "hs_object_id",
        }
    }

    pub fn fields(&self) -> &'static [FieldSpec] {
        match self {
            Self::Job => schema::JOB_FIELDS,
            Self::Division => schema::DIVISION_FIELDS,
            Self::Employee => schema::EMPLOYEE_FIELDS,
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "job" | "jobs" => Ok(Self::Job),
            "division" | "divisions" => Ok(Self::Division),
            "employee" | "employees" => Ok(Self::Employee),
            _ => Err(format!("unknown entity kind: {value}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Int,
    Float,
    Text,
    Timestamp,
    Date,
}

/// One column of a typed table and the record fields it is read from.
/// The first source name present in a record wins.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub sources: &'static [&'static str],
    pub column: &'static str,
    pub ty: FieldType,
}

/// A typed column value. `None` is a NULL that will be written.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Int(Option<i64>),
    Float(Option<f64>),
    Text(Option<String>),
    Timestamp(Option<DateTime<Utc>>),
    Date(Option<NaiveDate>),
}

impl FieldValue {
    pub fn null(ty: FieldType) -> Self {
        match ty {
            FieldType::Int => Self::Int(None),
            FieldType::Float => Self::Float(None),
            FieldType::Text => Self::Text(None),
            FieldType::Timestamp => Self::Timestamp(None),
            FieldType::Date => Self::Date(None),
        }
    }

    pub fn is_null(&self) -> bool {
        match self {
            Self::Int(v) => v.is_none(),
            Self::Float(v) => v.is_none(),
            Self::Text(v) => v.is_none(),
            Self::Timestamp(v) => v.is_none(),
            Self::Date(v) => v.is_none(),
        }
    }
}

/// Projection of a record onto a typed table. Only the columns present in
/// `fields` are written; anything else in the stored row is left alone.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub kind: EntityKind,
    pub fields: BTreeMap<&'static str, FieldValue>,
}

impl Entity {
    pub fn new(kind: EntityKind) -> Self {
        Self {
            kind,
            fields: BTreeMap::new(),
        }
    }

    pub fn get(&self, column: &str) -> Option<&FieldValue> {
        self.fields.get(column)
    }

    /// The natural key value, if present and not NULL.
    pub fn natural_key(&self) -> Option<&FieldValue> {
        self.fields
            .get(self.kind.natural_key())
            .filter(|v| !v.is_null())
    }
}

/// Raw payload of a record from an endpoint without a typed table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenericRecord {
    pub endpoint: String,
    pub record_id: String,
    pub data: serde_json::Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpsertOutcome {
    Created,
    Updated,
}
