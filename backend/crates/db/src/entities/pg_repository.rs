use async_trait::async_trait;
use sqlx::query_builder::Separated;
use sqlx::{PgPool, Postgres, QueryBuilder, Row};

use crate::entities::models::{Entity, FieldValue, GenericRecord, UpsertOutcome};
use crate::entities::repositories::EntityRepository;
use hubsync_common::error::{HubsyncError, HubsyncResult};

#[derive(Clone)]
pub struct PgEntityRepository {
    pool: PgPool,
}

impl PgEntityRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn outcome(row: sqlx::postgres::PgRow) -> UpsertOutcome {
        // xmax is 0 only for a freshly inserted tuple
        if row.get::<bool, _>("inserted") {
            UpsertOutcome::Created
        } else {
            UpsertOutcome::Updated
        }
    }
}

fn push_value(values: &mut Separated<'_, '_, Postgres, &'static str>, value: &FieldValue) {
    match value {
        FieldValue::Int(v) => values.push_bind(*v),
        FieldValue::Float(v) => values.push_bind(*v),
        FieldValue::Text(v) => values.push_bind(v.clone()),
        FieldValue::Timestamp(v) => values.push_bind(*v),
        FieldValue::Date(v) => values.push_bind(*v),
    };
}

/// Build `insert .. on conflict (key) do update` over the projected columns only.
fn build_upsert(entity: &Entity) -> QueryBuilder<'static, Postgres> {
    let kind = entity.kind;
    let key = kind.natural_key();

    let mut qb = QueryBuilder::new(format!("insert into {} (", kind.table()));
    {
        let mut columns = qb.separated(", ");
        for column in entity.fields.keys() {
            columns.push(*column);
        }
    }
    qb.push(") values (");
    {
        let mut values = qb.separated(", ");
        for value in entity.fields.values() {
            push_value(&mut values, value);
        }
    }
    qb.push(format!(") on conflict ({key}) do update set "));
    {
        let mut updates = qb.separated(", ");
        for column in entity.fields.keys().filter(|c| **c != key) {
            updates.push(format!("{column} = excluded.{column}"));
        }
        updates.push("synced_at = now()");
    }
    qb.push(" returning (xmax = 0) as inserted");
    qb
}

#[async_trait]
impl EntityRepository for PgEntityRepository {
    async fn upsert(&self, entity: &Entity) -> HubsyncResult<UpsertOutcome> {
        if entity.natural_key().is_none() {
            return Err(HubsyncError::Validation(format!(
                "{} record is missing natural key {}",
                entity.kind,
                entity.kind.natural_key()
            )));
        }

        let mut qb = build_upsert(entity);
        let row = qb
            .build()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| HubsyncError::Database(e.to_string()))?;

        Ok(Self::outcome(row))
    }

    async fn upsert_generic(&self, record: &GenericRecord) -> HubsyncResult<UpsertOutcome> {
        let row = sqlx::query(
            "insert into hubspot_records (endpoint, record_id, data)
             values ($1, $2, $3)
             on conflict (endpoint, record_id) do update set
               data = excluded.data,
               synced_at = now()
             returning (xmax = 0) as inserted",
        )
        .bind(&record.endpoint)
        .bind(&record.record_id)
        .bind(&record.data)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| HubsyncError::Database(e.to_string()))?;

        Ok(Self::outcome(row))
    }
}
