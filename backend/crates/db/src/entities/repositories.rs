use async_trait::async_trait;

use crate::entities::models::{Entity, GenericRecord, UpsertOutcome};
use hubsync_common::error::HubsyncResult;

#[async_trait]
pub trait EntityRepository: Send + Sync {
    /// Create or update a typed row keyed by the entity's natural key.
    /// Writes exactly the columns present in `entity.fields`; a missing
    /// natural key is a validation error.
    async fn upsert(&self, entity: &Entity) -> HubsyncResult<UpsertOutcome>;

    /// Create or update a raw payload keyed by (endpoint, record_id).
    async fn upsert_generic(&self, record: &GenericRecord) -> HubsyncResult<UpsertOutcome>;
}
