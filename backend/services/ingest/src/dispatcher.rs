use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use hubsync_common::error::HubsyncResult;
use hubsync_db::entities::models::{GenericRecord, UpsertOutcome};
use hubsync_db::entities::repositories::EntityRepository;

use crate::mapper::MappedRecord;

/// What to do with records of endpoints that have no typed table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UnrecognizedPolicy {
    /// Keep the raw payload in the generic records table.
    #[default]
    Store,
    /// Discard the record with a warning.
    Drop,
}

impl fmt::Display for UnrecognizedPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Store => "store",
            Self::Drop => "drop",
        })
    }
}

impl FromStr for UnrecognizedPolicy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "store" => Ok(Self::Store),
            "drop" => Ok(Self::Drop),
            other => Err(format!(
                "unknown unrecognized-endpoint policy '{other}' (expected store or drop)"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    MissingNaturalKey,
    MissingRecordId,
    Dropped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    Created,
    Updated,
    Skipped(SkipReason),
}

impl From<UpsertOutcome> for DispatchOutcome {
    fn from(outcome: UpsertOutcome) -> Self {
        match outcome {
            UpsertOutcome::Created => Self::Created,
            UpsertOutcome::Updated => Self::Updated,
        }
    }
}

/// Routes mapped records to the entity store.
pub struct UpsertDispatcher<R> {
    repo: R,
    policy: UnrecognizedPolicy,
}

impl<R> UpsertDispatcher<R>
where
    R: EntityRepository,
{
    pub fn new(repo: R, policy: UnrecognizedPolicy) -> Self {
        Self { repo, policy }
    }

    pub fn policy(&self) -> UnrecognizedPolicy {
        self.policy
    }

    /// Store one record. Records that cannot be stored safely come back as
    /// `Skipped`; only store failures are errors.
    pub async fn apply(
        &self,
        endpoint: &str,
        record: MappedRecord,
    ) -> HubsyncResult<DispatchOutcome> {
        match record {
            MappedRecord::Known(entity) => {
                if entity.natural_key().is_none() {
                    tracing::warn!(
                        endpoint,
                        kind = %entity.kind,
                        key = entity.kind.natural_key(),
                        "record has no natural key, skipping"
                    );
                    return Ok(DispatchOutcome::Skipped(SkipReason::MissingNaturalKey));
                }
                Ok(self.repo.upsert(&entity).await?.into())
            }
            MappedRecord::Unrecognized {
                endpoint: source,
                record_id,
                data,
            } => match self.policy {
                UnrecognizedPolicy::Drop => {
                    tracing::warn!(
                        endpoint = %source,
                        record_id = record_id.as_deref().unwrap_or("-"),
                        "dropping record of unrecognized endpoint"
                    );
                    Ok(DispatchOutcome::Skipped(SkipReason::Dropped))
                }
                UnrecognizedPolicy::Store => {
                    let Some(record_id) = record_id else {
                        tracing::warn!(endpoint = %source, "generic record has no id, skipping");
                        return Ok(DispatchOutcome::Skipped(SkipReason::MissingRecordId));
                    };
                    let generic = GenericRecord {
                        endpoint: source,
                        record_id,
                        data,
                    };
                    Ok(self.repo.upsert_generic(&generic).await?.into())
                }
            },
        }
    }
}
