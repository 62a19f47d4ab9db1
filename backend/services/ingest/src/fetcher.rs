use chrono::Utc;

use hubsync_db::entities::repositories::EntityRepository;
use hubsync_db::sync::repositories::SyncCursorRepository;

use crate::connector::{Connector, PageFilter};
use crate::dispatcher::{DispatchOutcome, UpsertDispatcher};
use crate::error::SyncError;
use crate::mapper::EntityMapper;
use crate::report::{EndpointReport, EndpointStatus};

/// Runs the incremental fetch loop of a single endpoint.
pub struct EndpointFetcher<S, C, R> {
    source: S,
    cursors: C,
    mapper: EntityMapper,
    dispatcher: UpsertDispatcher<R>,
}

impl<S, C, R> EndpointFetcher<S, C, R>
where
    S: Connector,
    C: SyncCursorRepository,
    R: EntityRepository,
{
    pub fn new(
        source: S,
        cursors: C,
        mapper: EntityMapper,
        dispatcher: UpsertDispatcher<R>,
    ) -> Self {
        Self {
            source,
            cursors,
            mapper,
            dispatcher,
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn dispatcher(&self) -> &UpsertDispatcher<R> {
        &self.dispatcher
    }

    /// Sync one endpoint. Never returns an error: failures end up in the report.
    pub async fn sync(&self, endpoint: &str) -> EndpointReport {
        let mut report = EndpointReport::new(endpoint);

        match self.run(endpoint, &mut report).await {
            Ok(()) => {
                tracing::info!(
                    endpoint,
                    status = report.status.as_str(),
                    pages = report.pages,
                    fetched = report.fetched,
                    created = report.created,
                    updated = report.updated,
                    skipped = report.skipped,
                    errors = report.errors,
                    "endpoint sync completed"
                );
                report
            }
            Err(e) => {
                tracing::error!(
                    endpoint,
                    error = %e,
                    pages = report.pages,
                    "endpoint sync failed"
                );
                if matches!(
                    e,
                    SyncError::FetchFailed { .. } | SyncError::RecordsFailed { .. }
                ) {
                    let message = e.to_string();
                    if let Err(store_err) = self.cursors.record_failure(endpoint, &message).await {
                        tracing::warn!(
                            endpoint,
                            error = %store_err,
                            "failed to record sync failure"
                        );
                    }
                }
                report.fail(e)
            }
        }
    }

    async fn run(&self, endpoint: &str, report: &mut EndpointReport) -> Result<(), SyncError> {
        let store_err = |source| SyncError::Store {
            endpoint: endpoint.to_string(),
            source,
        };

        let watermark = self
            .cursors
            .get(endpoint)
            .await
            .map_err(store_err)?
            .and_then(|c| c.last_synced_at);

        match watermark {
            Some(ts) => tracing::info!(endpoint, updated_after = %ts, "starting incremental sync"),
            None => tracing::info!(endpoint, "no cursor, starting full sync"),
        }

        let mut filter = PageFilter {
            updated_after: watermark,
            after: None,
            properties: self.mapper.requested_properties(endpoint),
        };

        loop {
            let page = self
                .source
                .fetch_page(endpoint, &filter)
                .await
                .map_err(|e| SyncError::FetchFailed {
                    endpoint: endpoint.to_string(),
                    reason: e.to_string(),
                })?;
            report.pages += 1;

            tracing::debug!(
                endpoint,
                page = report.pages,
                count = page.records.len(),
                "fetched page"
            );

            if page.records.is_empty() {
                if report.pages == 1 {
                    report.status = EndpointStatus::SkippedEmpty;
                }
                break;
            }

            for record in &page.records {
                report.fetched += 1;
                let mapped = self.mapper.map(endpoint, record);
                match self.dispatcher.apply(endpoint, mapped).await {
                    Ok(DispatchOutcome::Created) => report.created += 1,
                    Ok(DispatchOutcome::Updated) => report.updated += 1,
                    Ok(DispatchOutcome::Skipped(_)) => report.skipped += 1,
                    Err(e) => {
                        tracing::warn!(
                            endpoint,
                            record_id = record.id.as_deref().unwrap_or("-"),
                            error = %e,
                            "failed to upsert record"
                        );
                        report.errors += 1;
                    }
                }
            }

            // the time filter only applies to the first page
            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(token) => {
                    filter.updated_after = None;
                    filter.after = Some(token);
                }
                None => break,
            }
        }

        // a record that failed to store must be fetched again next run
        if report.errors > 0 {
            return Err(SyncError::RecordsFailed {
                endpoint: endpoint.to_string(),
                failed: report.errors,
            });
        }

        let cursor = self
            .cursors
            .set(endpoint, Utc::now())
            .await
            .map_err(store_err)?;
        report.synced_at = cursor.last_synced_at;

        Ok(())
    }
}
