use std::collections::{HashSet, VecDeque};

use chrono::Utc;
use futures::future::join_all;
use tokio::sync::Mutex;
use uuid::Uuid;

use hubsync_db::entities::repositories::EntityRepository;
use hubsync_db::sync::repositories::SyncCursorRepository;

use crate::connector::Connector;
use crate::error::SyncError;
use crate::fetcher::EndpointFetcher;
use crate::report::{EndpointReport, SyncReport};

pub const DEFAULT_CONCURRENCY: usize = 5;

#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Endpoints to sync; `None` or empty means discover them.
    pub endpoints: Option<Vec<String>>,
    /// Maximum number of endpoints syncing at the same time.
    pub concurrency: usize,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            endpoints: None,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }
}

type WorkQueue = Mutex<VecDeque<(usize, String)>>;

/// Fans a sync run out over a fixed pool of workers.
///
/// The endpoint list is resolved up front and loaded into a closed queue.
/// Each worker pops an endpoint, runs its whole fetch loop, then pops the
/// next one until the queue is empty, so at most `concurrency` loops are in
/// flight. Workers share one task and interleave at await points.
pub struct SyncCoordinator<S, C, R> {
    fetcher: EndpointFetcher<S, C, R>,
}

impl<S, C, R> SyncCoordinator<S, C, R>
where
    S: Connector,
    C: SyncCursorRepository,
    R: EntityRepository,
{
    pub fn new(fetcher: EndpointFetcher<S, C, R>) -> Self {
        Self { fetcher }
    }

    pub async fn run(&self, options: &SyncOptions) -> SyncReport {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();

        let endpoints = self.resolve_endpoints(options.endpoints.as_deref()).await;
        let workers = options.concurrency.max(1).min(endpoints.len());

        tracing::info!(
            %run_id,
            source = self.fetcher.source().source_name(),
            endpoints = endpoints.len(),
            workers,
            unrecognized = %self.fetcher.dispatcher().policy(),
            "sync run started"
        );

        let queue: WorkQueue = Mutex::new(endpoints.into_iter().enumerate().collect());
        let finished = join_all((0..workers).map(|worker| self.worker(worker, &queue))).await;

        let mut indexed: Vec<(usize, EndpointReport)> = finished.into_iter().flatten().collect();
        indexed.sort_by_key(|(index, _)| *index);

        let report = SyncReport {
            run_id,
            started_at,
            finished_at: Utc::now(),
            endpoints: indexed.into_iter().map(|(_, r)| r).collect(),
        };

        tracing::info!(
            %run_id,
            succeeded = report.succeeded_count(),
            failed = report.failed_count(),
            elapsed_ms = (report.finished_at - report.started_at).num_milliseconds(),
            "sync run finished"
        );

        report
    }

    async fn worker(&self, worker: usize, queue: &WorkQueue) -> Vec<(usize, EndpointReport)> {
        let mut done = Vec::new();
        loop {
            let next = queue.lock().await.pop_front();
            let Some((index, endpoint)) = next else {
                break;
            };
            tracing::debug!(worker, endpoint = %endpoint, "worker picked endpoint");
            done.push((index, self.fetcher.sync(&endpoint).await));
        }
        done
    }

    async fn resolve_endpoints(&self, explicit: Option<&[String]>) -> Vec<String> {
        if let Some(explicit) = explicit.filter(|eps| !eps.is_empty()) {
            return dedup(explicit.iter().cloned());
        }

        match self.fetcher.source().discover_endpoints().await {
            Ok(found) => {
                tracing::info!(count = found.len(), "discovered endpoints");
                dedup(found)
            }
            Err(e) => {
                let err = SyncError::DiscoveryFailed(e.to_string());
                tracing::warn!(error = %err, "continuing with no endpoints");
                Vec::new()
            }
        }
    }
}

/// Trim, drop blanks and duplicates, keep first-seen order.
fn dedup(endpoints: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut seen = HashSet::new();
    endpoints
        .into_iter()
        .map(|ep| ep.trim().to_string())
        .filter(|ep| !ep.is_empty() && seen.insert(ep.clone()))
        .collect()
}
