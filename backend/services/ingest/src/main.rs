mod cli;
mod config;
mod connector;
mod coordinator;
mod dispatcher;
mod error;
mod fetcher;
mod hubspot;
mod mapper;
mod report;
#[cfg(test)]
mod test_support;

use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;

use hubsync_config::{init_tracing, AppConfig};
use hubsync_db::entities::pg_repository::PgEntityRepository;
use hubsync_db::sync::pg_repository::PgSyncCursorRepository;

use crate::cli::Cli;
use crate::config::SyncConfig;
use crate::coordinator::{SyncCoordinator, SyncOptions};
use crate::dispatcher::UpsertDispatcher;
use crate::error::SyncError;
use crate::fetcher::EndpointFetcher;
use crate::hubspot::client::{HubSpotClient, HubSpotClientConfig};
use crate::mapper::EntityMapper;
use crate::report::SyncReport;

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    init_tracing("info");
    let cli = Cli::parse();

    tracing::info!(service = "hubsync-ingest", "starting");

    let report = match run(&cli).await {
        Ok(report) => report,
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "sync could not start");
            return ExitCode::from(2);
        }
    };

    for ep in &report.endpoints {
        match &ep.error {
            Some(error) => {
                tracing::warn!(endpoint = %ep.endpoint, error = %error, "endpoint failed")
            }
            None => tracing::info!(
                endpoint = %ep.endpoint,
                status = ep.status.as_str(),
                fetched = ep.fetched,
                created = ep.created,
                updated = ep.updated,
                "endpoint done"
            ),
        }
    }

    if cli.json {
        match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{json}"),
            Err(e) => tracing::error!(error = %e, "failed to serialize report"),
        }
    }

    if report.is_failure() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

/// Load configuration, wire up the store and the HubSpot client, run one sync.
/// Every error returned here happens before any endpoint starts.
async fn run(cli: &Cli) -> anyhow::Result<SyncReport> {
    let app = AppConfig::from_env().map_err(SyncError::from)?;
    let hubspot = HubSpotClientConfig::from_env().map_err(SyncError::from)?;
    let sync = SyncConfig::from_env().map_err(SyncError::from)?.with_cli(cli);

    tracing::info!(
        base_url = %hubspot.base_url,
        page_limit = hubspot.page_limit,
        concurrency = sync.concurrency,
        unrecognized = %sync.unrecognized,
        "configuration loaded"
    );

    let pool = hubsync_db::create_pool(&app.database_url, app.database_max_connections)
        .await
        .context("failed to connect to database")?;
    hubsync_db::ensure_schema(&pool)
        .await
        .context("failed to prepare schema")?;

    let client = HubSpotClient::new(hubspot).context("failed to create hubspot client")?;
    let fetcher = EndpointFetcher::new(
        client,
        PgSyncCursorRepository::new(pool.clone()),
        EntityMapper::new(sync.alias_table()),
        UpsertDispatcher::new(PgEntityRepository::new(pool), sync.unrecognized),
    );

    let options = SyncOptions {
        endpoints: cli.explicit_endpoints(),
        concurrency: sync.concurrency,
    };

    Ok(SyncCoordinator::new(fetcher).run(&options).await)
}
