use hubsync_common::error::{HubsyncError, HubsyncResult};
use hubsync_config::get_var_or;
use hubsync_db::entities::models::EntityKind;

use crate::cli::{parse_concurrency, Cli};
use crate::coordinator::DEFAULT_CONCURRENCY;
use crate::dispatcher::UnrecognizedPolicy;
use crate::mapper::{parse_alias_pairs, AliasTable};

/// Sync engine settings. Environment first, command-line flags on top.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncConfig {
    pub concurrency: usize,
    pub unrecognized: UnrecognizedPolicy,
    pub extra_aliases: Vec<(String, EntityKind)>,
}

impl SyncConfig {
    pub fn from_env() -> HubsyncResult<Self> {
        let concurrency = parse_concurrency(&get_var_or(
            "HUBSYNC_CONCURRENCY",
            &DEFAULT_CONCURRENCY.to_string(),
        ))
        .map_err(|e| HubsyncError::Config(format!("invalid HUBSYNC_CONCURRENCY: {e}")))?;

        let unrecognized: UnrecognizedPolicy = get_var_or("HUBSYNC_UNRECOGNIZED", "store")
            .parse()
            .map_err(|e| HubsyncError::Config(format!("invalid HUBSYNC_UNRECOGNIZED: {e}")))?;

        let extra_aliases = parse_alias_pairs(&get_var_or("HUBSYNC_EXTRA_ALIASES", ""))
            .map_err(|e| HubsyncError::Config(format!("invalid HUBSYNC_EXTRA_ALIASES: {e}")))?;

        Ok(Self {
            concurrency,
            unrecognized,
            extra_aliases,
        })
    }

    pub fn with_cli(mut self, cli: &Cli) -> Self {
        if let Some(n) = cli.concurrent {
            self.concurrency = n;
        }
        if let Some(policy) = cli.unrecognized {
            self.unrecognized = policy;
        }
        self
    }

    /// Built-in aliases plus the configured extras.
    pub fn alias_table(&self) -> AliasTable {
        let mut table = AliasTable::default();
        for (alias, kind) in &self.extra_aliases {
            table.insert(alias, *kind);
        }
        table
    }
}
