use clap::Parser;

use crate::dispatcher::UnrecognizedPolicy;

/// Incrementally sync HubSpot CRM objects into Postgres.
#[derive(Debug, Parser)]
#[command(name = "hubsync-ingest", version)]
pub struct Cli {
    /// Endpoints to sync (object type ids or aliases). Discovered when omitted.
    #[arg(long = "endpoint", value_name = "EP", num_args = 1..)]
    pub endpoints: Vec<String>,

    /// Maximum number of endpoints synced at the same time.
    #[arg(long, alias = "concurent", value_name = "N", value_parser = parse_concurrency)]
    pub concurrent: Option<usize>,

    /// What to do with records of endpoints without a typed table: store or drop.
    #[arg(long, value_name = "POLICY", value_parser = parse_policy)]
    pub unrecognized: Option<UnrecognizedPolicy>,

    /// Print the run report as JSON on stdout.
    #[arg(long)]
    pub json: bool,
}

impl Cli {
    pub fn explicit_endpoints(&self) -> Option<Vec<String>> {
        (!self.endpoints.is_empty()).then(|| self.endpoints.clone())
    }
}

pub fn parse_concurrency(value: &str) -> Result<usize, String> {
    match value.trim().parse::<usize>() {
        Ok(n) if n >= 1 => Ok(n),
        Ok(_) => Err("concurrency must be at least 1".to_string()),
        Err(e) => Err(format!("invalid concurrency '{value}': {e}")),
    }
}

fn parse_policy(value: &str) -> Result<UnrecognizedPolicy, String> {
    value.parse()
}
