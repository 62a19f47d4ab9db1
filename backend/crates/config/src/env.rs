use hubsync_common::error::{HubsyncError, HubsyncResult};
use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub database_max_connections: u32,
}

impl AppConfig {
    /// Load configuration from environment variables. The binary loads
    /// `.env` before calling this.
    pub fn from_env() -> HubsyncResult<Self> {
        Ok(Self {
            database_url: get_var("DATABASE_URL")?,
            database_max_connections: get_var_or("DATABASE_MAX_CONNECTIONS", "10")
                .parse()
                .map_err(|e| {
                    HubsyncError::Config(format!("invalid DATABASE_MAX_CONNECTIONS: {e}"))
                })?,
        })
    }
}

/// Read a required variable. Blank values count as missing.
pub fn get_var(key: &str) -> HubsyncResult<String> {
    env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| HubsyncError::Config(format!("{key} is required but not set")))
}

pub fn get_var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_owned())
}
