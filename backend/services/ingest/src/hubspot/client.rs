use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;

use hubsync_common::error::{HubsyncError, HubsyncResult};
use hubsync_config::{get_var, get_var_or};

use super::models::{ObjectPageResponse, SchemaListResponse};
use crate::connector::{Connector, ConnectorError, Page, PageFilter, RawRecord};

const MAX_PAGE_LIMIT: u32 = 100;
const MAX_RETRIES_CAP: u32 = 10;
const MAX_BACKOFF_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct HubSpotClientConfig {
    pub base_url: String,
    pub api_token: String,
    pub page_limit: u32,
    pub max_retries: u32,
    pub timeout_secs: u64,
}

impl HubSpotClientConfig {
    /// Load HubSpot config from environment.
    ///
    /// The API token is mandatory: a missing or blank `HUBSPOT_API_TOKEN`
    /// is a configuration error, reported before any endpoint starts.
    pub fn from_env() -> HubsyncResult<Self> {
        let api_token = get_var("HUBSPOT_API_TOKEN")?;
        let base_url = get_var_or("HUBSPOT_BASE_URL", "https://api.hubapi.com")
            .trim_end_matches('/')
            .to_string();

        let page_limit = parse_number::<u32>("HUBSPOT_PAGE_LIMIT", "100")?.clamp(1, MAX_PAGE_LIMIT);
        let max_retries = parse_number::<u32>("HUBSPOT_MAX_RETRIES", "3")?.min(MAX_RETRIES_CAP);
        let timeout_secs = parse_number("HUBSPOT_TIMEOUT_SECS", "30")?;

        Ok(Self {
            base_url,
            api_token,
            page_limit,
            max_retries,
            timeout_secs,
        })
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, default: &str) -> HubsyncResult<T>
where
    T::Err: std::fmt::Display,
{
    get_var_or(key, default)
        .trim()
        .parse()
        .map_err(|e| HubsyncError::Config(format!("invalid {key}: {e}")))
}

/// Exponential backoff before retry `attempt`, capped at `MAX_BACKOFF_SECS`.
fn backoff_secs(attempt: u32) -> u64 {
    1u64.checked_shl(attempt).unwrap_or(u64::MAX).min(MAX_BACKOFF_SECS)
}

/// Render a watermark the way it is sent as `updatedAfter`.
pub fn format_watermark(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

#[derive(Clone)]
pub struct HubSpotClient {
    client: Client,
    config: HubSpotClientConfig,
}

#[derive(Debug, thiserror::Error)]
pub enum HubSpotClientError {
    #[error("HTTP {status}: {body}")]
    HttpError { status: StatusCode, body: String },

    #[error("request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("max retries exceeded after {attempts} attempts: {last_error}")]
    MaxRetriesExceeded { attempts: u32, last_error: String },
}

impl HubSpotClient {
    pub fn new(config: HubSpotClientConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { client, config })
    }

    /// List the object type ids of every schema in the portal.
    pub async fn fetch_schemas(&self) -> Result<Vec<String>, HubSpotClientError> {
        let url = format!("{}/crm/v3/schemas", self.config.base_url);
        let response: SchemaListResponse = self.request_with_retry(&url, &[]).await?;
        Ok(response.object_type_ids())
    }

    /// Fetch one page of objects of the given type.
    pub async fn fetch_objects(
        &self,
        object_type: &str,
        filter: &PageFilter,
    ) -> Result<ObjectPageResponse, HubSpotClientError> {
        let url = format!("{}/crm/v3/objects/{}", self.config.base_url, object_type);

        let mut query = vec![("limit", self.config.page_limit.to_string())];
        if let Some(updated_after) = filter.updated_after {
            query.push(("updatedAfter", format_watermark(updated_after)));
        }
        if let Some(after) = &filter.after {
            query.push(("after", after.clone()));
        }
        if !filter.properties.is_empty() {
            query.push(("properties", filter.properties.join(",")));
        }

        self.request_with_retry(&url, &query).await
    }

    async fn request_with_retry<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T, HubSpotClientError> {
        let mut last_error = String::new();

        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                let backoff_secs = backoff_secs(attempt);
                tracing::warn!(attempt, backoff_secs, url, "retrying after backoff");
                tokio::time::sleep(Duration::from_secs(backoff_secs)).await;
            }

            let response = match self
                .client
                .get(url)
                .query(query)
                .bearer_auth(&self.config.api_token)
                .send()
                .await
            {
                Ok(resp) => resp,
                Err(e) => {
                    last_error = e.to_string();
                    if e.is_timeout() || e.is_connect() {
                        continue;
                    }
                    return Err(HubSpotClientError::RequestError(e));
                }
            };

            let status = response.status();

            if status.is_success() {
                return response
                    .json::<T>()
                    .await
                    .map_err(HubSpotClientError::RequestError);
            }

            // Honor Retry-After header for 429
            if status == StatusCode::TOO_MANY_REQUESTS {
                if let Some(retry_after) = response
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok())
                {
                    let wait = std::cmp::min(retry_after, 60);
                    tracing::warn!(wait, "rate-limited, waiting Retry-After");
                    tokio::time::sleep(Duration::from_secs(wait)).await;
                }
                last_error = "429 Too Many Requests".to_string();
                continue;
            }

            // Retry on 5xx
            if status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                last_error = format!("{status}: {body}");
                continue;
            }

            // Fail fast on 4xx (except 429 handled above)
            let body = response.text().await.unwrap_or_default();
            return Err(HubSpotClientError::HttpError { status, body });
        }

        Err(HubSpotClientError::MaxRetriesExceeded {
            attempts: self.config.max_retries + 1,
            last_error,
        })
    }
}

#[async_trait]
impl Connector for HubSpotClient {
    fn source_name(&self) -> &str {
        "hubspot"
    }

    async fn discover_endpoints(&self) -> Result<Vec<String>, ConnectorError> {
        Ok(self.fetch_schemas().await?)
    }

    async fn fetch_page(
        &self,
        endpoint: &str,
        filter: &PageFilter,
    ) -> Result<Page, ConnectorError> {
        let response = self.fetch_objects(endpoint, filter).await?;
        let next_page_token = response.next_after();
        Ok(Page {
            records: response
                .results
                .into_iter()
                .map(RawRecord::from_value)
                .collect(),
            next_page_token,
        })
    }
}
