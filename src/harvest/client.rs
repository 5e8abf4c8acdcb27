use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

use super::http::HarvestClient;
use super::rate_limit::{RateLimitConfig, RetryPolicy};
use super::request::{
    AdvanceRequest, ApplicationQuery, CandidatePayload, CandidateQuery, JobQuery, JobStageQuery,
    NoteRequest, Pagination, RejectRequest, UserQuery,
};
use crate::config::{DEFAULT_BASE_URL, ENV_API_KEY, ENV_BASE_URL, HarvestConfig};

/// Errors that can occur when talking to the Harvest API.
#[derive(Debug, thiserror::Error)]
pub enum HarvestError {
    /// No usable credentials or settings
    #[error("Configuration error: {0}")]
    Configuration(String),
    /// The API answered with a 4xx/5xx other than 429
    #[error("Harvest API error ({status}): {body}")]
    Api { status: u16, body: String },
    /// The API kept answering 429 past the retry policy
    #[error("Rate limited by Harvest after {attempts} attempts ({waited:?} spent waiting)")]
    RetriesExhausted { attempts: u32, waited: Duration },
    /// Transport failure, including timeouts
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    /// The response body was not JSON
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
    /// A request body could not be encoded
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl HarvestError {
    /// HTTP status carried by the error, if the server produced one.
    pub fn status(&self) -> Option<u16> {
        match self {
            HarvestError::Api { status, .. } => Some(*status),
            HarvestError::RetriesExhausted { .. } => Some(429),
            HarvestError::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// The Harvest endpoints exposed as tools.
///
/// Every method forwards raw JSON: list endpoints return the response array,
/// single-record endpoints the record, and 204 responses an empty object.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HarvestApi: Send + Sync {
    async fn list_jobs(&self, query: JobQuery) -> Result<Value, HarvestError>;
    async fn get_job(&self, job_id: u64) -> Result<Value, HarvestError>;
    async fn list_job_stages(&self, query: JobStageQuery) -> Result<Value, HarvestError>;
    async fn get_job_stage(&self, job_stage_id: u64) -> Result<Value, HarvestError>;

    async fn list_candidates(&self, query: CandidateQuery) -> Result<Value, HarvestError>;
    async fn get_candidate(&self, candidate_id: u64) -> Result<Value, HarvestError>;
    async fn create_candidate(&self, candidate: CandidatePayload) -> Result<Value, HarvestError>;
    async fn update_candidate(
        &self,
        candidate_id: u64,
        candidate: CandidatePayload,
    ) -> Result<Value, HarvestError>;

    async fn list_applications(&self, query: ApplicationQuery) -> Result<Value, HarvestError>;
    async fn get_application(&self, application_id: u64) -> Result<Value, HarvestError>;
    async fn advance_application(
        &self,
        application_id: u64,
        request: AdvanceRequest,
    ) -> Result<Value, HarvestError>;
    async fn reject_application(
        &self,
        application_id: u64,
        request: RejectRequest,
    ) -> Result<Value, HarvestError>;

    async fn add_note_to_candidate(
        &self,
        candidate_id: u64,
        note: NoteRequest,
    ) -> Result<Value, HarvestError>;
    async fn add_note_to_application(
        &self,
        application_id: u64,
        note: NoteRequest,
    ) -> Result<Value, HarvestError>;

    async fn list_departments(&self, pagination: Pagination) -> Result<Value, HarvestError>;
    async fn list_offices(&self, pagination: Pagination) -> Result<Value, HarvestError>;
    async fn list_users(&self, query: UserQuery) -> Result<Value, HarvestError>;
}

/// A builder for creating Harvest clients.
#[derive(Debug, Default)]
pub struct HarvestClientBuilder {
    api_key: Option<String>,
    base_url: Option<String>,
    timeout: Option<Duration>,
    rate_limit: Option<RateLimitConfig>,
    retry: Option<RetryPolicy>,
}

impl HarvestClientBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from a resolved configuration.
    pub fn from_config(config: &HarvestConfig) -> Self {
        Self {
            api_key: Some(config.api_key.clone()),
            base_url: Some(config.base_url.clone()),
            timeout: Some(config.timeout),
            rate_limit: Some(config.rate_limit),
            retry: Some(config.retry),
        }
    }

    /// Sets the API key.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Sets the base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Sets the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the client-side request ceiling.
    pub fn with_rate_limit(mut self, rate_limit: RateLimitConfig) -> Self {
        self.rate_limit = Some(rate_limit);
        self
    }

    /// Sets the 429 retry bounds.
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = Some(retry);
        self
    }

    /// Creates the client, falling back to the environment for the key and
    /// base URL.
    pub fn build(self) -> Result<HarvestClient, HarvestError> {
        let api_key = self
            .api_key
            .or_else(|| std::env::var(ENV_API_KEY).ok())
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                HarvestError::Configuration(format!("{} is required", ENV_API_KEY))
            })?;
        let base_url = self
            .base_url
            .or_else(|| std::env::var(ENV_BASE_URL).ok())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let timeout = self.timeout.unwrap_or(Duration::from_secs(30));
        let rate_limit = self.rate_limit.unwrap_or_default();
        check_limits(timeout, &rate_limit)?;

        HarvestClient::new(
            &api_key,
            &base_url,
            timeout,
            rate_limit,
            self.retry.unwrap_or_default(),
        )
    }
}

/// Rejects a zero timeout, ceiling or window; any of them would make every
/// request fail or wait forever.
fn check_limits(
    timeout: Duration,
    rate_limit: &RateLimitConfig,
) -> Result<(), HarvestError> {
    if timeout.is_zero() {
        return Err(HarvestError::Configuration(
            "Request timeout must be greater than zero".to_string(),
        ));
    }
    if rate_limit.max_requests == 0 {
        return Err(HarvestError::Configuration(
            "Rate limit must allow at least one request per window".to_string(),
        ));
    }
    if rate_limit.window.is_zero() {
        return Err(HarvestError::Configuration(
            "Rate limit window must be greater than zero".to_string(),
        ));
    }
    Ok(())
}
