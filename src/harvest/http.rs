use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{Client, Method, StatusCode};
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use super::client::{HarvestApi, HarvestClientBuilder, HarvestError};
use super::rate_limit::{RateLimitConfig, RateLimiter, RetryPolicy};
use super::request::{
    AdvanceRequest, ApplicationQuery, CandidatePayload, CandidateQuery, JobQuery, JobStageQuery,
    NoteRequest, Pagination, QueryParams, RejectRequest, UserQuery,
};

/// Wait applied to a 429 that carries no usable Retry-After.
pub const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(10);

/// Formats the Basic credential Harvest expects: the key as user name and an
/// empty password.
pub fn basic_auth_value(api_key: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{}:", api_key)))
}

/// Reads Retry-After as whole seconds.
pub fn retry_after(headers: &HeaderMap) -> Duration {
    headers
        .get(header::RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or(DEFAULT_RETRY_AFTER)
}

/// HTTP client for the Harvest API.
///
/// Cloning is cheap and clones share the rate limiter.
#[derive(Debug, Clone)]
pub struct HarvestClient {
    client: Client,
    base_url: String,
    limiter: Arc<RateLimiter>,
    retry: RetryPolicy,
}

impl HarvestClient {
    /// Creates a new builder.
    pub fn builder() -> HarvestClientBuilder {
        HarvestClientBuilder::new()
    }

    pub(crate) fn new(
        api_key: &str,
        base_url: &str,
        timeout: Duration,
        rate_limit: RateLimitConfig,
        retry: RetryPolicy,
    ) -> Result<Self, HarvestError> {
        let mut auth = HeaderValue::from_str(&basic_auth_value(api_key)).map_err(|e| {
            HarvestError::Configuration(format!("Invalid API key: {}", e))
        })?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, auth);
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| HarvestError::Configuration(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            limiter: Arc::new(RateLimiter::new(rate_limit)),
            retry,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn rate_limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'))
    }

    /// Performs one logical API call.
    ///
    /// Each attempt passes through the rate limiter. A 429 is retried with
    /// the identical request after its Retry-After delay until the retry
    /// policy runs out.
    pub async fn send(
        &self,
        method: Method,
        endpoint: &str,
        query: Option<&QueryParams>,
        body: Option<&Value>,
    ) -> Result<Value, HarvestError> {
        let url = self.url(endpoint);
        let mut retries = 0u32;
        let mut waited = Duration::ZERO;

        loop {
            self.limiter.acquire().await;

            let mut request = self.client.request(method.clone(), &url);
            if let Some(query) = query {
                request = request.query(query.as_slice());
            }
            if let Some(body) = body {
                request = request.json(body);
            }

            debug!(%method, endpoint, attempt = retries + 1, "Sending request to Harvest");
            let response = request.send().await?;
            let status = response.status();

            if status == StatusCode::TOO_MANY_REQUESTS {
                let delay = retry_after(response.headers());
                if !self.retry.allows(retries, waited, delay) {
                    warn!(%method, endpoint, attempts = retries + 1, "Giving up after repeated 429 responses");
                    return Err(HarvestError::RetriesExhausted {
                        attempts: retries + 1,
                        waited,
                    });
                }
                warn!(%method, endpoint, delay_secs = delay.as_secs(), "Rate limited by Harvest, retrying");
                tokio::time::sleep(delay).await;
                retries += 1;
                waited += delay;
                continue;
            }

            if status.is_client_error() || status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                debug!(%method, endpoint, status = status.as_u16(), "Harvest returned an error");
                return Err(HarvestError::Api {
                    status: status.as_u16(),
                    body,
                });
            }

            if status == StatusCode::NO_CONTENT {
                return Ok(Value::Object(Map::new()));
            }

            let text = response.text().await?;
            return serde_json::from_str(&text)
                .map_err(|e| HarvestError::InvalidResponse(format!("{}: {}", e, text)));
        }
    }

    async fn get(&self, endpoint: &str, query: Option<QueryParams>) -> Result<Value, HarvestError> {
        self.send(Method::GET, endpoint, query.as_ref(), None).await
    }

    async fn write<B: Serialize>(
        &self,
        method: Method,
        endpoint: &str,
        body: &B,
    ) -> Result<Value, HarvestError> {
        let body = serde_json::to_value(body)?;
        self.send(method, endpoint, None, Some(&body)).await
    }
}

#[async_trait]
impl HarvestApi for HarvestClient {
    async fn list_jobs(&self, query: JobQuery) -> Result<Value, HarvestError> {
        self.get("jobs", Some(query.to_query())).await
    }

    async fn get_job(&self, job_id: u64) -> Result<Value, HarvestError> {
        self.get(&format!("jobs/{}", job_id), None).await
    }

    async fn list_job_stages(&self, query: JobStageQuery) -> Result<Value, HarvestError> {
        self.get(&query.endpoint(), Some(query.to_query())).await
    }

    async fn get_job_stage(&self, job_stage_id: u64) -> Result<Value, HarvestError> {
        self.get(&format!("job_stages/{}", job_stage_id), None).await
    }

    async fn list_candidates(&self, query: CandidateQuery) -> Result<Value, HarvestError> {
        self.get("candidates", Some(query.to_query())).await
    }

    async fn get_candidate(&self, candidate_id: u64) -> Result<Value, HarvestError> {
        self.get(&format!("candidates/{}", candidate_id), None).await
    }

    async fn create_candidate(&self, candidate: CandidatePayload) -> Result<Value, HarvestError> {
        self.write(Method::POST, "candidates", &candidate).await
    }

    async fn update_candidate(
        &self,
        candidate_id: u64,
        candidate: CandidatePayload,
    ) -> Result<Value, HarvestError> {
        self.write(Method::PATCH, &format!("candidates/{}", candidate_id), &candidate)
            .await
    }

    async fn list_applications(&self, query: ApplicationQuery) -> Result<Value, HarvestError> {
        self.get("applications", Some(query.to_query())).await
    }

    async fn get_application(&self, application_id: u64) -> Result<Value, HarvestError> {
        self.get(&format!("applications/{}", application_id), None)
            .await
    }

    async fn advance_application(
        &self,
        application_id: u64,
        request: AdvanceRequest,
    ) -> Result<Value, HarvestError> {
        self.write(
            Method::POST,
            &format!("applications/{}/advance", application_id),
            &request,
        )
        .await
    }

    async fn reject_application(
        &self,
        application_id: u64,
        request: RejectRequest,
    ) -> Result<Value, HarvestError> {
        self.write(
            Method::POST,
            &format!("applications/{}/reject", application_id),
            &request,
        )
        .await
    }

    async fn add_note_to_candidate(
        &self,
        candidate_id: u64,
        note: NoteRequest,
    ) -> Result<Value, HarvestError> {
        self.write(
            Method::POST,
            &format!("candidates/{}/activity_feed/notes", candidate_id),
            &note,
        )
        .await
    }

    async fn add_note_to_application(
        &self,
        application_id: u64,
        note: NoteRequest,
    ) -> Result<Value, HarvestError> {
        self.write(
            Method::POST,
            &format!("applications/{}/notes", application_id),
            &note,
        )
        .await
    }

    async fn list_departments(&self, pagination: Pagination) -> Result<Value, HarvestError> {
        self.get("departments", Some(pagination.to_query())).await
    }

    async fn list_offices(&self, pagination: Pagination) -> Result<Value, HarvestError> {
        self.get("offices", Some(pagination.to_query())).await
    }

    async fn list_users(&self, query: UserQuery) -> Result<Value, HarvestError> {
        self.get("users", Some(query.to_query())).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_auth_encodes_key_with_empty_password() {
        assert_eq!(basic_auth_value("test-key"), "Basic dGVzdC1rZXk6");
        assert_eq!(basic_auth_value("abc"), "Basic YWJjOg==");
    }

    #[test]
    fn test_retry_after_parsing() {
        let mut headers = HeaderMap::new();
        assert_eq!(retry_after(&headers), DEFAULT_RETRY_AFTER);

        headers.insert(header::RETRY_AFTER, HeaderValue::from_static("3"));
        assert_eq!(retry_after(&headers), Duration::from_secs(3));

        headers.insert(
            header::RETRY_AFTER,
            HeaderValue::from_static("Wed, 21 Oct 2015 07:28:00 GMT"),
        );
        assert_eq!(retry_after(&headers), DEFAULT_RETRY_AFTER);
    }

    #[test]
    fn test_base_url_is_normalized() {
        let client = HarvestClient::builder()
            .with_api_key("key")
            .with_base_url("https://example.test/v1/")
            .build()
            .unwrap();

        assert_eq!(client.base_url(), "https://example.test/v1");
        assert_eq!(client.url("jobs/1"), "https://example.test/v1/jobs/1");
    }

    #[test]
    fn test_zero_limits_are_rejected() {
        let builder = || HarvestClient::builder().with_api_key("key");

        let err = builder().with_timeout(Duration::ZERO).build().unwrap_err();
        assert!(err.to_string().contains("timeout"));

        let err = builder()
            .with_rate_limit(RateLimitConfig {
                max_requests: 0,
                window: Duration::from_secs(10),
            })
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("at least one request"));

        let err = builder()
            .with_rate_limit(RateLimitConfig {
                max_requests: 50,
                window: Duration::ZERO,
            })
            .build()
            .unwrap_err();
        assert!(matches!(err, HarvestError::Configuration(_)));
        assert!(err.to_string().contains("window"));
    }

    #[test]
    fn test_blank_api_key_is_rejected() {
        let err = HarvestClient::builder().with_api_key("  ").build().unwrap_err();

        assert!(matches!(err, HarvestError::Configuration(_)));
    }
}
