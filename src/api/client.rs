//! Tracker API client implementation.
//!
//! This module provides the HTTP client for the issue tracker API. It handles
//! request/response processing, error mapping, and retry logic for transient
//! failures. The [`IssueApi`] trait is the seam the orchestration layers
//! depend on, so they can be exercised against an in-memory fake in tests.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client, Method, RequestBuilder, Response, StatusCode};
use tracing::{debug, warn};

use super::error::{ApiError, Result};
use super::types::{Assignee, AssigneeList, Issue, IssuePage, IssueUpdate, NewIssue};
use crate::config::Profile;

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Maximum number of attempts for transient failures.
const MAX_RETRIES: u32 = 3;

/// Base delay between retries in milliseconds.
const RETRY_DELAY_MS: u64 = 1000;

/// The operations the tracker API exposes.
///
/// Implemented by [`TrackerClient`] over HTTP and by in-memory fakes in
/// tests. List parameters arrive pre-built (absent filters already omitted)
/// so the client stays a dumb transport.
#[async_trait]
pub trait IssueApi: Send + Sync {
    /// `GET /issues` with the given query parameters.
    async fn list_issues(&self, params: &[(&'static str, String)]) -> Result<IssuePage>;

    /// `GET /issues/{id}`.
    async fn get_issue(&self, id: i64) -> Result<Issue>;

    /// `POST /issues`.
    async fn create_issue(&self, body: &NewIssue) -> Result<Issue>;

    /// `PUT /issues/{id}`.
    async fn update_issue(&self, id: i64, body: &IssueUpdate) -> Result<Issue>;

    /// `POST /issues/{id}/verify?verifier_id=<id>`.
    async fn verify_issue(&self, id: i64, verifier_id: i64) -> Result<Issue>;

    /// `GET /assignees` (full roster).
    async fn assignees(&self) -> Result<Vec<Assignee>>;

    /// `GET /assignees/available` (eligible-today subset).
    async fn available_assignees(&self) -> Result<Vec<Assignee>>;

    /// `GET /health`.
    async fn health(&self) -> Result<()>;
}

/// The HTTP tracker client.
#[derive(Debug, Clone)]
pub struct TrackerClient {
    /// The HTTP client.
    client: Client,
    /// The base URL for the tracker instance.
    base_url: String,
}

impl TrackerClient {
    /// Create a new client from a profile.
    pub fn new(profile: &Profile) -> Result<Self> {
        Self::with_base_url(&profile.url)
    }

    /// Create a new client for an explicit base URL.
    pub fn with_base_url(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .map_err(ApiError::Network)?;

        Ok(Self {
            client,
            base_url: normalize_base_url(base_url),
        })
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Perform a GET request with retry for transient failures.
    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&'static str, String)],
    ) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        let mut attempts = 0;

        loop {
            attempts += 1;
            debug!(%url, attempt = attempts, "GET request");

            let request = self.client.get(&url).query(params);
            match self.execute::<T>(request).await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && attempts < MAX_RETRIES => {
                    let delay = RETRY_DELAY_MS * 2u64.pow(attempts - 1);
                    warn!(
                        "Request failed (attempt {}), retrying in {}ms: {}",
                        attempts, delay, e
                    );
                    tokio::time::sleep(Duration::from_millis(delay)).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Perform a mutating request with a JSON body.
    ///
    /// Mutations are never retried; a timed-out create could otherwise be
    /// submitted twice.
    async fn send_json<T: serde::de::DeserializeOwned, B: serde::Serialize>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, %method, "mutation request");

        let request = self.client.request(method, &url).json(body);
        self.execute(request).await
    }

    /// Execute one request and parse the response.
    async fn execute<T: serde::de::DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = request
            .header(header::ACCEPT, "application/json")
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Handle the HTTP response, checking for errors and parsing JSON.
    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        response: Response,
    ) -> Result<T> {
        let status = response.status();
        let url = response.url().to_string();

        if status.is_success() {
            response
                .json::<T>()
                .await
                .map_err(|e| ApiError::InvalidResponse(format!("Failed to parse response: {}", e)))
        } else {
            let error_body = response.text().await.unwrap_or_default();
            debug!("Error response body: {}", error_body);

            Err(error_from_response(status, &url, &error_body))
        }
    }
}

#[async_trait]
impl IssueApi for TrackerClient {
    async fn list_issues(&self, params: &[(&'static str, String)]) -> Result<IssuePage> {
        let page: IssuePage = self.get_json("/issues", params).await?;
        debug!(
            "Fetched {} issues (total: {})",
            page.issues.len(),
            page.total_count
        );
        Ok(page)
    }

    async fn get_issue(&self, id: i64) -> Result<Issue> {
        self.get_json(&format!("/issues/{}", id), &[])
            .await
            .map_err(|e| {
                if matches!(e, ApiError::NotFound(_)) {
                    ApiError::NotFound(format!("Issue {} not found", id))
                } else {
                    e
                }
            })
    }

    async fn create_issue(&self, body: &NewIssue) -> Result<Issue> {
        self.send_json(Method::POST, "/issues", body).await
    }

    async fn update_issue(&self, id: i64, body: &IssueUpdate) -> Result<Issue> {
        self.send_json(Method::PUT, &format!("/issues/{}", id), body)
            .await
    }

    async fn verify_issue(&self, id: i64, verifier_id: i64) -> Result<Issue> {
        let url = format!("{}/issues/{}/verify", self.base_url, id);
        debug!(%url, verifier_id, "verify request");

        let request = self
            .client
            .post(&url)
            .query(&[("verifier_id", verifier_id.to_string())]);
        self.execute(request).await
    }

    async fn assignees(&self) -> Result<Vec<Assignee>> {
        let list: AssigneeList = self.get_json("/assignees", &[]).await?;
        Ok(list.assignees)
    }

    async fn available_assignees(&self) -> Result<Vec<Assignee>> {
        let list: AssigneeList = self.get_json("/assignees/available", &[]).await?;
        Ok(list.assignees)
    }

    async fn health(&self) -> Result<()> {
        let _: serde_json::Value = self.get_json("/health", &[]).await.map_err(|e| match e {
            ApiError::Network(_) | ApiError::ConnectionFailed(_) => {
                ApiError::ConnectionFailed(format!("Cannot reach {}: {}", self.base_url, e))
            }
            other => other,
        })?;
        Ok(())
    }
}

/// Create an appropriate error from an HTTP error response.
///
/// The server reports failures as JSON with a `detail` field; fold that
/// into the error message when present.
fn error_from_response(status: StatusCode, url: &str, body: &str) -> ApiError {
    let context = if body.is_empty() {
        url.to_string()
    } else {
        serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|json| {
                json.get("detail")
                    .and_then(|d| d.as_str().map(str::to_string))
            })
            .unwrap_or_else(|| url.to_string())
    };

    ApiError::from_status(status, &context)
}

/// Normalize the base URL by removing trailing slashes.
fn normalize_base_url(url: &str) -> String {
    let url = url.trim_end_matches('/');

    if !url.starts_with("https://") && !url.contains("localhost") && !url.contains("127.0.0.1") {
        warn!("URL does not use HTTPS: {}", url);
    }

    url.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_base_url_removes_trailing_slash() {
        assert_eq!(
            normalize_base_url("http://localhost:8000/"),
            "http://localhost:8000"
        );
    }

    #[test]
    fn test_normalize_base_url_handles_multiple_slashes() {
        assert_eq!(
            normalize_base_url("http://localhost:8000///"),
            "http://localhost:8000"
        );
    }

    #[test]
    fn test_normalize_base_url_preserves_path() {
        assert_eq!(
            normalize_base_url("https://tracker.example.com/api/"),
            "https://tracker.example.com/api"
        );
    }

    #[test]
    fn test_error_from_response_extracts_detail() {
        let err = error_from_response(
            StatusCode::NOT_FOUND,
            "http://localhost:8000/issues/42",
            r#"{"detail": "Issue not found"}"#,
        );
        match err {
            ApiError::NotFound(msg) => assert_eq!(msg, "Issue not found"),
            _ => panic!("Expected NotFound error"),
        }
    }

    #[test]
    fn test_error_from_response_falls_back_to_url() {
        let err = error_from_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "http://localhost:8000/issues",
            "not json",
        );
        match err {
            ApiError::ServerError(msg) => assert!(msg.contains("/issues")),
            _ => panic!("Expected ServerError"),
        }
    }

    #[test]
    fn test_client_from_base_url() {
        let client = TrackerClient::with_base_url("http://localhost:8000/").unwrap();
        assert_eq!(client.base_url(), "http://localhost:8000");
    }
}
