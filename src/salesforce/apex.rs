//! Apex REST client for the training-reset service.
//!
//! This module provides functionality to:
//! - Submit bulk-delete jobs for a Salesforce object
//! - Check whether a set of delete jobs has finished
//! - Upsert an object's training records from a named static resource
//!
//! # Security
//!
//! - Auth headers and tokens are never logged
//! - Request and response bodies are never logged
//! - Only HTTP method, path, and status codes are logged

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::info;
use url::Url;

use crate::error::AppError;
use crate::reset::backend::ResetBackend;
use crate::salesforce::redact_id;

// ─────────────────────────────────────────────────────────────────────────────
// Constants
// ─────────────────────────────────────────────────────────────────────────────

/// Endpoint that submits one bulk-delete job per call.
const DELETES_PATH: &str = "/services/apexrest/training/reset/deletes";

/// Endpoint that answers whether every job in a set has completed.
const STATUS_PATH: &str = "/services/apexrest/training/reset/deletes/status";

/// Endpoint that restores one object's records from a static resource.
const UPSERTS_PATH: &str = "/services/apexrest/training/reset/upserts";

// ─────────────────────────────────────────────────────────────────────────────
// Internal Wire Types
// ─────────────────────────────────────────────────────────────────────────────

/// Request body for submitting a delete job.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SubmitDeleteRequest<'a> {
    s_object_api_name: &'a str,
}

/// Response body for a submitted delete job.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubmitDeleteResponse {
    job_id: String,
}

/// Request body for the job-status check.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct JobStatusRequest<'a> {
    job_ids: &'a [String],
}

/// Response body for the job-status check. The service answers for the whole
/// set at once; there is no per-job granularity.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JobStatusResponse {
    all_complete: bool,
}

/// Request body for restoring an object from its snapshot.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UpsertRequest<'a> {
    s_object_api_name: &'a str,
    static_resource_name: &'a str,
}

/// Salesforce API error response format.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SalesforceError {
    message: String,
    error_code: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// ApexResetClient
// ─────────────────────────────────────────────────────────────────────────────

/// Client for the Apex REST reset service.
///
/// Provides methods to submit delete jobs, check their completion, and restore
/// training records from static-resource snapshots.
#[derive(Clone)]
pub struct ApexResetClient {
    /// Shared HTTP client.
    client: Arc<Client>,
    /// Base instance URL (e.g., "https://na1.salesforce.com").
    base_url: Url,
    /// Access token for authentication.
    access_token: SecretString,
}

impl ApexResetClient {
    /// Creates a new Apex REST reset client.
    ///
    /// # Arguments
    ///
    /// * `client` - Shared HTTP client
    /// * `base_url` - Salesforce instance URL
    /// * `access_token` - OAuth access token
    pub fn new(client: Arc<Client>, base_url: Url, access_token: SecretString) -> Self {
        Self {
            client,
            base_url,
            access_token,
        }
    }

    /// Submits a bulk-delete job for every record of one object.
    ///
    /// # Arguments
    ///
    /// * `s_object` - The Salesforce object API name (e.g., "Task")
    ///
    /// # Returns
    ///
    /// The job ID on success.
    ///
    /// # Errors
    ///
    /// - `AppError::SalesforceError` - API error
    /// - `AppError::RateLimited` - Rate limit exceeded
    /// - `AppError::ConnectionFailed` - Network error
    pub async fn submit_delete_job(&self, s_object: &str) -> Result<String, AppError> {
        let url = self.build_endpoint_url(DELETES_PATH)?;

        let request_body = SubmitDeleteRequest {
            s_object_api_name: s_object,
        };

        info!("[APEX] POST {} (delete job for {})", DELETES_PATH, s_object);

        let response = self
            .client
            .post(url)
            .bearer_auth(self.access_token.expose_secret())
            .json(&request_body)
            .send()
            .await
            .map_err(|e| AppError::ConnectionFailed(format!("Delete job submission failed: {}", e)))?;

        let status = response.status();
        info!("[APEX] POST {} -> {}", DELETES_PATH, status.as_u16());

        if !status.is_success() {
            return Err(parse_error_response(response, status).await);
        }

        let job: SubmitDeleteResponse = response.json().await.map_err(|e| {
            AppError::SalesforceError(format!("Failed to parse delete job response: {}", e))
        })?;

        info!(
            "[APEX] Delete job {} submitted for {}",
            redact_id(&job.job_id),
            s_object
        );

        Ok(job.job_id)
    }

    /// Checks whether every job in the set has completed.
    ///
    /// The identifier set is passed through as-is; the service treats it as a
    /// set, so ordering and duplicates do not matter.
    ///
    /// # Arguments
    ///
    /// * `job_ids` - Job identifiers from prior `submit_delete_job` calls
    ///
    /// # Returns
    ///
    /// `true` once every job in the set has completed.
    pub async fn check_job_statuses(&self, job_ids: &[String]) -> Result<bool, AppError> {
        let url = self.build_endpoint_url(STATUS_PATH)?;

        let request_body = JobStatusRequest { job_ids };

        info!("[APEX] POST {} ({} jobs)", STATUS_PATH, job_ids.len());

        let response = self
            .client
            .post(url)
            .bearer_auth(self.access_token.expose_secret())
            .json(&request_body)
            .send()
            .await
            .map_err(|e| AppError::ConnectionFailed(format!("Job status check failed: {}", e)))?;

        let status = response.status();
        info!("[APEX] POST {} -> {}", STATUS_PATH, status.as_u16());

        if !status.is_success() {
            return Err(parse_error_response(response, status).await);
        }

        let body: JobStatusResponse = response.json().await.map_err(|e| {
            AppError::SalesforceError(format!("Failed to parse job status response: {}", e))
        })?;

        Ok(body.all_complete)
    }

    /// Restores one object's training records from a static resource.
    ///
    /// # Arguments
    ///
    /// * `s_object` - The Salesforce object API name (e.g., "Account")
    /// * `static_resource` - The snapshot resource name (e.g., "Training_Tasks")
    pub async fn upsert_from_snapshot(
        &self,
        s_object: &str,
        static_resource: &str,
    ) -> Result<(), AppError> {
        let url = self.build_endpoint_url(UPSERTS_PATH)?;

        let request_body = UpsertRequest {
            s_object_api_name: s_object,
            static_resource_name: static_resource,
        };

        info!(
            "[APEX] POST {} ({} from {})",
            UPSERTS_PATH, s_object, static_resource
        );

        let response = self
            .client
            .post(url)
            .bearer_auth(self.access_token.expose_secret())
            .json(&request_body)
            .send()
            .await
            .map_err(|e| AppError::ConnectionFailed(format!("Upsert request failed: {}", e)))?;

        let status = response.status();
        info!("[APEX] POST {} -> {}", UPSERTS_PATH, status.as_u16());

        if !status.is_success() {
            return Err(parse_error_response(response, status).await);
        }

        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // URL Builders
    // ─────────────────────────────────────────────────────────────────────────

    /// Joins an endpoint path onto the instance URL.
    fn build_endpoint_url(&self, path: &str) -> Result<Url, AppError> {
        self.base_url
            .join(path)
            .map_err(|e| AppError::Internal(format!("Failed to build endpoint URL: {}", e)))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Error Handling
// ─────────────────────────────────────────────────────────────────────────────

/// Parses an error response and maps to appropriate AppError.
async fn parse_error_response(
    response: reqwest::Response,
    status: reqwest::StatusCode,
) -> AppError {
    // Check for rate limiting
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        let retry_after = response
            .headers()
            .get("Retry-After")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok());
        return AppError::RateLimited {
            retry_after_secs: retry_after,
        };
    }

    // Try to parse Salesforce error response
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| String::from("Unable to read error body"));

    if let Ok(errors) = serde_json::from_str::<Vec<SalesforceError>>(&body) {
        if let Some(first_error) = errors.first() {
            if first_error.error_code == "REQUEST_LIMIT_EXCEEDED" {
                return AppError::RateLimited {
                    retry_after_secs: None,
                };
            }

            return AppError::SalesforceError(format!(
                "[{}] {}",
                first_error.error_code, first_error.message
            ));
        }
    }

    // Fallback to generic error
    AppError::SalesforceError(format!(
        "HTTP {} - {}",
        status.as_u16(),
        status.canonical_reason().unwrap_or("Unknown error")
    ))
}

// ─────────────────────────────────────────────────────────────────────────────
// ResetBackend
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl ResetBackend for ApexResetClient {
    async fn submit_delete(&self, s_object: &str) -> Result<String, AppError> {
        self.submit_delete_job(s_object).await
    }

    async fn poll_jobs(&self, job_ids: &[String]) -> Result<bool, AppError> {
        self.check_job_statuses(job_ids).await
    }

    async fn submit_upsert(&self, s_object: &str, static_resource: &str) -> Result<(), AppError> {
        self.upsert_from_snapshot(s_object, static_resource).await
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
