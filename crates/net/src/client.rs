//! HTTP client for the cloud API

use crate::{retry, RetryPolicy, SnapshotStore};
use folio_config::CloudConfig;
use folio_errors::{Error, NetworkError};
use folio_types::SnapshotManifest;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Client for the remote metadata/object store, authenticated per-request
/// with a bearer token.
#[derive(Debug, Clone)]
pub struct CloudClient {
    base_url: String,
    client: reqwest::Client,
    policy: RetryPolicy,
}

impl CloudClient {
    /// Create a client from cloud configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(config: &CloudConfig) -> Result<Self, Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent(format!("folio/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| NetworkError::RequestFailed(e.to_string()))?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
            policy: RetryPolicy::from(config),
        })
    }

    #[must_use]
    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// One upload attempt, no retry. Classification happens here, at the
    /// point the failure is observed.
    ///
    /// # Errors
    ///
    /// `NetworkError` describing the transport or HTTP failure, or an
    /// invalid response body.
    pub async fn upload_once(
        &self,
        project_id: &str,
        manifest: &SnapshotManifest,
        access_token: &str,
    ) -> Result<String, Error> {
        let url = format!("{}/projects/{project_id}/snapshot", self.base_url);
        let body = serde_json::json!({
            "snapshot": manifest,
            "syncStatus": "completed",
        });

        let response = self
            .client
            .post(&url)
            .bearer_auth(access_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| classify_transport(&url, &e))?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let seconds = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(1);
            return Err(NetworkError::RateLimited { seconds }.into());
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(NetworkError::HttpError {
                status: status.as_u16(),
                message,
            }
            .into());
        }

        let result: serde_json::Value = response
            .json()
            .await
            .map_err(|e| NetworkError::InvalidResponse(e.to_string()))?;

        result
            .get("snapshotUrl")
            .and_then(serde_json::Value::as_str)
            .map(ToString::to_string)
            .ok_or_else(|| NetworkError::InvalidResponse("no snapshot URL in response".to_string()).into())
    }
}

impl SnapshotStore for CloudClient {
    async fn publish_snapshot(
        &self,
        project_id: &str,
        manifest: &SnapshotManifest,
        access_token: &str,
        cancel: &CancellationToken,
    ) -> Result<String, Error> {
        retry::with_retry(self.policy, cancel, |_| {
            self.upload_once(project_id, manifest, access_token)
        })
        .await
    }
}

fn classify_transport(url: &str, e: &reqwest::Error) -> NetworkError {
    if e.is_timeout() {
        NetworkError::Timeout {
            url: url.to_string(),
        }
    } else if e.is_connect() {
        NetworkError::ConnectionRefused(e.to_string())
    } else {
        NetworkError::RequestFailed(e.to_string())
    }
}
