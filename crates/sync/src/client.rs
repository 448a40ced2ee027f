//! HTTP client for the sync daemon's REST API

use crate::StatusSource;
use folio_config::DaemonConfig;
use folio_errors::{Error, SyncError};
use folio_types::FolderStatus;
use std::time::Duration;

/// Client for the daemon's local REST API, authenticated by API key.
#[derive(Debug, Clone)]
pub struct SyncClient {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl SyncClient {
    /// Create a client from daemon configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(config: &DaemonConfig) -> Result<Self, Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| SyncError::StatusUnavailable(e.to_string()))?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            client,
        })
    }

    /// Ask the daemon to rescan a folder, kicking off a new scan cycle.
    ///
    /// # Errors
    ///
    /// Returns `SyncError` if the daemon rejects the request or is
    /// unreachable.
    pub async fn rescan(&self, folder_id: &str) -> Result<(), Error> {
        let url = format!("{}/rest/db/scan?folder={folder_id}", self.base_url);
        let response = self
            .client
            .post(&url)
            .header("X-API-Key", &self.api_key)
            .send()
            .await
            .map_err(|e| SyncError::StatusUnavailable(e.to_string()))?;

        map_status(folder_id, &response)?;
        Ok(())
    }

    async fn get_folder_status(&self, folder_id: &str) -> Result<FolderStatus, Error> {
        let url = format!("{}/rest/db/status?folder={folder_id}", self.base_url);
        let response = self
            .client
            .get(&url)
            .header("X-API-Key", &self.api_key)
            .send()
            .await
            .map_err(|e| SyncError::StatusUnavailable(e.to_string()))?;

        map_status(folder_id, &response)?;

        response
            .json::<FolderStatus>()
            .await
            .map_err(|e| SyncError::StatusUnavailable(format!("invalid status body: {e}")).into())
    }
}

impl StatusSource for SyncClient {
    async fn folder_status(&self, folder_id: &str) -> Result<FolderStatus, Error> {
        self.get_folder_status(folder_id).await
    }
}

fn map_status(folder_id: &str, response: &reqwest::Response) -> Result<(), Error> {
    let status = response.status();
    if status == reqwest::StatusCode::NOT_FOUND {
        return Err(SyncError::FolderNotFound {
            folder_id: folder_id.to_string(),
        }
        .into());
    }
    if !status.is_success() {
        return Err(SyncError::StatusUnavailable(format!("daemon returned {status}")).into());
    }
    Ok(())
}
