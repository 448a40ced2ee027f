#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Configuration management for the folio agent
//!
//! This crate handles loading and merging configuration from:
//! - Default values (hard-coded)
//! - Configuration file (TOML)
//! - Environment variables
//! - CLI flags (applied by the binary)

use folio_errors::{ConfigError, Error};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tokio::fs;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub agent: AgentConfig,

    #[serde(default)]
    pub daemon: DaemonConfig,

    #[serde(default)]
    pub cloud: CloudConfig,

    #[serde(default)]
    pub snapshot: SnapshotConfig,
}

/// HTTP surface of the agent itself
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Sync daemon collaborator (status source)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonConfig {
    #[serde(default = "default_daemon_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_key: String,
    /// Poll cadence of the convergence waiter, milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Ceiling on waiting for a folder scan to settle, seconds.
    #[serde(default = "default_scan_timeout")]
    pub scan_timeout_secs: u64,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

/// Cloud store collaborator (upload target)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloudConfig {
    #[serde(default = "default_cloud_url")]
    pub base_url: String,
    #[serde(default = "default_upload_timeout")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_retries")]
    pub max_attempts: u32,
    /// First backoff wait; doubles each retry.
    #[serde(default = "default_backoff_secs")]
    pub initial_backoff_secs: u64,
}

/// Snapshot pipeline tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotConfig {
    /// Depth limit for the file listing surface; 0 = unlimited.
    #[serde(default = "default_browse_depth")]
    pub browse_depth: usize,
    /// Ceiling on one whole background run, seconds.
    #[serde(default = "default_run_timeout")]
    pub run_timeout_secs: u64,
    /// Per-subscriber progress buffer capacity.
    #[serde(default = "default_subscriber_buffer")]
    pub subscriber_buffer: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            base_url: default_daemon_url(),
            api_key: String::new(),
            poll_interval_ms: default_poll_interval_ms(),
            scan_timeout_secs: default_scan_timeout(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl Default for CloudConfig {
    fn default() -> Self {
        Self {
            base_url: default_cloud_url(),
            request_timeout_secs: default_upload_timeout(),
            max_attempts: default_retries(),
            initial_backoff_secs: default_backoff_secs(),
        }
    }
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            browse_depth: default_browse_depth(),
            run_timeout_secs: default_run_timeout(),
            subscriber_buffer: default_subscriber_buffer(),
        }
    }
}

// Default value functions for serde

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8384
}

fn default_daemon_url() -> String {
    "http://127.0.0.1:8384".to_string()
}

fn default_poll_interval_ms() -> u64 {
    500
}

fn default_scan_timeout() -> u64 {
    120
}

fn default_request_timeout() -> u64 {
    10
}

fn default_cloud_url() -> String {
    "http://127.0.0.1:4000".to_string()
}

fn default_upload_timeout() -> u64 {
    30
}

fn default_retries() -> u32 {
    3
}

fn default_backoff_secs() -> u64 {
    1
}

fn default_browse_depth() -> usize {
    5
}

fn default_run_timeout() -> u64 {
    300
}

fn default_subscriber_buffer() -> usize {
    16
}

impl Config {
    /// Load configuration from file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if the file contents
    /// contain invalid TOML syntax that cannot be parsed.
    pub async fn load_from_file(path: &Path) -> Result<Self, Error> {
        let contents = fs::read_to_string(path)
            .await
            .map_err(|e| ConfigError::ReadFailed {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;

        toml::from_str(&contents)
            .map_err(|e| ConfigError::Invalid(e.to_string()))
            .map_err(Into::into)
    }

    /// Load configuration from an optional path, falling back to defaults
    /// when no file is given or the default location does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if an explicitly named file cannot be read or parsed.
    pub async fn load_or_default(path: Option<&Path>) -> Result<Self, Error> {
        match path {
            Some(path) => Self::load_from_file(path).await,
            None => Ok(Self::default()),
        }
    }

    /// Merge environment variables over the loaded values.
    ///
    /// # Errors
    ///
    /// Returns an error if a numeric variable fails to parse.
    pub fn merge_env(&mut self) -> Result<(), Error> {
        if let Ok(url) = std::env::var("FOLIO_DAEMON_URL") {
            self.daemon.base_url = url;
        }
        if let Ok(key) = std::env::var("FOLIO_DAEMON_API_KEY") {
            self.daemon.api_key = key;
        }
        if let Ok(url) = std::env::var("FOLIO_CLOUD_URL") {
            self.cloud.base_url = url;
        }
        if let Ok(port) = std::env::var("FOLIO_PORT") {
            self.agent.port = port.parse().map_err(|_| ConfigError::InvalidValue {
                field: "FOLIO_PORT".to_string(),
                message: format!("not a port number: {port}"),
            })?;
        }
        Ok(())
    }

    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.daemon.poll_interval_ms)
    }

    #[must_use]
    pub fn scan_timeout(&self) -> Duration {
        Duration::from_secs(self.daemon.scan_timeout_secs)
    }

    #[must_use]
    pub fn run_timeout(&self) -> Duration {
        Duration::from_secs(self.snapshot.run_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_policy() {
        let config = Config::default();
        assert_eq!(config.daemon.poll_interval_ms, 500);
        assert_eq!(config.daemon.scan_timeout_secs, 120);
        assert_eq!(config.cloud.max_attempts, 3);
        assert_eq!(config.cloud.initial_backoff_secs, 1);
        assert_eq!(config.snapshot.run_timeout_secs, 300);
    }

    #[tokio::test]
    async fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("folio.toml");
        std::fs::write(
            &path,
            "[daemon]\nbase_url = \"http://10.0.0.2:8384\"\napi_key = \"secret\"\n",
        )
        .unwrap();

        let config = Config::load_from_file(&path).await.unwrap();
        assert_eq!(config.daemon.base_url, "http://10.0.0.2:8384");
        assert_eq!(config.daemon.api_key, "secret");
        assert_eq!(config.cloud.max_attempts, 3);
    }

    #[tokio::test]
    async fn invalid_toml_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("folio.toml");
        std::fs::write(&path, "[daemon\nbase_url = 1").unwrap();

        assert!(Config::load_from_file(&path).await.is_err());
    }
}
