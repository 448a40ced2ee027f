//! Pipeline orchestration and phase sequencing

use folio_errors::{Error, InventoryError, TrackerError};
use folio_net::SnapshotStore;
use folio_progress::SnapshotTracker;
use folio_sync::{wait_for_idle, StatusSource};
use folio_types::{format_size, SnapshotManifest, SnapshotOutcome, SnapshotStep};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const CANCELLED_MESSAGE: &str = "snapshot run cancelled";

/// Pipeline timing knobs, usually derived from the agent configuration.
#[derive(Debug, Clone, Copy)]
pub struct PipelineConfig {
    /// Convergence poll cadence.
    pub poll_interval: Duration,
    /// Ceiling on the convergence wait.
    pub scan_timeout: Duration,
    /// Ceiling on one whole background run.
    pub run_timeout: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(500),
            scan_timeout: Duration::from_secs(120),
            run_timeout: Duration::from_secs(300),
        }
    }
}

impl From<&folio_config::Config> for PipelineConfig {
    fn from(config: &folio_config::Config) -> Self {
        Self {
            poll_interval: config.poll_interval(),
            scan_timeout: config.scan_timeout(),
            run_timeout: config.run_timeout(),
        }
    }
}

/// Orchestrates one snapshot run per project.
///
/// Generic over the status source and the snapshot store so tests can drive
/// it with mocks; production wires in `SyncClient` and `CloudClient`.
pub struct SnapshotPipeline<S, U> {
    tracker: SnapshotTracker,
    status: Arc<S>,
    store: Arc<U>,
    config: PipelineConfig,
}

impl<S, U> Clone for SnapshotPipeline<S, U> {
    fn clone(&self) -> Self {
        Self {
            tracker: self.tracker.clone(),
            status: Arc::clone(&self.status),
            store: Arc::clone(&self.store),
            config: self.config,
        }
    }
}

impl<S, U> SnapshotPipeline<S, U>
where
    S: StatusSource + 'static,
    U: SnapshotStore + 'static,
{
    pub fn new(
        tracker: SnapshotTracker,
        status: Arc<S>,
        store: Arc<U>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            tracker,
            status,
            store,
            config,
        }
    }

    #[must_use]
    pub fn tracker(&self) -> &SnapshotTracker {
        &self.tracker
    }

    /// Run the whole pipeline inline, driving the tracker through all six
    /// steps. The returned outcome distinguishes published, local-only and
    /// failed runs; per-phase failures are already recorded in the tracker
    /// when this returns.
    ///
    /// # Errors
    ///
    /// `TrackerError::AlreadyRunning` when a live operation exists for
    /// `project_id`; every other failure is expressed in the outcome.
    pub async fn run(
        &self,
        project_id: &str,
        access_token: &str,
        cancel: &CancellationToken,
    ) -> Result<SnapshotOutcome, TrackerError> {
        self.tracker.start(project_id)?;
        Ok(self.drive(project_id, access_token, cancel).await)
    }

    /// Start a detached background run with the configured overall ceiling.
    ///
    /// Registers the operation synchronously (so callers can reject
    /// duplicates immediately) and spawns the rest. The returned token
    /// cancels the run; the run's own timeout fires the same path.
    ///
    /// # Errors
    ///
    /// `TrackerError::AlreadyRunning` when a live operation exists for
    /// `project_id`.
    pub fn start_detached(
        &self,
        project_id: &str,
        access_token: &str,
    ) -> Result<CancellationToken, TrackerError> {
        self.tracker.start(project_id)?;

        let cancel = CancellationToken::new();
        let child = cancel.clone();
        let pipeline = self.clone();
        let project_id = project_id.to_string();
        let access_token = access_token.to_string();

        tokio::spawn(async move {
            let ceiling = pipeline.config.run_timeout;
            tokio::select! {
                outcome = pipeline.drive(&project_id, &access_token, &child) => {
                    tracing::info!(%project_id, ?outcome, "snapshot run finished");
                }
                () = tokio::time::sleep(ceiling) => {
                    child.cancel();
                    pipeline
                        .tracker
                        .fail(
                            &project_id,
                            format!("snapshot run timed out after {}s", ceiling.as_secs()),
                        )
                        .await;
                    tracing::warn!(%project_id, "snapshot run hit its overall ceiling");
                }
            }
        });

        Ok(cancel)
    }

    async fn drive(
        &self,
        project_id: &str,
        access_token: &str,
        cancel: &CancellationToken,
    ) -> SnapshotOutcome {
        // Step 1: wait for the daemon to settle.
        self.tracker
            .update(
                project_id,
                SnapshotStep::Waiting,
                1,
                0,
                0,
                "Waiting for folder scan to complete...",
            )
            .await;
        if let Err(e) = wait_for_idle(
            self.status.as_ref(),
            project_id,
            self.config.poll_interval,
            self.config.scan_timeout,
            cancel,
        )
        .await
        {
            return self.abort(project_id, "Scan completion wait failed", e).await;
        }

        // Step 2: resolve the folder path.
        self.tracker
            .update(
                project_id,
                SnapshotStep::Browsing,
                2,
                0,
                0,
                "Getting folder status...",
            )
            .await;
        let status = match self.status.folder_status(project_id).await {
            Ok(status) => status,
            Err(e) => return self.abort(project_id, "Failed to get folder status", e).await,
        };
        if status.path.as_os_str().is_empty() {
            let e = InventoryError::PathUnavailable {
                folder_id: project_id.to_string(),
            };
            return self
                .abort(project_id, "Folder path not available", e.into())
                .await;
        }

        // Step 3: collect the full-depth inventory.
        self.tracker
            .update(
                project_id,
                SnapshotStep::Browsing,
                3,
                0,
                0,
                "Browsing files in folder...",
            )
            .await;
        let root = status.path.clone();
        let files = match tokio::task::spawn_blocking(move || folio_inventory::collect(&root, 0))
            .await
        {
            Ok(Ok(files)) => files,
            Ok(Err(e)) => return self.abort(project_id, "Failed to browse files", e).await,
            Err(e) => {
                return self
                    .abort(
                        project_id,
                        "Failed to browse files",
                        Error::internal(e.to_string()),
                    )
                    .await
            }
        };

        // Step 4: aggregate and serialize.
        let manifest = SnapshotManifest::new(project_id, files, status);
        let (file_count, total_size) = (manifest.file_count, manifest.total_size);
        self.tracker
            .update(
                project_id,
                SnapshotStep::Compressing,
                4,
                file_count,
                total_size,
                format!(
                    "Processing {file_count} files ({} total)...",
                    format_size(total_size)
                ),
            )
            .await;
        let payload = match serde_json::to_vec(&manifest) {
            Ok(payload) => payload,
            Err(e) => {
                return self
                    .abort(project_id, "Failed to serialize snapshot", e.into())
                    .await
            }
        };
        tracing::debug!(project_id, bytes = payload.len(), "manifest serialized");

        // Step 5: upload with the store's retry policy.
        self.tracker
            .update(
                project_id,
                SnapshotStep::Uploading,
                5,
                file_count,
                total_size,
                "Uploading snapshot to cloud storage...",
            )
            .await;
        match self
            .store
            .publish_snapshot(project_id, &manifest, access_token, cancel)
            .await
        {
            Ok(url) => {
                self.tracker.complete(project_id, url.clone()).await;
                SnapshotOutcome::Published {
                    url,
                    file_count,
                    total_size,
                }
            }
            Err(Error::Cancelled) => {
                self.tracker.fail(project_id, CANCELLED_MESSAGE).await;
                SnapshotOutcome::Failed {
                    error: CANCELLED_MESSAGE.to_string(),
                }
            }
            Err(e) => {
                // The inventory itself is good; only the publish failed.
                let error = format!("Failed to upload snapshot: {e}");
                self.tracker.fail(project_id, error.clone()).await;
                SnapshotOutcome::LocalOnly {
                    upload_error: error,
                    file_count,
                    total_size,
                }
            }
        }
    }

    async fn abort(&self, project_id: &str, context: &str, e: Error) -> SnapshotOutcome {
        let error = if matches!(e, Error::Cancelled) {
            CANCELLED_MESSAGE.to_string()
        } else {
            format!("{context}: {e}")
        };
        self.tracker.fail(project_id, error.clone()).await;
        SnapshotOutcome::Failed { error }
    }
}
