//! Shared application state

use folio_config::Config;
use folio_errors::Error;
use folio_net::CloudClient;
use folio_progress::SnapshotTracker;
use folio_snapshot::{PipelineConfig, SnapshotPipeline};
use folio_sync::SyncClient;
use std::sync::Arc;

/// Everything the HTTP handlers need, constructed once at startup.
pub struct AppState {
    pub config: Config,
    pub tracker: SnapshotTracker,
    pub sync: SyncClient,
    pub pipeline: SnapshotPipeline<SyncClient, CloudClient>,
}

impl AppState {
    /// Wire the tracker, clients and pipeline together from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error when either HTTP client cannot be built.
    pub fn new(config: Config) -> Result<Self, Error> {
        let tracker = SnapshotTracker::with_buffer(config.snapshot.subscriber_buffer);
        let sync = SyncClient::new(&config.daemon)?;
        let cloud = CloudClient::new(&config.cloud)?;
        let pipeline = SnapshotPipeline::new(
            tracker.clone(),
            Arc::new(sync.clone()),
            Arc::new(cloud),
            PipelineConfig::from(&config),
        );

        Ok(Self {
            config,
            tracker,
            sync,
            pipeline,
        })
    }
}
