#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Cloud store access for the folio agent
//!
//! This crate owns the upload path: an HTTP client for the cloud API and the
//! bounded-retry policy wrapped around it. Retryability is read off the
//! structured error, decided where the failure is observed.

mod client;
pub mod retry;

pub use client::CloudClient;
pub use retry::{with_retry, RetryPolicy};

use folio_errors::Error;
use folio_types::SnapshotManifest;
use tokio_util::sync::CancellationToken;

/// Destination of serialized snapshot manifests.
///
/// Abstracted so the pipeline can be driven by a mock uploader in tests.
pub trait SnapshotStore: Send + Sync {
    /// Upload one manifest, returning the stored artifact's address.
    fn publish_snapshot(
        &self,
        project_id: &str,
        manifest: &SnapshotManifest,
        access_token: &str,
        cancel: &CancellationToken,
    ) -> impl std::future::Future<Output = Result<String, Error>> + Send;
}
