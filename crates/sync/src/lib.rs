#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Sync daemon collaboration for the folio agent
//!
//! This crate talks to the local file-synchronization daemon: folder status
//! queries, rescan triggers, and the convergence wait that blocks a snapshot
//! run until the daemon has settled.

mod client;
mod waiter;

pub use client::SyncClient;
pub use waiter::wait_for_idle;

use folio_errors::Error;
use folio_types::FolderStatus;

/// A source of folder status, usually the sync daemon.
///
/// Abstracted so the convergence waiter and the pipeline can be driven by a
/// mock in tests.
pub trait StatusSource: Send + Sync {
    /// Query the current status of one synchronized folder.
    fn folder_status(
        &self,
        folder_id: &str,
    ) -> impl std::future::Future<Output = Result<FolderStatus, Error>> + Send;
}
