//! Bounded-poll wait for daemon convergence

use crate::StatusSource;
use folio_errors::{Error, SyncError};
use folio_types::FolderStatus;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Poll `source` until the folder leaves its busy states, the deadline
/// elapses, or `cancel` fires.
///
/// Status query failures are treated as "not yet converged" and retried at
/// the next tick; only the deadline or cancellation end the wait early.
///
/// # Errors
///
/// `SyncError::ScanTimeout` when the folder is still busy at the deadline;
/// `Error::Cancelled` when the token fires first.
pub async fn wait_for_idle<S: StatusSource>(
    source: &S,
    folder_id: &str,
    poll_interval: Duration,
    timeout: Duration,
    cancel: &CancellationToken,
) -> Result<FolderStatus, Error> {
    let deadline = Instant::now() + timeout;

    loop {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        match source.folder_status(folder_id).await {
            Ok(status) if !status.is_busy() => {
                tracing::debug!(folder_id, state = %status.state, "folder converged");
                return Ok(status);
            }
            Ok(status) => {
                tracing::trace!(folder_id, state = %status.state, "folder still busy");
            }
            Err(e) => {
                // Transient daemon hiccups are not fatal to the wait.
                tracing::warn!(folder_id, "status query failed: {e}");
            }
        }

        let now = Instant::now();
        if now >= deadline {
            return Err(SyncError::ScanTimeout {
                seconds: timeout.as_secs(),
            }
            .into());
        }

        let tick = deadline.min(now + poll_interval);
        tokio::select! {
            () = cancel.cancelled() => return Err(Error::Cancelled),
            () = tokio::time::sleep_until(tick) => {}
        }
    }
}
