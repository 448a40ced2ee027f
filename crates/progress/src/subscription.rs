//! Observer-side handle of a progress subscription

use folio_types::OperationState;
use tokio::sync::mpsc;
use uuid::Uuid;

/// An ordered stream of state deltas for one project.
///
/// Created by `SnapshotTracker::subscribe`; ends when the tracker cleans the
/// project up, when `unsubscribe` is called, or when the handle is dropped.
#[derive(Debug)]
pub struct Subscription {
    id: Uuid,
    project_id: String,
    rx: mpsc::Receiver<OperationState>,
}

impl Subscription {
    pub(crate) fn new(id: Uuid, project_id: String, rx: mpsc::Receiver<OperationState>) -> Self {
        Self { id, project_id, rx }
    }

    /// Identifier used by `SnapshotTracker::unsubscribe`.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    #[must_use]
    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    /// Receive the next delta. `None` means the stream has ended: the
    /// operation was cleaned up or this subscription was removed.
    pub async fn recv(&mut self) -> Option<OperationState> {
        self.rx.recv().await
    }

    /// Non-blocking variant of `recv`.
    ///
    /// # Errors
    ///
    /// Returns `TryRecvError::Empty` when no delta is buffered and
    /// `TryRecvError::Disconnected` once the stream has ended.
    pub fn try_recv(&mut self) -> Result<OperationState, mpsc::error::TryRecvError> {
        self.rx.try_recv()
    }

    /// Consume the handle, exposing the raw receiver for stream adapters.
    #[must_use]
    pub fn into_receiver(self) -> mpsc::Receiver<OperationState> {
        self.rx
    }
}
