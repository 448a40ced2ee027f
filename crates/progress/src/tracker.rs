//! Shared registry of live snapshot operations

use crate::Subscription;
use chrono::Utc;
use folio_errors::TrackerError;
use folio_types::{progress_percent, OperationState, SnapshotStep, TOTAL_STEPS};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Default per-subscriber buffer capacity.
const DEFAULT_BUFFER: usize = 16;

/// Ceiling on how long a terminal delta may block the writer per subscriber.
const TERMINAL_SEND_WAIT: Duration = Duration::from_secs(5);

struct Subscriber {
    id: Uuid,
    tx: mpsc::Sender<OperationState>,
}

#[derive(Default)]
struct Entry {
    /// `None` for a placeholder created by subscribe-before-start.
    state: Option<OperationState>,
    subscribers: Vec<Subscriber>,
}

/// Registry of per-project operation state plus progress fan-out.
///
/// Cheap to clone; all clones share one registry. Construct one per agent and
/// pass it to whatever needs it - there is deliberately no global instance.
#[derive(Clone)]
pub struct SnapshotTracker {
    entries: Arc<Mutex<HashMap<String, Entry>>>,
    buffer: usize,
}

impl SnapshotTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::with_buffer(DEFAULT_BUFFER)
    }

    /// Create a tracker with a custom per-subscriber buffer capacity.
    #[must_use]
    pub fn with_buffer(buffer: usize) -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            buffer: buffer.max(1),
        }
    }

    /// Begin tracking a fresh operation at step 1.
    ///
    /// A terminal state that was never cleaned up is superseded; a live one
    /// is not.
    ///
    /// # Errors
    ///
    /// Returns `TrackerError::AlreadyRunning` when a non-terminal operation
    /// exists for `project_id`.
    pub fn start(&self, project_id: &str) -> Result<(), TrackerError> {
        let Ok(mut entries) = self.entries.lock() else {
            return Ok(());
        };
        let entry = entries.entry(project_id.to_string()).or_default();
        if let Some(state) = &entry.state {
            if !state.is_terminal() {
                return Err(TrackerError::AlreadyRunning {
                    project_id: project_id.to_string(),
                });
            }
        }
        entry.state = Some(OperationState::started(project_id));
        Ok(())
    }

    /// Record progress and fan the new state out to subscribers.
    ///
    /// Silently ignored when `project_id` has no live state - a late update
    /// after cleanup or failure must neither panic nor resurrect anything.
    /// Counters and the step number never regress.
    pub async fn update(
        &self,
        project_id: &str,
        step: SnapshotStep,
        step_number: u8,
        file_count: u64,
        total_size: u64,
        message: impl Into<String>,
    ) {
        if step.is_terminal() {
            // Terminal transitions go through complete/fail only.
            tracing::debug!(project_id, %step, "ignoring terminal step in update");
            return;
        }
        let published = {
            let Ok(mut entries) = self.entries.lock() else {
                return;
            };
            let Some(entry) = entries.get_mut(project_id) else {
                return;
            };
            let Some(state) = entry.state.as_mut() else {
                return;
            };
            if state.is_terminal() {
                return;
            }

            let now = Utc::now();
            state.step = step;
            state.step_number = state.step_number.max(step_number);
            state.progress = progress_percent(state.step_number);
            state.file_count = state.file_count.max(file_count);
            state.total_size = state.total_size.max(total_size);
            state.message = message.into();
            state.updated_at = now;
            state.estimated_end = estimate_end(state);

            Some((state.clone(), collect_senders(entry)))
        };
        if let Some((state, senders)) = published {
            self.fan_out(project_id, senders, state, false).await;
        }
    }

    /// Transition to the `completed` terminal step and publish it.
    ///
    /// The state is kept queryable until an explicit `cleanup` call.
    pub async fn complete(&self, project_id: &str, snapshot_url: impl Into<String>) {
        let url = snapshot_url.into();
        self.finish(project_id, move |state| {
            state.step = SnapshotStep::Completed;
            state.step_number = TOTAL_STEPS;
            state.progress = progress_percent(TOTAL_STEPS);
            state.snapshot_url = Some(url);
            state.message = "Snapshot generation completed successfully".to_string();
        })
        .await;
    }

    /// Transition to the `failed` terminal step and publish it.
    pub async fn fail(&self, project_id: &str, error: impl Into<String>) {
        let error = error.into();
        self.finish(project_id, move |state| {
            state.step = SnapshotStep::Failed;
            state.message = format!("Snapshot generation failed: {error}");
            state.error = Some(error);
        })
        .await;
    }

    async fn finish(&self, project_id: &str, apply: impl FnOnce(&mut OperationState)) {
        let published = {
            let Ok(mut entries) = self.entries.lock() else {
                return;
            };
            let Some(entry) = entries.get_mut(project_id) else {
                return;
            };
            let Some(state) = entry.state.as_mut() else {
                return;
            };
            if state.is_terminal() {
                return;
            }
            apply(state);
            state.updated_at = Utc::now();
            state.estimated_end = None;
            Some((state.clone(), collect_senders(entry)))
        };
        if let Some((state, senders)) = published {
            self.fan_out(project_id, senders, state, true).await;
        }
    }

    /// Point-in-time read of the current state.
    #[must_use]
    pub fn state(&self, project_id: &str) -> Option<OperationState> {
        let entries = self.entries.lock().ok()?;
        entries.get(project_id).and_then(|e| e.state.clone())
    }

    /// Number of projects with a live (non-placeholder) state.
    #[must_use]
    pub fn tracked_count(&self) -> usize {
        self.entries
            .lock()
            .map(|entries| entries.values().filter(|e| e.state.is_some()).count())
            .unwrap_or(0)
    }

    /// Register a new observer for a project.
    ///
    /// Legal before `start`: a placeholder entry keeps the subscriber until
    /// the operation begins, so an early observer is never orphaned.
    #[must_use]
    pub fn subscribe(&self, project_id: &str) -> Subscription {
        let id = Uuid::new_v4();
        let (tx, rx) = mpsc::channel(self.buffer);
        if let Ok(mut entries) = self.entries.lock() {
            let entry = entries.entry(project_id.to_string()).or_default();
            entry.subscribers.push(Subscriber { id, tx });
        }
        Subscription::new(id, project_id.to_string(), rx)
    }

    /// Remove and close one subscription. Idempotent.
    pub fn unsubscribe(&self, project_id: &str, id: Uuid) {
        if let Ok(mut entries) = self.entries.lock() {
            if let Some(entry) = entries.get_mut(project_id) {
                entry.subscribers.retain(|s| s.id != id);
            }
        }
    }

    /// Delete the state and force-close every remaining subscription.
    ///
    /// Dropping the senders ends each subscriber's stream; an observer that
    /// has not read the terminal delta yet will still find it buffered, but
    /// nothing further.
    pub fn cleanup(&self, project_id: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.remove(project_id);
        }
    }

    async fn fan_out(
        &self,
        project_id: &str,
        senders: Vec<(Uuid, mpsc::Sender<OperationState>)>,
        state: OperationState,
        terminal: bool,
    ) {
        let mut closed = Vec::new();

        if terminal {
            // Terminal deltas must reach every subscriber that stays alive:
            // fall back to a bounded blocking send when the buffer is full.
            let results =
                futures::future::join_all(senders.iter().map(|(id, tx)| {
                    let state = state.clone();
                    async move {
                        match tx.try_send(state) {
                            Ok(()) => None,
                            Err(mpsc::error::TrySendError::Closed(_)) => Some(*id),
                            Err(mpsc::error::TrySendError::Full(state)) => {
                                match tokio::time::timeout(TERMINAL_SEND_WAIT, tx.send(state)).await
                                {
                                    Ok(Ok(())) => None,
                                    Ok(Err(_)) => Some(*id),
                                    Err(_) => {
                                        tracing::warn!(
                                            subscriber = %id,
                                            "terminal update not drained within {:?}",
                                            TERMINAL_SEND_WAIT
                                        );
                                        None
                                    }
                                }
                            }
                        }
                    }
                }))
                .await;
            closed.extend(results.into_iter().flatten());
        } else {
            for (id, tx) in &senders {
                match tx.try_send(state.clone()) {
                    // A full buffer drops the stale delta; the next one
                    // carries the full state anyway.
                    Ok(()) | Err(mpsc::error::TrySendError::Full(_)) => {}
                    Err(mpsc::error::TrySendError::Closed(_)) => closed.push(*id),
                }
            }
        }

        if !closed.is_empty() {
            if let Ok(mut entries) = self.entries.lock() {
                if let Some(entry) = entries.get_mut(project_id) {
                    entry.subscribers.retain(|s| !closed.contains(&s.id));
                }
            }
        }
    }
}

impl Default for SnapshotTracker {
    fn default() -> Self {
        Self::new()
    }
}

fn collect_senders(entry: &Entry) -> Vec<(Uuid, mpsc::Sender<OperationState>)> {
    entry
        .subscribers
        .iter()
        .map(|s| (s.id, s.tx.clone()))
        .collect()
}

/// Projected completion: average elapsed time per finished step, extrapolated
/// over the remaining steps.
fn estimate_end(state: &OperationState) -> Option<chrono::DateTime<Utc>> {
    if state.step_number == 0 {
        return None;
    }
    let elapsed = state.updated_at.signed_duration_since(state.started_at);
    let per_step = elapsed / i32::from(state.step_number);
    let remaining = i32::from(TOTAL_STEPS.saturating_sub(state.step_number));
    Some(state.updated_at + per_step * remaining)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn start_rejects_live_operation() {
        let tracker = SnapshotTracker::new();
        tracker.start("p").unwrap();
        assert!(matches!(
            tracker.start("p"),
            Err(TrackerError::AlreadyRunning { .. })
        ));
    }

    #[tokio::test]
    async fn start_supersedes_terminal_state() {
        let tracker = SnapshotTracker::new();
        tracker.start("p").unwrap();
        tracker.fail("p", "boom").await;
        tracker.start("p").unwrap();

        let state = tracker.state("p").unwrap();
        assert_eq!(state.step, SnapshotStep::Waiting);
        assert_eq!(state.step_number, 1);
        assert!(state.error.is_none());
    }

    #[tokio::test]
    async fn update_without_state_is_a_noop() {
        let tracker = SnapshotTracker::new();
        tracker
            .update("ghost", SnapshotStep::Browsing, 3, 1, 1, "late")
            .await;
        assert!(tracker.state("ghost").is_none());
    }

    #[tokio::test]
    async fn update_after_cleanup_is_a_noop() {
        let tracker = SnapshotTracker::new();
        tracker.start("p").unwrap();
        tracker.cleanup("p");
        tracker
            .update("p", SnapshotStep::Browsing, 3, 0, 0, "late")
            .await;
        assert!(tracker.state("p").is_none());
    }

    #[tokio::test]
    async fn counters_never_regress() {
        let tracker = SnapshotTracker::new();
        tracker.start("p").unwrap();
        tracker
            .update("p", SnapshotStep::Compressing, 4, 100, 4096, "working")
            .await;
        tracker
            .update("p", SnapshotStep::Uploading, 5, 0, 0, "uploading")
            .await;

        let state = tracker.state("p").unwrap();
        assert_eq!(state.step_number, 5);
        assert_eq!(state.file_count, 100);
        assert_eq!(state.total_size, 4096);
    }

    #[tokio::test]
    async fn terminal_state_is_queryable_until_cleanup() {
        let tracker = SnapshotTracker::new();
        tracker.start("p").unwrap();
        tracker.complete("p", "https://cloud.example/s/1").await;

        let state = tracker.state("p").unwrap();
        assert!(state.is_terminal());
        assert_eq!(state.step, SnapshotStep::Completed);
        assert_eq!(state.progress, 100);
        assert_eq!(
            state.snapshot_url.as_deref(),
            Some("https://cloud.example/s/1")
        );

        tracker.cleanup("p");
        assert!(tracker.state("p").is_none());
    }

    #[tokio::test]
    async fn fail_records_error_and_keeps_step_number() {
        let tracker = SnapshotTracker::new();
        tracker.start("p").unwrap();
        tracker
            .update("p", SnapshotStep::Uploading, 5, 10, 100, "uploading")
            .await;
        tracker.fail("p", "upload failed: 503").await;

        let state = tracker.state("p").unwrap();
        assert_eq!(state.step, SnapshotStep::Failed);
        assert_eq!(state.step_number, 5);
        assert_eq!(state.error.as_deref(), Some("upload failed: 503"));
        assert!(state.message.contains("upload failed: 503"));
    }

    #[tokio::test]
    async fn complete_after_fail_does_not_overwrite() {
        let tracker = SnapshotTracker::new();
        tracker.start("p").unwrap();
        tracker.fail("p", "boom").await;
        tracker.complete("p", "https://cloud.example/s/1").await;

        let state = tracker.state("p").unwrap();
        assert_eq!(state.step, SnapshotStep::Failed);
        assert!(state.snapshot_url.is_none());
    }

    #[tokio::test]
    async fn unsubscribe_is_idempotent() {
        let tracker = SnapshotTracker::new();
        let sub = tracker.subscribe("p");
        let id = sub.id();
        tracker.unsubscribe("p", id);
        tracker.unsubscribe("p", id);
    }

    #[tokio::test]
    async fn estimate_projects_forward() {
        let tracker = SnapshotTracker::new();
        tracker.start("p").unwrap();
        tracker
            .update("p", SnapshotStep::Browsing, 3, 0, 0, "browsing")
            .await;
        let state = tracker.state("p").unwrap();
        let estimate = state.estimated_end.unwrap();
        assert!(estimate >= state.updated_at);
    }
}
