//! Snapshot operation state as seen by observers
//!
//! One `OperationState` exists per project while a snapshot run is live. It is
//! the single JSON shape used for both point queries and streamed deltas.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Number of steps in the snapshot pipeline.
pub const TOTAL_STEPS: u8 = 6;

/// Pipeline step of a snapshot operation.
///
/// `Idle` is the synthetic "nothing tracked" state returned by point queries
/// for unknown projects; the tracker never stores it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapshotStep {
    Idle,
    Waiting,
    Browsing,
    Compressing,
    Uploading,
    Completed,
    Failed,
}

impl SnapshotStep {
    /// Whether this step ends the operation (no further transitions).
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl std::fmt::Display for SnapshotStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Waiting => "waiting",
            Self::Browsing => "browsing",
            Self::Compressing => "compressing",
            Self::Uploading => "uploading",
            Self::Completed => "completed",
            Self::Failed => "failed",
        };
        write!(f, "{s}")
    }
}

/// Overall percentage for a step number.
///
/// Fixed lookup rather than linear interpolation: packaging and uploading
/// dominate wall-clock time, so the curve front-loads the early steps.
#[must_use]
pub fn progress_percent(step_number: u8) -> u8 {
    match step_number {
        1 => 10,
        2 => 20,
        3 => 50,
        4 => 75,
        5 => 95,
        6 => 100,
        _ => 0,
    }
}

/// Live state of one snapshot operation, scoped to a project.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationState {
    pub project_id: String,
    pub step: SnapshotStep,
    pub step_number: u8,
    pub total_steps: u8,
    /// 0-100, derived from `step_number` via `progress_percent`.
    pub progress: u8,
    pub file_count: u64,
    pub total_size: u64,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub started_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Projected completion time, extrapolated from elapsed time per step.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_end: Option<DateTime<Utc>>,
}

impl OperationState {
    /// Fresh state at step 1 for a newly started operation.
    #[must_use]
    pub fn started(project_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            project_id: project_id.into(),
            step: SnapshotStep::Waiting,
            step_number: 1,
            total_steps: TOTAL_STEPS,
            progress: progress_percent(1),
            file_count: 0,
            total_size: 0,
            message: String::new(),
            snapshot_url: None,
            error: None,
            started_at: now,
            updated_at: now,
            estimated_end: None,
        }
    }

    /// Synthetic state for a project with no tracked operation.
    #[must_use]
    pub fn idle(project_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            project_id: project_id.into(),
            step: SnapshotStep::Idle,
            step_number: 0,
            total_steps: TOTAL_STEPS,
            progress: 0,
            file_count: 0,
            total_size: 0,
            message: "No snapshot generation in progress".to_string(),
            snapshot_url: None,
            error: None,
            started_at: now,
            updated_at: now,
            estimated_end: None,
        }
    }

    /// Whether the operation has reached `completed` or `failed`.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.step.is_terminal()
    }
}

/// Result of one full pipeline run.
///
/// Distinguishes "inventory built and published" from "inventory built but the
/// remote publish failed" from "no usable inventory at all".
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "outcome")]
pub enum SnapshotOutcome {
    /// Upload succeeded; the manifest lives at `url`.
    Published {
        url: String,
        file_count: u64,
        total_size: u64,
    },
    /// The inventory was collected but the upload failed after all attempts.
    LocalOnly {
        upload_error: String,
        file_count: u64,
        total_size: u64,
    },
    /// The pipeline aborted before producing an inventory.
    Failed { error: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_table_is_non_linear() {
        assert_eq!(progress_percent(1), 10);
        assert_eq!(progress_percent(3), 50);
        assert_eq!(progress_percent(6), 100);
        assert_eq!(progress_percent(0), 0);
        assert_eq!(progress_percent(7), 0);
    }

    #[test]
    fn terminal_steps() {
        assert!(SnapshotStep::Completed.is_terminal());
        assert!(SnapshotStep::Failed.is_terminal());
        assert!(!SnapshotStep::Uploading.is_terminal());
        assert!(!SnapshotStep::Idle.is_terminal());
    }

    #[test]
    fn state_serializes_camel_case() {
        let state = OperationState::started("proj-1");
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["projectId"], "proj-1");
        assert_eq!(json["step"], "waiting");
        assert_eq!(json["stepNumber"], 1);
        assert_eq!(json["totalSteps"], 6);
        assert_eq!(json["progress"], 10);
        // optional fields are omitted until set
        assert!(json.get("snapshotUrl").is_none());
        assert!(json.get("error").is_none());
    }

    #[test]
    fn idle_state_is_explicit_not_an_error() {
        let state = OperationState::idle("proj-2");
        assert_eq!(state.step, SnapshotStep::Idle);
        assert_eq!(state.step_number, 0);
        assert!(!state.is_terminal());
    }
}
