//! Render job status tracking.
//!
//! `RenderSnapshot` is a serializable view of the current job, suitable
//! for polling from a UI without reaching into the controller.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Render job state machine states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RenderStatus {
    /// No job submitted, or reset after a terminal state
    #[default]
    Idle,
    /// A job is actively rendering
    Running,
    /// Last job produced an output
    Succeeded,
    /// Last job failed with an error
    Failed,
    /// Last job was cancelled by the user
    Cancelled,
}

impl RenderStatus {
    /// Get string representation of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            RenderStatus::Idle => "idle",
            RenderStatus::Running => "running",
            RenderStatus::Succeeded => "succeeded",
            RenderStatus::Failed => "failed",
            RenderStatus::Cancelled => "cancelled",
        }
    }

    /// Check if this is a terminal state (job finished, output settled).
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RenderStatus::Succeeded | RenderStatus::Failed | RenderStatus::Cancelled
        )
    }

    /// Whether a new submission is accepted from this state.
    pub fn accepts_submission(&self) -> bool {
        !matches!(self, RenderStatus::Running)
    }
}

impl std::fmt::Display for RenderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Snapshot of the current render job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderSnapshot {
    /// Unique job identifier
    pub job_id: String,
    /// Source video being captioned
    pub video_id: String,
    /// Current status
    pub status: RenderStatus,
    /// Progress percentage (0-100)
    pub progress: u8,
    /// Error message if the job failed
    pub error_message: Option<String>,
    /// When the job was started
    pub started_at: DateTime<Utc>,
    /// When the snapshot was last updated
    pub updated_at: DateTime<Utc>,
}

impl RenderSnapshot {
    /// Create a snapshot for a newly submitted job.
    pub fn new(video_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            job_id: Uuid::new_v4().to_string(),
            video_id: video_id.into(),
            status: RenderStatus::Running,
            progress: 0,
            error_message: None,
            started_at: now,
            updated_at: now,
        }
    }

    /// Create an empty idle snapshot (no job yet).
    pub fn idle() -> Self {
        let now = Utc::now();
        Self {
            job_id: String::new(),
            video_id: String::new(),
            status: RenderStatus::Idle,
            progress: 0,
            error_message: None,
            started_at: now,
            updated_at: now,
        }
    }

    /// Check if the job is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Update progress, clamped to 0-100.
    pub fn set_progress(&mut self, progress: u8) {
        self.progress = progress.min(100);
        self.updated_at = Utc::now();
    }

    /// Mark the job as succeeded.
    pub fn complete(&mut self) {
        self.status = RenderStatus::Succeeded;
        self.progress = 100;
        self.updated_at = Utc::now();
    }

    /// Mark the job as failed with an error message.
    pub fn fail(&mut self, error: impl Into<String>) {
        self.status = RenderStatus::Failed;
        self.error_message = Some(error.into());
        self.updated_at = Utc::now();
    }

    /// Mark the job as cancelled and zero the progress.
    pub fn cancel(&mut self) {
        self.status = RenderStatus::Cancelled;
        self.progress = 0;
        self.updated_at = Utc::now();
    }

    /// Return to idle, clearing progress and any error.
    pub fn reset(&mut self) {
        self.status = RenderStatus::Idle;
        self.progress = 0;
        self.error_message = None;
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_terminality() {
        assert!(!RenderStatus::Idle.is_terminal());
        assert!(!RenderStatus::Running.is_terminal());
        assert!(RenderStatus::Succeeded.is_terminal());
        assert!(RenderStatus::Failed.is_terminal());
        assert!(RenderStatus::Cancelled.is_terminal());
    }

    #[test]
    fn test_submission_gate() {
        assert!(RenderStatus::Idle.accepts_submission());
        assert!(RenderStatus::Cancelled.accepts_submission());
        assert!(!RenderStatus::Running.accepts_submission());
    }

    #[test]
    fn test_snapshot_transitions() {
        let mut snap = RenderSnapshot::new("video-1");
        assert_eq!(snap.status, RenderStatus::Running);
        assert_eq!(snap.progress, 0);

        snap.set_progress(57);
        assert_eq!(snap.progress, 57);

        snap.complete();
        assert_eq!(snap.status, RenderStatus::Succeeded);
        assert_eq!(snap.progress, 100);
        assert!(snap.is_terminal());

        snap.reset();
        assert_eq!(snap.status, RenderStatus::Idle);
        assert_eq!(snap.progress, 0);
    }

    #[test]
    fn test_cancel_zeroes_progress() {
        let mut snap = RenderSnapshot::new("video-1");
        snap.set_progress(80);
        snap.cancel();
        assert_eq!(snap.status, RenderStatus::Cancelled);
        assert_eq!(snap.progress, 0);
    }

    #[test]
    fn test_progress_clamped() {
        let mut snap = RenderSnapshot::new("video-1");
        snap.set_progress(250);
        assert_eq!(snap.progress, 100);
    }
}
