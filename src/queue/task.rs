//! Task model for the download queue

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Task status
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum TaskStatus {
    /// Waiting for the active slot to free up
    #[default]
    Pending,
    /// Currently being progressed; at most one task holds this status
    Active,
    /// Finished successfully with progress at 100
    Completed,
    /// The progress source reported an error; carries the cause
    Failed(String),
}

impl TaskStatus {
    /// True for statuses that will never change again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed(_))
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskStatus::Pending => write!(f, "Pending"),
            TaskStatus::Active => write!(f, "Active"),
            TaskStatus::Completed => write!(f, "Completed"),
            TaskStatus::Failed(_) => write!(f, "Failed"),
        }
    }
}

/// Caller-side description of a task to submit.
///
/// `id` is optional; when absent the queue assigns a fresh UUID at
/// submission time. Ids must be unique among tasks currently in the queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskSpec {
    pub id: Option<String>,
    pub label: String,
    pub size_units: u64,
    pub thumbnail: Option<String>,
}

impl TaskSpec {
    pub fn new(label: impl Into<String>, size_units: u64) -> Self {
        Self {
            id: None,
            label: label.into(),
            size_units,
            thumbnail: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

/// A unit of work tracked by the queue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub label: String,
    pub size_units: u64,
    /// Percent complete, 0..=100; only moves while the task is active
    pub progress: u8,
    pub status: TaskStatus,
    pub thumbnail: Option<String>,
    pub added_at: DateTime<Utc>,
}

impl Task {
    /// Build a fresh pending task from a submission spec.
    pub fn from_spec(spec: TaskSpec) -> Self {
        let id = spec
            .id
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        Self {
            id,
            label: spec.label,
            size_units: spec.size_units,
            progress: 0,
            status: TaskStatus::Pending,
            thumbnail: spec.thumbnail,
            added_at: Utc::now(),
        }
    }

    /// Apply a progress report. Values are clamped to 100 and only take
    /// effect while the task is active and the value actually advances.
    /// Returns whether the task changed.
    pub(crate) fn apply_progress(&mut self, percent: u8) -> bool {
        if self.status != TaskStatus::Active {
            return false;
        }
        let percent = percent.min(100);
        if percent <= self.progress {
            return false;
        }
        self.progress = percent;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn active_task() -> Task {
        let mut task = Task::from_spec(TaskSpec::new("Episode 1", 100));
        task.status = TaskStatus::Active;
        task
    }

    #[test]
    fn from_spec_initializes_pending_at_zero() {
        let task = Task::from_spec(TaskSpec::new("Episode 1", 250).with_id("ep-1"));

        assert_eq!(task.id, "ep-1");
        assert_eq!(task.label, "Episode 1");
        assert_eq!(task.size_units, 250);
        assert_eq!(task.progress, 0);
        assert_eq!(task.status, TaskStatus::Pending);
    }

    #[test]
    fn from_spec_generates_id_when_absent() {
        let a = Task::from_spec(TaskSpec::new("a", 1));
        let b = Task::from_spec(TaskSpec::new("b", 1));

        assert!(!a.id.is_empty());
        assert_ne!(a.id, b.id, "generated ids should not collide");
    }

    #[test]
    fn progress_ignored_unless_active() {
        let mut task = Task::from_spec(TaskSpec::new("ep", 10));
        assert!(!task.apply_progress(50));
        assert_eq!(task.progress, 0);

        task.status = TaskStatus::Completed;
        task.progress = 100;
        assert!(!task.apply_progress(10));
        assert_eq!(task.progress, 100);
    }

    #[test]
    fn progress_never_moves_backwards() {
        let mut task = active_task();
        assert!(task.apply_progress(40));
        assert!(!task.apply_progress(40));
        assert!(!task.apply_progress(12));
        assert_eq!(task.progress, 40);
    }

    #[test]
    fn progress_clamps_to_100() {
        let mut task = active_task();
        assert!(task.apply_progress(120));
        assert_eq!(task.progress, 100);
    }

    #[test]
    fn terminal_statuses() {
        assert!(TaskStatus::Completed.is_terminal());
        assert!(TaskStatus::Failed("boom".into()).is_terminal());
        assert!(!TaskStatus::Pending.is_terminal());
        assert!(!TaskStatus::Active.is_terminal());
    }

    #[test]
    fn status_display_is_cause_free() {
        assert_eq!(TaskStatus::Pending.to_string(), "Pending");
        assert_eq!(TaskStatus::Active.to_string(), "Active");
        assert_eq!(TaskStatus::Completed.to_string(), "Completed");
        // The cause stays out of the display form; it is for logs, not labels.
        assert_eq!(TaskStatus::Failed("boom".into()).to_string(), "Failed");
    }

    proptest! {
        // Whatever the source reports, observed progress is monotone and
        // stays within 0..=100.
        #[test]
        fn progress_is_monotone_under_any_report_sequence(
            reports in proptest::collection::vec(0u8..=255, 0..64)
        ) {
            let mut task = active_task();
            let mut last = task.progress;
            for report in reports {
                task.apply_progress(report);
                prop_assert!(task.progress >= last);
                prop_assert!(task.progress <= 100);
                last = task.progress;
            }
        }
    }
}
