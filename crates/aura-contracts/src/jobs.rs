use serde::{Deserialize, Serialize};

use crate::analysis::TryOnResult;

/// Server-side lifecycle of a synthesis job.
///
/// Transitions are one-directional: `Submitted → Processing → {Completed |
/// Failed}`. The ordering below backs the monotonic `observe` rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum JobStatus {
    Submitted,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    /// Backend status strings as reported by the try-on endpoints.
    pub fn parse(raw: &str) -> Option<JobStatus> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "submitted" | "queued" => Some(JobStatus::Submitted),
            "processing" => Some(JobStatus::Processing),
            "completed" => Some(JobStatus::Completed),
            "failed" => Some(JobStatus::Failed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    pub status: JobStatus,
    pub attempts_made: u32,
    pub result: Option<TryOnResult>,
    pub error_message: Option<String>,
}

impl Job {
    pub fn submitted() -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            status: JobStatus::Submitted,
            attempts_made: 0,
            result: None,
            error_message: None,
        }
    }

    /// Folds a reported status into the job. A report of an earlier state
    /// never regresses the stored one.
    pub fn observe(&mut self, reported: JobStatus) {
        if reported > self.status {
            self.status = reported;
        }
    }

    pub fn record_attempt(&mut self) {
        self.attempts_made += 1;
    }
}
