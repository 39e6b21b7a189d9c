// src/tracking/record.rs

use std::fmt;

use chrono::{DateTime, Utc};

use crate::types::ExecutionId;

/// Lifecycle of a background execution.
///
/// `Running` is the only non-terminal state; no transition leaves a
/// terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionStatus {
    Running,
    Completed,
    Failed,
    Cancelled,
    Error,
}

impl ExecutionStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, ExecutionStatus::Running)
    }
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ExecutionStatus::Running => "running",
            ExecutionStatus::Completed => "completed",
            ExecutionStatus::Failed => "failed",
            ExecutionStatus::Cancelled => "cancelled",
            ExecutionStatus::Error => "error",
        };
        f.write_str(s)
    }
}

/// Tracked state of one background execution.
///
/// Automation id and name are copied at launch so the record stays
/// meaningful across registry reloads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionRecord {
    pub execution_id: ExecutionId,
    pub automation_id: String,
    pub automation_name: String,
    pub status: ExecutionStatus,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl ExecutionRecord {
    pub fn running(
        execution_id: ExecutionId,
        automation_id: impl Into<String>,
        automation_name: impl Into<String>,
    ) -> Self {
        Self {
            execution_id,
            automation_id: automation_id.into(),
            automation_name: automation_name.into(),
            status: ExecutionStatus::Running,
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    /// Reset the start time while the run has not finished yet.
    pub(crate) fn begin(&mut self) {
        if self.status == ExecutionStatus::Running {
            self.started_at = Utc::now();
        }
    }

    /// Move to `status` if still running. Returns whether anything changed.
    pub(crate) fn transition(&mut self, status: ExecutionStatus) -> bool {
        if self.status.is_terminal() || !status.is_terminal() {
            return false;
        }
        self.status = status;
        self.finished_at = Some(Utc::now());
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn running_cannot_be_re_entered() {
        let mut r = ExecutionRecord::running(ExecutionId::from("x"), "a", "A");
        assert!(!r.transition(ExecutionStatus::Running));
        assert!(r.transition(ExecutionStatus::Error));
        assert!(!r.transition(ExecutionStatus::Completed));
        assert_eq!(r.status, ExecutionStatus::Error);
        assert_eq!(r.status.to_string(), "error");
    }
}
