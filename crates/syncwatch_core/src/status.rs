use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle of a migration job as reported by the server.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
    /// Any value the server sends that this client does not know.
    Unknown(String),
}

impl JobStatus {
    /// `pending` and `running` keep a poll loop alive; everything else is terminal.
    pub fn is_active(&self) -> bool {
        matches!(self, JobStatus::Pending | JobStatus::Running)
    }

    pub fn is_terminal(&self) -> bool {
        !self.is_active()
    }

    pub fn as_str(&self) -> &str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Running => "running",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
            JobStatus::Unknown(raw) => raw,
        }
    }

    pub fn style(&self) -> StatusStyle {
        match self {
            JobStatus::Pending => StatusStyle::Waiting,
            JobStatus::Running => StatusStyle::Active,
            JobStatus::Completed => StatusStyle::Done,
            JobStatus::Failed => StatusStyle::Error,
            JobStatus::Unknown(_) => StatusStyle::Neutral,
        }
    }
}

impl From<String> for JobStatus {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "pending" => JobStatus::Pending,
            "running" => JobStatus::Running,
            "completed" => JobStatus::Completed,
            "failed" => JobStatus::Failed,
            _ => JobStatus::Unknown(raw),
        }
    }
}

impl From<JobStatus> for String {
    fn from(status: JobStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle of one mailbox sync unit. `success` is what the server calls a
/// completed mailbox.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MailboxStatus {
    Pending,
    Running,
    Success,
    Failed,
    Unknown(String),
}

impl MailboxStatus {
    pub fn as_str(&self) -> &str {
        match self {
            MailboxStatus::Pending => "pending",
            MailboxStatus::Running => "running",
            MailboxStatus::Success => "success",
            MailboxStatus::Failed => "failed",
            MailboxStatus::Unknown(raw) => raw,
        }
    }

    pub fn style(&self) -> StatusStyle {
        match self {
            MailboxStatus::Pending => StatusStyle::Waiting,
            MailboxStatus::Running => StatusStyle::Active,
            MailboxStatus::Success => StatusStyle::Done,
            MailboxStatus::Failed => StatusStyle::Error,
            MailboxStatus::Unknown(_) => StatusStyle::Neutral,
        }
    }

    pub fn can_stop(&self) -> bool {
        matches!(self, MailboxStatus::Running)
    }

    pub fn can_retry(&self) -> bool {
        matches!(self, MailboxStatus::Failed)
    }
}

impl From<String> for MailboxStatus {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "pending" => MailboxStatus::Pending,
            "running" => MailboxStatus::Running,
            // Some server revisions report `completed` for mailboxes too.
            "success" | "completed" => MailboxStatus::Success,
            "failed" => MailboxStatus::Failed,
            _ => MailboxStatus::Unknown(raw),
        }
    }
}

impl From<MailboxStatus> for String {
    fn from(status: MailboxStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for MailboxStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Display style for a status badge. Renderers map this to colours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusStyle {
    Waiting,
    Active,
    Done,
    Error,
    Neutral,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_job_status_round_trips_raw_value() {
        let status = JobStatus::from("paused".to_string());
        assert_eq!(status, JobStatus::Unknown("paused".into()));
        assert_eq!(status.as_str(), "paused");
        assert_eq!(status.style(), StatusStyle::Neutral);
        assert!(status.is_terminal());
    }

    #[test]
    fn success_shares_style_with_completed() {
        assert_eq!(MailboxStatus::Success.style(), JobStatus::Completed.style());
        assert_eq!(
            MailboxStatus::from("completed".to_string()),
            MailboxStatus::Success
        );
    }

    #[test]
    fn only_pending_and_running_are_active() {
        assert!(JobStatus::Pending.is_active());
        assert!(JobStatus::Running.is_active());
        assert!(!JobStatus::Completed.is_active());
        assert!(!JobStatus::Failed.is_active());
    }
}
