use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{JobStatus, MailboxStatus};

pub type JobId = String;
pub type MailboxId = u64;

/// Point-in-time read of one migration job. Replaced wholesale on every poll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSnapshot {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub id: JobId,
    #[serde(default)]
    pub name: Option<String>,
    pub status: JobStatus,
    /// Server-computed percentage. Not recomputed client-side.
    #[serde(default)]
    pub progress: u32,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub source: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub target: String,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub completed: u64,
    #[serde(default)]
    pub failed: u64,
    #[serde(default)]
    pub data_transferred: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub mailboxes: Vec<MailboxSnapshot>,
}

/// The server sends `null` for text it has not filled in yet.
fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl JobSnapshot {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("Untitled")
    }

    pub fn mailbox(&self, id: MailboxId) -> Option<&MailboxSnapshot> {
        self.mailboxes.iter().find(|mb| mb.id == id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MailboxSnapshot {
    pub id: MailboxId,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub user: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub target_user: String,
    pub status: MailboxStatus,
    #[serde(default)]
    pub msg: Option<String>,
}

/// One row of the dashboard job list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSummary {
    pub id: JobId,
    #[serde(default)]
    pub name: Option<String>,
    pub status: JobStatus,
    #[serde(default)]
    pub progress: u32,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub completed: u64,
    #[serde(default)]
    pub failed: u64,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub source: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub target: String,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemStats {
    #[serde(default)]
    pub total_jobs: u64,
    #[serde(default)]
    pub active_jobs: u64,
    #[serde(default)]
    pub completed_mailboxes: u64,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub data_transferred: String,
}

/// Job list plus aggregate stats. Stats are optional because the stats
/// endpoint failing does not invalidate the list.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Dashboard {
    pub jobs: Vec<JobSummary>,
    pub stats: Option<SystemStats>,
}

/// Why a read against the status source failed, as seen by the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    NotFound,
    Unauthorized,
    Status(u16),
    Timeout,
    Decode,
    Transport,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchFailure {
    pub class: FailureClass,
    pub message: String,
}

impl FetchFailure {
    pub fn new(class: FailureClass, message: impl Into<String>) -> Self {
        Self {
            class,
            message: message.into(),
        }
    }
}

impl fmt::Display for FetchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.class {
            FailureClass::NotFound => write!(f, "not found: {}", self.message),
            FailureClass::Unauthorized => write!(f, "unauthorized: {}", self.message),
            FailureClass::Status(code) => write!(f, "http status {code}: {}", self.message),
            FailureClass::Timeout => write!(f, "timed out: {}", self.message),
            FailureClass::Decode => write!(f, "unexpected response: {}", self.message),
            FailureClass::Transport => write!(f, "network error: {}", self.message),
        }
    }
}

/// A command the gateway refused. `detail` carries the server's message when
/// the failure body had one.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommandRejection {
    pub status: Option<u16>,
    pub detail: Option<String>,
}
