use std::fmt;

use syncwatch_core::{
    Action, CommandRejection, Dashboard, FailureClass, FetchFailure, JobSnapshot, MailboxId,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    JobFetched {
        epoch: u64,
        result: Result<JobSnapshot, FetchError>,
    },
    /// The delay requested by `schedule_poll` elapsed.
    PollDue { epoch: u64 },
    LogFetched {
        mailbox_id: MailboxId,
        generation: u64,
        result: Result<String, FetchError>,
    },
    LogTick { generation: u64 },
    CommandCompleted {
        action: Action,
        result: Result<(), CommandError>,
    },
    DashboardFetched(Result<Dashboard, FetchError>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchError {
    pub kind: FailureKind,
    pub message: String,
}

impl FetchError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for FetchError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    NotFound,
    Unauthorized,
    HttpStatus(u16),
    Timeout,
    TooLarge { max_bytes: u64, actual: Option<u64> },
    Decode,
    Network,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::NotFound => write!(f, "not found"),
            FailureKind::Unauthorized => write!(f, "unauthorized"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::TooLarge { max_bytes, actual } => {
                write!(f, "response too large (max {max_bytes}, actual {actual:?})")
            }
            FailureKind::Decode => write!(f, "unexpected response body"),
            FailureKind::Network => write!(f, "network error"),
        }
    }
}

impl From<FetchError> for FetchFailure {
    fn from(err: FetchError) -> Self {
        let class = match err.kind {
            FailureKind::NotFound => FailureClass::NotFound,
            FailureKind::Unauthorized => FailureClass::Unauthorized,
            FailureKind::HttpStatus(code) => FailureClass::Status(code),
            FailureKind::Timeout => FailureClass::Timeout,
            FailureKind::Decode | FailureKind::TooLarge { .. } => FailureClass::Decode,
            FailureKind::InvalidUrl | FailureKind::Network => FailureClass::Transport,
        };
        FetchFailure::new(class, err.message)
    }
}

/// A stop/retry/cancel/delete command that did not succeed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("rejected with status {status}: {}", .detail.as_deref().unwrap_or("no detail"))]
    Rejected { status: u16, detail: Option<String> },
    #[error("request failed: {0}")]
    Transport(FetchError),
}

impl From<CommandError> for CommandRejection {
    fn from(err: CommandError) -> Self {
        match err {
            CommandError::Rejected { status, detail } => CommandRejection {
                status: Some(status),
                detail,
            },
            CommandError::Transport(fetch) => CommandRejection {
                status: None,
                detail: Some(fetch.to_string()),
            },
        }
    }
}
