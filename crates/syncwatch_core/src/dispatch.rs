//! Operator commands and the wording around them.

use crate::{CommandRejection, JobId, MailboxId, ToastKind};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Stop(MailboxId),
    Retry(MailboxId),
    CancelAll(JobId),
    DeleteAllJobs,
}

impl Action {
    /// Question shown before the command is sent.
    pub fn confirmation_prompt(&self) -> String {
        match self {
            Action::Stop(id) => format!("Stop syncing mailbox {id}?"),
            Action::Retry(id) => format!("Retry syncing mailbox {id}?"),
            Action::CancelAll(job) => {
                format!("Stop ALL running mailboxes in job {job}?")
            }
            Action::DeleteAllJobs => {
                "Delete ALL jobs and logs? This cannot be undone.".to_string()
            }
        }
    }

    pub(crate) fn success_toast(&self) -> (ToastKind, String) {
        match self {
            Action::Stop(id) => (ToastKind::Info, format!("Stop requested for mailbox {id}")),
            Action::Retry(id) => (ToastKind::Success, format!("Retrying mailbox {id}...")),
            Action::CancelAll(_) => (
                ToastKind::Info,
                "Stop requested for all running mailboxes".to_string(),
            ),
            Action::DeleteAllJobs => (ToastKind::Success, "All job history deleted".to_string()),
        }
    }

    fn generic_failure(&self) -> &'static str {
        match self {
            Action::Stop(_) => "Failed to stop",
            Action::Retry(_) => "Failed to retry",
            Action::CancelAll(_) => "Failed to cancel",
            Action::DeleteAllJobs => "Failed to delete jobs",
        }
    }

    /// Error text for a rejected command: the server's detail when it sent one.
    pub fn failure_message(&self, rejection: &CommandRejection) -> String {
        let detail = rejection
            .detail
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| self.generic_failure());
        format!("Error: {detail}")
    }
}
