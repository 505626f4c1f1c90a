use std::time::Duration;

use crate::{Action, JobId, MailboxId};

/// Work the state machine asks the runtime to perform. Every effect that
/// reads from the server answers with a `Msg` carrying the same identity
/// (`epoch` or `generation`) so stale answers can be recognised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    FetchJob { job_id: JobId, epoch: u64 },
    SchedulePoll { epoch: u64, delay: Duration },
    /// Ask the operator; answer with `Msg::ConfirmAnswered`.
    Confirm { prompt: String },
    SendCommand(Action),
    FetchLog { mailbox_id: MailboxId, generation: u64 },
    StartLogInterval {
        mailbox_id: MailboxId,
        generation: u64,
        every: Duration,
    },
    /// Hard-cancel the interval; no further `LogTick` for this generation.
    CancelLogInterval { generation: u64 },
    FetchDashboard,
}
