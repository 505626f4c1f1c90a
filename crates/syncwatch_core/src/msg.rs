use crate::{
    Action, CommandRejection, Dashboard, FetchFailure, JobId, JobSnapshot, MailboxId, ToastId,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// Operator opened the detail view of a job; starts polling it.
    OpenJob(JobId),
    /// Operator left the detail view.
    CloseJob,
    /// Start polling the open job unless a loop is already running.
    StartPolling,
    /// Cooperative stop of the open job's loop.
    StopPolling,
    /// Poll delay elapsed for the loop identified by `epoch`.
    PollTimerFired { epoch: u64 },
    /// Status source answered a job fetch.
    JobFetched {
        epoch: u64,
        result: Result<JobSnapshot, FetchFailure>,
    },
    /// Operator typed into the mailbox search box.
    FilterChanged(String),
    /// Operator asked for a command; it still needs confirmation.
    ActionRequested(Action),
    /// Operator answered the pending confirmation.
    ConfirmAnswered(bool),
    /// Action gateway answered a command.
    CommandCompleted {
        action: Action,
        result: Result<(), CommandRejection>,
    },
    /// Operator opened the log viewer for a mailbox.
    OpenLog(MailboxId),
    /// Operator closed the log viewer.
    CloseLog,
    /// Log interval ticked for the viewer identified by `generation`.
    LogTick { generation: u64 },
    /// Status source answered a log fetch.
    LogFetched {
        mailbox_id: MailboxId,
        generation: u64,
        result: Result<String, FetchFailure>,
    },
    /// Operator scrolled the log viewer.
    LogScrolled { offset: u32 },
    LogViewportResized { height: u32 },
    AutoScrollToggled(bool),
    /// Operator asked for a fresh job list.
    RefreshDashboard,
    DashboardFetched(Result<Dashboard, FetchFailure>),
    DismissToast(ToastId),
    /// Clock tick, in milliseconds since the app started.
    Tick { now_ms: u64 },
    /// Fallback for placeholder wiring.
    NoOp,
}
