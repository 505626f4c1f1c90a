//! Syncwatch core: pure state machine for job polling, operator commands,
//! log tailing and notifications, plus the view-model helpers.
mod dispatch;
mod effect;
mod log_tail;
mod msg;
mod notify;
mod poll;
mod snapshot;
mod state;
mod status;
mod update;
mod view_model;

pub use dispatch::Action;
pub use effect::Effect;
pub use log_tail::{LogTailSettings, LogViewState, ScrollMetrics};
pub use msg::Msg;
pub use notify::{NotificationQueue, NotifySettings, Toast, ToastId, ToastKind};
pub use poll::{CycleDecision, PollSettings, PollState, RetryResumePolicy, StartOutcome};
pub use snapshot::{
    CommandRejection, Dashboard, FailureClass, FetchFailure, JobId, JobSnapshot, JobSummary,
    MailboxId, MailboxSnapshot, SystemStats,
};
pub use state::{AppState, CoreSettings, DashboardState, JobView};
pub use status::{JobStatus, MailboxStatus, StatusStyle};
pub use update::update;
pub use view_model::{
    AppViewModel, DashboardView, JobDetailView, JobHeaderView, JobListRowView, LogView,
    MailboxRowView, StatsView, ToastView,
};
