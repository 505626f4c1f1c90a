use crate::log_tail::{LogTailSettings, LogViewState};
use crate::notify::{NotificationQueue, NotifySettings, ToastKind};
use crate::poll::{PollSettings, PollState};
use crate::view_model::{self, AppViewModel};
use crate::{Action, FetchFailure, JobId, JobSnapshot, JobSummary, SystemStats};

/// Tunables for the state machine, filled from the app's configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CoreSettings {
    pub poll: PollSettings,
    pub log: LogTailSettings,
    pub notify: NotifySettings,
}

/// The open job-detail view. Owns its poll loop state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobView {
    pub(crate) job_id: JobId,
    pub(crate) snapshot: Option<JobSnapshot>,
    pub(crate) error: Option<FetchFailure>,
    pub(crate) poll: PollState,
    pub(crate) filter: String,
}

impl JobView {
    pub(crate) fn new(job_id: JobId, epoch_floor: u64) -> Self {
        Self {
            job_id,
            snapshot: None,
            error: None,
            poll: PollState::after_epoch(epoch_floor),
            filter: String::new(),
        }
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    pub fn snapshot(&self) -> Option<&JobSnapshot> {
        self.snapshot.as_ref()
    }

    pub fn poll(&self) -> &PollState {
        &self.poll
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DashboardState {
    pub(crate) jobs: Vec<JobSummary>,
    pub(crate) stats: Option<SystemStats>,
    pub(crate) error: Option<FetchFailure>,
    pub(crate) loading: bool,
    pub(crate) loaded: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppState {
    pub(crate) settings: CoreSettings,
    pub(crate) job: Option<JobView>,
    /// Highest poll epoch handed out by any view closed so far.
    pub(crate) retired_epoch: u64,
    pub(crate) log: Option<LogViewState>,
    pub(crate) log_generation: u64,
    pub(crate) dashboard: DashboardState,
    pub(crate) pending_confirmation: Option<Action>,
    pub(crate) toasts: NotificationQueue,
    pub(crate) now_ms: u64,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: CoreSettings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    pub fn settings(&self) -> &CoreSettings {
        &self.settings
    }

    pub fn job(&self) -> Option<&JobView> {
        self.job.as_ref()
    }

    pub fn log(&self) -> Option<&LogViewState> {
        self.log.as_ref()
    }

    pub fn pending_confirmation(&self) -> Option<&Action> {
        self.pending_confirmation.as_ref()
    }

    pub fn toasts(&self) -> &NotificationQueue {
        &self.toasts
    }

    pub fn view(&self) -> AppViewModel {
        view_model::build(self, self.dirty)
    }

    /// Closes the job view, if any, remembering its epoch.
    pub(crate) fn retire_job_view(&mut self) -> Option<JobView> {
        let old = self.job.take()?;
        self.retired_epoch = self.retired_epoch.max(old.poll.epoch());
        self.dirty = true;
        Some(old)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Returns whether anything visible changed since the last call, and resets it.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn notify(&mut self, kind: ToastKind, message: impl Into<String>) {
        let now = self.now_ms;
        self.toasts.push(kind, message, now, &self.settings.notify);
        self.dirty = true;
    }
}
