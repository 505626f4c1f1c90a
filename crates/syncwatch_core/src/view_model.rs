use crate::notify::{ToastId, ToastKind};
use crate::{AppState, JobId, JobStatus, MailboxId, StatusStyle};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub job: Option<JobDetailView>,
    pub log: Option<LogView>,
    pub dashboard: DashboardView,
    /// Prompt of the confirmation currently waiting for an answer.
    pub confirmation: Option<String>,
    pub toasts: Vec<ToastView>,
    pub dirty: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobDetailView {
    pub job_id: JobId,
    /// `None` until the first snapshot lands.
    pub header: Option<JobHeaderView>,
    pub error: Option<String>,
    pub rows: Vec<MailboxRowView>,
    /// Rows hidden by the current filter.
    pub hidden_rows: usize,
    pub filter: String,
    pub polling: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobHeaderView {
    pub name: String,
    pub status: String,
    pub style: StatusStyle,
    pub source: String,
    pub target: String,
    pub total: u64,
    pub completed: u64,
    pub failed: u64,
    pub data_transferred: String,
    /// Clamped to 0..=100.
    pub progress: u8,
    pub can_cancel_all: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailboxRowView {
    pub mailbox_id: MailboxId,
    pub user: String,
    pub target_user: String,
    pub status: String,
    pub style: StatusStyle,
    /// Server message, or "-" when there is none.
    pub message: String,
    pub can_stop: bool,
    pub can_retry: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogView {
    pub mailbox_id: MailboxId,
    /// `None` while the first fetch is outstanding.
    pub text: Option<String>,
    pub offset: u32,
    pub max_offset: u32,
    pub viewport_height: u32,
    pub auto_scroll: bool,
    pub degraded: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DashboardView {
    pub loading: bool,
    pub loaded: bool,
    pub error: Option<String>,
    pub jobs: Vec<JobListRowView>,
    pub stats: Option<StatsView>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobListRowView {
    pub job_id: JobId,
    pub name: String,
    pub status: String,
    pub style: StatusStyle,
    pub progress: u8,
    pub source: String,
    pub target: String,
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatsView {
    pub total_jobs: u64,
    pub active_jobs: u64,
    pub completed_mailboxes: u64,
    pub data_transferred: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToastView {
    pub id: ToastId,
    pub kind: ToastKind,
    pub message: String,
}

pub(crate) fn build(state: &AppState, dirty: bool) -> AppViewModel {
    AppViewModel {
        job: state.job.as_ref().map(job_detail),
        log: state.log.as_ref().map(|log| {
            let scroll = log.scroll();
            LogView {
                mailbox_id: log.mailbox_id(),
                text: log.text().map(ToOwned::to_owned),
                offset: scroll.offset,
                max_offset: scroll.max_offset(),
                viewport_height: scroll.viewport_height,
                auto_scroll: log.auto_scroll(),
                degraded: log.is_degraded(),
            }
        }),
        dashboard: dashboard(state),
        confirmation: state
            .pending_confirmation
            .as_ref()
            .map(|action| action.confirmation_prompt()),
        toasts: state
            .toasts
            .iter()
            .map(|t| ToastView {
                id: t.id,
                kind: t.kind,
                message: t.message.clone(),
            })
            .collect(),
        dirty,
    }
}

fn job_detail(view: &crate::state::JobView) -> JobDetailView {
    let needle = view.filter.trim().to_lowercase();
    let mut rows = Vec::new();
    let mut hidden_rows = 0;

    let header = view.snapshot.as_ref().map(|job| {
        for mb in &job.mailboxes {
            if !needle.is_empty()
                && !mb.user.to_lowercase().contains(&needle)
                && !mb.target_user.to_lowercase().contains(&needle)
            {
                hidden_rows += 1;
                continue;
            }
            rows.push(MailboxRowView {
                mailbox_id: mb.id,
                user: mb.user.clone(),
                target_user: mb.target_user.clone(),
                status: mb.status.as_str().to_string(),
                style: mb.status.style(),
                message: mb
                    .msg
                    .as_deref()
                    .filter(|m| !m.is_empty())
                    .unwrap_or("-")
                    .to_string(),
                can_stop: mb.status.can_stop(),
                can_retry: mb.status.can_retry(),
            });
        }

        JobHeaderView {
            name: job.display_name().to_string(),
            status: job.status.as_str().to_string(),
            style: job.status.style(),
            source: job.source.clone(),
            target: job.target.clone(),
            total: job.total,
            completed: job.completed,
            failed: job.failed,
            data_transferred: job
                .data_transferred
                .clone()
                .unwrap_or_else(|| "0 B".to_string()),
            progress: clamp_progress(job.progress),
            can_cancel_all: job.status == JobStatus::Running,
        }
    });

    JobDetailView {
        job_id: view.job_id.clone(),
        header,
        error: view
            .error
            .as_ref()
            .map(|err| format!("Error loading job: {err}")),
        rows,
        hidden_rows,
        filter: view.filter.clone(),
        polling: view.poll.is_active(),
    }
}

fn dashboard(state: &AppState) -> DashboardView {
    let dash = &state.dashboard;
    DashboardView {
        loading: dash.loading,
        loaded: dash.loaded,
        error: dash.error.as_ref().map(|err| format!("Failed to load jobs: {err}")),
        jobs: dash
            .jobs
            .iter()
            .map(|job| JobListRowView {
                job_id: job.id.clone(),
                name: job.name.clone().unwrap_or_else(|| "Untitled".to_string()),
                status: job.status.as_str().to_string(),
                style: job.status.style(),
                progress: clamp_progress(job.progress),
                source: job.source.clone(),
                target: job.target.clone(),
                created_at: job.created_at.clone(),
            })
            .collect(),
        stats: dash.stats.as_ref().map(|s| StatsView {
            total_jobs: s.total_jobs,
            active_jobs: s.active_jobs,
            completed_mailboxes: s.completed_mailboxes,
            data_transferred: s.data_transferred.clone(),
        }),
    }
}

fn clamp_progress(progress: u32) -> u8 {
    u8::try_from(progress.min(100)).unwrap_or(100)
}
