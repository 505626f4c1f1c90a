use syncwatch_logging::{watch_debug, watch_info, watch_warn};

use crate::log_tail::LogViewState;
use crate::notify::ToastKind;
use crate::poll::{CycleDecision, StartOutcome};
use crate::state::JobView;
use crate::{
    Action, AppState, CommandRejection, Dashboard, Effect, FetchFailure, JobId, JobSnapshot,
    MailboxId, Msg,
};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::OpenJob(job_id) => open_job(&mut state, job_id),
        Msg::CloseJob => {
            state.retire_job_view();
            Vec::new()
        }
        Msg::StartPolling => start_polling(&mut state),
        Msg::StopPolling => {
            if let Some(job) = state.job.as_mut() {
                if job.poll.is_active() {
                    job.poll.stop();
                    state.mark_dirty();
                }
            }
            Vec::new()
        }
        Msg::PollTimerFired { epoch } => match state.job.as_mut() {
            Some(job) => {
                if job.poll.begin_cycle(epoch) {
                    vec![Effect::FetchJob {
                        job_id: job.job_id.clone(),
                        epoch,
                    }]
                } else {
                    watch_debug!("poll: ignoring timer for epoch {}", epoch);
                    Vec::new()
                }
            }
            None => Vec::new(),
        },
        Msg::JobFetched { epoch, result } => job_fetched(&mut state, epoch, result),
        Msg::FilterChanged(query) => {
            if let Some(job) = state.job.as_mut() {
                if job.filter != query {
                    job.filter = query;
                    state.mark_dirty();
                }
            }
            Vec::new()
        }
        Msg::ActionRequested(action) => {
            if state.pending_confirmation.is_some() {
                watch_debug!("dispatch: ignoring {:?} while a confirmation is open", action);
                return (state, Vec::new());
            }
            let prompt = action.confirmation_prompt();
            state.pending_confirmation = Some(action);
            state.mark_dirty();
            vec![Effect::Confirm { prompt }]
        }
        Msg::ConfirmAnswered(accepted) => match state.pending_confirmation.take() {
            Some(action) => {
                state.mark_dirty();
                if accepted {
                    watch_info!("dispatch: sending {:?}", action);
                    vec![Effect::SendCommand(action)]
                } else {
                    watch_debug!("dispatch: {:?} dismissed", action);
                    Vec::new()
                }
            }
            None => Vec::new(),
        },
        Msg::CommandCompleted { action, result } => command_completed(&mut state, action, result),
        Msg::OpenLog(mailbox_id) => open_log(&mut state, mailbox_id),
        Msg::CloseLog => match state.log.take() {
            Some(old) => {
                state.mark_dirty();
                vec![Effect::CancelLogInterval {
                    generation: old.generation(),
                }]
            }
            None => Vec::new(),
        },
        Msg::LogTick { generation } => match state.log.as_mut() {
            Some(log) if log.generation() == generation => {
                if log.begin_fetch() {
                    vec![Effect::FetchLog {
                        mailbox_id: log.mailbox_id(),
                        generation,
                    }]
                } else {
                    Vec::new()
                }
            }
            _ => Vec::new(),
        },
        Msg::LogFetched {
            mailbox_id,
            generation,
            result,
        } => {
            log_fetched(&mut state, mailbox_id, generation, result);
            Vec::new()
        }
        Msg::LogScrolled { offset } => {
            if let Some(log) = state.log.as_mut() {
                log.scroll_to(offset);
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::LogViewportResized { height } => {
            if let Some(log) = state.log.as_mut() {
                log.resize_viewport(height);
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::AutoScrollToggled(enabled) => {
            if let Some(log) = state.log.as_mut() {
                log.set_auto_scroll(enabled);
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::RefreshDashboard => refresh_dashboard(&mut state),
        Msg::DashboardFetched(result) => {
            dashboard_fetched(&mut state, result);
            Vec::new()
        }
        Msg::DismissToast(id) => {
            if state.toasts.dismiss(id) {
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::Tick { now_ms } => {
            state.now_ms = state.now_ms.max(now_ms);
            if state.toasts.expire(state.now_ms) {
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

fn open_job(state: &mut AppState, job_id: JobId) -> Vec<Effect> {
    let same_job = state.job.as_ref().is_some_and(|job| job.job_id == job_id);
    if !same_job {
        state.retire_job_view();
        let floor = state.retired_epoch;
        state.job = Some(JobView::new(job_id, floor));
        state.mark_dirty();
    }
    start_polling(state)
}

fn start_polling(state: &mut AppState) -> Vec<Effect> {
    let Some(job) = state.job.as_mut() else {
        return Vec::new();
    };
    match job.poll.start() {
        StartOutcome::Started { epoch } => {
            watch_info!("poll: started for job {} (epoch {})", job.job_id, epoch);
            let effect = Effect::FetchJob {
                job_id: job.job_id.clone(),
                epoch,
            };
            state.mark_dirty();
            vec![effect]
        }
        StartOutcome::AlreadyActive => {
            watch_debug!("poll: already active for job {}", job.job_id);
            Vec::new()
        }
        StartOutcome::Resumed => {
            watch_debug!("poll: resume requested for job {}", job.job_id);
            Vec::new()
        }
        StartOutcome::Reattached => {
            watch_debug!(
                "poll: job {} restarted with a fetch outstanding (epoch {})",
                job.job_id,
                job.poll.epoch()
            );
            state.mark_dirty();
            Vec::new()
        }
    }
}

fn job_fetched(
    state: &mut AppState,
    epoch: u64,
    result: Result<JobSnapshot, FetchFailure>,
) -> Vec<Effect> {
    let delay = state.settings.poll.interval;
    let Some(job) = state.job.as_mut() else {
        return Vec::new();
    };
    if !job.poll.accepts(epoch) {
        watch_debug!(
            "poll: discarding answer for epoch {} (current {})",
            epoch,
            job.poll.epoch()
        );
        return Vec::new();
    }

    let effects = match result {
        Ok(snapshot) => {
            let decision = job.poll.on_snapshot(&snapshot);
            job.snapshot = Some(snapshot);
            job.error = None;
            match decision {
                CycleDecision::Continue => vec![Effect::SchedulePoll { epoch, delay }],
                CycleDecision::Stop => {
                    watch_info!("poll: job {} settled; loop idle", job.job_id);
                    Vec::new()
                }
            }
        }
        Err(failure) => {
            watch_warn!("poll: fetching job {} failed: {}", job.job_id, failure);
            job.poll.on_failure();
            job.error = Some(failure);
            Vec::new()
        }
    };
    state.mark_dirty();
    effects
}

fn command_completed(
    state: &mut AppState,
    action: Action,
    result: Result<(), CommandRejection>,
) -> Vec<Effect> {
    if let Err(rejection) = result {
        watch_warn!("dispatch: {:?} rejected: {:?}", action, rejection);
        let message = action.failure_message(&rejection);
        state.notify(ToastKind::Error, message);
        return Vec::new();
    }

    let (kind, message) = action.success_toast();
    state.notify(kind, message);
    match action {
        Action::Retry(mailbox_id) => retry_acknowledged(state, mailbox_id),
        Action::DeleteAllJobs => refresh_dashboard(state),
        Action::Stop(_) | Action::CancelAll(_) => Vec::new(),
    }
}

/// The server may need a cycle before the retried mailbox shows as running
/// again, so the loop must not stop on its next terminal-looking read.
fn retry_acknowledged(state: &mut AppState, mailbox_id: MailboxId) -> Vec<Effect> {
    let policy = state.settings.poll.retry_resume;
    let Some(job) = state.job.as_mut() else {
        return Vec::new();
    };
    if job.poll.is_active() {
        job.poll.request_force_continue();
        job.poll.await_mailbox(policy, mailbox_id);
        return Vec::new();
    }
    let effects = start_polling(state);
    if let Some(job) = state.job.as_mut() {
        // Reattached to a fetch sent before the retry: its answer may predate it.
        if effects.is_empty() && job.poll.is_active() {
            job.poll.request_force_continue();
        }
        job.poll.await_mailbox(policy, mailbox_id);
    }
    effects
}

fn open_log(state: &mut AppState, mailbox_id: MailboxId) -> Vec<Effect> {
    let mut effects = Vec::with_capacity(3);
    if let Some(old) = state.log.take() {
        effects.push(Effect::CancelLogInterval {
            generation: old.generation(),
        });
    }
    state.log_generation += 1;
    let generation = state.log_generation;
    state.log = Some(LogViewState::open(mailbox_id, generation, &state.settings.log));
    state.mark_dirty();

    effects.push(Effect::FetchLog {
        mailbox_id,
        generation,
    });
    effects.push(Effect::StartLogInterval {
        mailbox_id,
        generation,
        every: state.settings.log.interval,
    });
    effects
}

fn log_fetched(
    state: &mut AppState,
    mailbox_id: MailboxId,
    generation: u64,
    result: Result<String, FetchFailure>,
) {
    let settings = state.settings.log.clone();
    let Some(log) = state.log.as_mut().filter(|log| log.matches(mailbox_id, generation)) else {
        watch_debug!(
            "log: discarding answer for mailbox {} (generation {})",
            mailbox_id,
            generation
        );
        return;
    };

    match result {
        Ok(text) => {
            log.apply_text(text, &settings);
            state.mark_dirty();
        }
        Err(failure) => {
            watch_warn!("log: fetching mailbox {} log failed: {}", mailbox_id, failure);
            if log.record_failure(&settings) {
                let streak = log.consecutive_failures();
                state.notify(
                    ToastKind::Warning,
                    format!(
                        "Log for mailbox {mailbox_id} is not updating ({streak} failed fetches)"
                    ),
                );
            }
        }
    }
}

fn refresh_dashboard(state: &mut AppState) -> Vec<Effect> {
    if state.dashboard.loading {
        return Vec::new();
    }
    state.dashboard.loading = true;
    state.mark_dirty();
    vec![Effect::FetchDashboard]
}

fn dashboard_fetched(state: &mut AppState, result: Result<Dashboard, FetchFailure>) {
    let dash = &mut state.dashboard;
    dash.loading = false;
    dash.loaded = true;
    match result {
        Ok(Dashboard { jobs, stats }) => {
            dash.jobs = jobs;
            dash.stats = stats;
            dash.error = None;
        }
        Err(failure) => {
            watch_warn!("dashboard: loading jobs failed: {}", failure);
            dash.error = Some(failure);
        }
    }
    state.mark_dirty();
}
