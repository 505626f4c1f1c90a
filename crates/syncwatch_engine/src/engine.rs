use std::collections::HashMap;
use std::sync::{mpsc, Arc, Mutex};
use std::time::Duration;

use syncwatch_core::{Action, MailboxId};
use syncwatch_logging::{watch_debug, watch_info, watch_warn};
use tokio::runtime::Runtime;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::client::{ActionGateway, ClientSettings, HttpClient, StatusSource};
use crate::{EngineEvent, FetchError};

pub trait EventSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

pub struct ChannelEventSink {
    tx: mpsc::Sender<EngineEvent>,
}

impl ChannelEventSink {
    pub fn new(tx: mpsc::Sender<EngineEvent>) -> Self {
        Self { tx }
    }
}

impl EventSink for ChannelEventSink {
    fn emit(&self, event: EngineEvent) {
        let _ = self.tx.send(event);
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("failed to start async runtime: {0}")]
    Runtime(#[from] std::io::Error),
    #[error("invalid service settings: {0}")]
    Client(#[from] FetchError),
}

/// Executes requests and timers off the caller's thread and reports every
/// outcome through the [`EventSink`]. Nothing here decides whether a result
/// is still wanted; stale answers are filtered by the receiver.
pub struct EngineHandle {
    runtime: Runtime,
    source: Arc<dyn StatusSource>,
    gateway: Arc<dyn ActionGateway>,
    sink: Arc<dyn EventSink>,
    intervals: Mutex<HashMap<u64, CancellationToken>>,
}

impl EngineHandle {
    pub fn new(settings: ClientSettings, sink: Arc<dyn EventSink>) -> Result<Self, EngineError> {
        let client = Arc::new(HttpClient::new(settings)?);
        Self::with_backends(client.clone(), client, sink)
    }

    pub fn with_backends(
        source: Arc<dyn StatusSource>,
        gateway: Arc<dyn ActionGateway>,
        sink: Arc<dyn EventSink>,
    ) -> Result<Self, EngineError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("syncwatch-engine")
            .enable_all()
            .build()?;
        Ok(Self {
            runtime,
            source,
            gateway,
            sink,
            intervals: Mutex::new(HashMap::new()),
        })
    }

    pub fn source(&self) -> Arc<dyn StatusSource> {
        self.source.clone()
    }

    /// Blocks the calling thread on `future` using the engine's runtime.
    pub fn block_on<F: std::future::Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }

    pub fn fetch_job(&self, job_id: String, epoch: u64) {
        let source = self.source.clone();
        let sink = self.sink.clone();
        self.runtime.spawn(async move {
            let result = source.job(&job_id).await;
            if let Err(err) = &result {
                watch_debug!("Job {job_id} fetch failed (epoch {epoch}): {err}");
            }
            sink.emit(EngineEvent::JobFetched { epoch, result });
        });
    }

    pub fn schedule_poll(&self, epoch: u64, delay: Duration) {
        let sink = self.sink.clone();
        self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            sink.emit(EngineEvent::PollDue { epoch });
        });
    }

    pub fn fetch_log(&self, mailbox_id: MailboxId, generation: u64) {
        let source = self.source.clone();
        let sink = self.sink.clone();
        self.runtime.spawn(async move {
            let result = source.mailbox_log(mailbox_id).await;
            sink.emit(EngineEvent::LogFetched {
                mailbox_id,
                generation,
                result,
            });
        });
    }

    /// Emits `LogTick` every `every` until cancelled. The first tick comes one
    /// period after the call; the opening fetch is requested separately.
    pub fn start_log_interval(&self, mailbox_id: MailboxId, generation: u64, every: Duration) {
        let token = CancellationToken::new();
        let previous = self.lock_intervals().insert(generation, token.clone());
        if let Some(previous) = previous {
            previous.cancel();
        }
        watch_debug!("Log interval {generation} started for mailbox {mailbox_id}");

        let sink = self.sink.clone();
        self.runtime.spawn(async move {
            let start = tokio::time::Instant::now() + every;
            let mut ticker = tokio::time::interval_at(start, every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => sink.emit(EngineEvent::LogTick { generation }),
                }
            }
        });
    }

    pub fn cancel_log_interval(&self, generation: u64) {
        match self.lock_intervals().remove(&generation) {
            Some(token) => {
                token.cancel();
                watch_debug!("Log interval {generation} cancelled");
            }
            None => watch_debug!("Log interval {generation} already gone"),
        }
    }

    pub fn send_command(&self, action: Action) {
        let gateway = self.gateway.clone();
        let sink = self.sink.clone();
        self.runtime.spawn(async move {
            let result = match &action {
                Action::Stop(id) => gateway.stop_mailbox(*id).await,
                Action::Retry(id) => gateway.retry_mailbox(*id).await,
                Action::CancelAll(job_id) => gateway.cancel_job(job_id).await,
                Action::DeleteAllJobs => gateway.delete_all_jobs().await,
            };
            match &result {
                Ok(()) => watch_info!("{action:?} accepted"),
                Err(err) => watch_warn!("{action:?} failed: {err}"),
            }
            sink.emit(EngineEvent::CommandCompleted { action, result });
        });
    }

    pub fn fetch_dashboard(&self) {
        let source = self.source.clone();
        let sink = self.sink.clone();
        self.runtime.spawn(async move {
            let result = source.dashboard().await;
            sink.emit(EngineEvent::DashboardFetched(result));
        });
    }

    fn lock_intervals(&self) -> std::sync::MutexGuard<'_, HashMap<u64, CancellationToken>> {
        self.intervals
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Drop for EngineHandle {
    fn drop(&mut self) {
        for (_, token) in self.lock_intervals().drain() {
            token.cancel();
        }
    }
}
