use std::sync::{mpsc, Arc, Mutex};
use std::time::Duration;

use syncwatch_core::{
    Action, JobSnapshot, JobStatus, JobSummary, MailboxId, SystemStats,
};
use syncwatch_engine::{
    ActionGateway, ChannelEventSink, CommandError, EngineEvent, EngineHandle, FailureKind,
    FetchError, StatusSource,
};

const WAIT: Duration = Duration::from_secs(2);

#[derive(Default)]
struct Fake {
    commands: Mutex<Vec<Action>>,
}

#[async_trait::async_trait]
impl StatusSource for Fake {
    async fn job(&self, job_id: &str) -> Result<JobSnapshot, FetchError> {
        Ok(JobSnapshot {
            id: job_id.to_string(),
            name: None,
            status: JobStatus::Running,
            progress: 0,
            source: String::new(),
            target: String::new(),
            total: 0,
            completed: 0,
            failed: 0,
            data_transferred: None,
            created_at: None,
            mailboxes: Vec::new(),
        })
    }

    async fn mailbox_log(&self, mailbox_id: MailboxId) -> Result<String, FetchError> {
        Ok(format!("log {mailbox_id}"))
    }

    async fn jobs(&self) -> Result<Vec<JobSummary>, FetchError> {
        Ok(Vec::new())
    }

    async fn stats(&self) -> Result<SystemStats, FetchError> {
        Err(FetchError {
            kind: FailureKind::HttpStatus(500),
            message: "boom".into(),
        })
    }
}

#[async_trait::async_trait]
impl ActionGateway for Fake {
    async fn stop_mailbox(&self, mailbox_id: MailboxId) -> Result<(), CommandError> {
        self.commands.lock().unwrap().push(Action::Stop(mailbox_id));
        Ok(())
    }

    async fn retry_mailbox(&self, _mailbox_id: MailboxId) -> Result<(), CommandError> {
        Err(CommandError::Rejected {
            status: 409,
            detail: Some("busy".into()),
        })
    }

    async fn cancel_job(&self, job_id: &str) -> Result<(), CommandError> {
        self.commands
            .lock()
            .unwrap()
            .push(Action::CancelAll(job_id.to_string()));
        Ok(())
    }

    async fn delete_all_jobs(&self) -> Result<(), CommandError> {
        Ok(())
    }
}

fn engine() -> (EngineHandle, mpsc::Receiver<EngineEvent>, Arc<Fake>) {
    let (tx, rx) = mpsc::channel();
    let fake = Arc::new(Fake::default());
    let handle = EngineHandle::with_backends(
        fake.clone(),
        fake.clone(),
        Arc::new(ChannelEventSink::new(tx)),
    )
    .expect("engine");
    (handle, rx, fake)
}

#[test]
fn fetch_results_carry_their_tags() {
    let (engine, rx, _) = engine();
    engine.fetch_job("j1".into(), 4);
    match rx.recv_timeout(WAIT).unwrap() {
        EngineEvent::JobFetched { epoch, result } => {
            assert_eq!(epoch, 4);
            assert_eq!(result.unwrap().id, "j1");
        }
        other => panic!("unexpected {other:?}"),
    }

    engine.fetch_log(9, 2);
    assert_eq!(
        rx.recv_timeout(WAIT).unwrap(),
        EngineEvent::LogFetched {
            mailbox_id: 9,
            generation: 2,
            result: Ok("log 9".into()),
        }
    );
}

#[test]
fn scheduled_poll_fires_after_delay() {
    let (engine, rx, _) = engine();
    engine.schedule_poll(3, Duration::from_millis(50));
    assert_eq!(
        rx.recv_timeout(WAIT).unwrap(),
        EngineEvent::PollDue { epoch: 3 }
    );
}

#[test]
fn log_interval_ticks_until_cancelled() {
    let (engine, rx, _) = engine();
    engine.start_log_interval(7, 1, Duration::from_millis(20));
    for _ in 0..3 {
        assert_eq!(
            rx.recv_timeout(WAIT).unwrap(),
            EngineEvent::LogTick { generation: 1 }
        );
    }
    engine.cancel_log_interval(1);
    // Drain anything emitted before cancellation landed.
    std::thread::sleep(Duration::from_millis(60));
    while rx.try_recv().is_ok() {}
    assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());

    // Cancelling twice is harmless.
    engine.cancel_log_interval(1);
}

#[test]
fn commands_report_outcome() {
    let (engine, rx, fake) = engine();
    engine.send_command(Action::Stop(5));
    assert_eq!(
        rx.recv_timeout(WAIT).unwrap(),
        EngineEvent::CommandCompleted {
            action: Action::Stop(5),
            result: Ok(()),
        }
    );
    engine.send_command(Action::Retry(5));
    assert_eq!(
        rx.recv_timeout(WAIT).unwrap(),
        EngineEvent::CommandCompleted {
            action: Action::Retry(5),
            result: Err(CommandError::Rejected {
                status: 409,
                detail: Some("busy".into()),
            }),
        }
    );
    assert_eq!(*fake.commands.lock().unwrap(), vec![Action::Stop(5)]);
}

#[test]
fn dashboard_without_stats_still_arrives() {
    let (engine, rx, _) = engine();
    engine.fetch_dashboard();
    match rx.recv_timeout(WAIT).unwrap() {
        EngineEvent::DashboardFetched(Ok(dashboard)) => {
            assert!(dashboard.jobs.is_empty());
            assert!(dashboard.stats.is_none());
        }
        other => panic!("unexpected {other:?}"),
    }
}
