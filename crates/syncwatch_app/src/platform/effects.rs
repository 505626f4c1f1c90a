use std::io::{self, BufRead, Write};
use std::sync::mpsc;

use syncwatch_core::{Effect, Msg};
use syncwatch_engine::{EngineEvent, EngineHandle, EventSink};
use syncwatch_logging::{watch_debug, watch_warn};

use super::app::Inbound;

/// How `Effect::Confirm` gets its answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmMode {
    /// `--yes`: accept without asking.
    AutoAccept,
    /// Ask on stdin and block until answered.
    Ask,
    /// The prompt is rendered; the answer arrives later as typed input.
    FromInput,
}

/// Forwards engine events into the app inbox as core messages.
pub struct InboxSink {
    tx: mpsc::Sender<Inbound>,
}

impl InboxSink {
    pub fn new(tx: mpsc::Sender<Inbound>) -> Self {
        Self { tx }
    }
}

impl EventSink for InboxSink {
    fn emit(&self, event: EngineEvent) {
        let _ = self.tx.send(Inbound::Msg(engine_event_to_msg(event)));
    }
}

pub fn engine_event_to_msg(event: EngineEvent) -> Msg {
    match event {
        EngineEvent::JobFetched { epoch, result } => Msg::JobFetched {
            epoch,
            result: result.map_err(Into::into),
        },
        EngineEvent::PollDue { epoch } => Msg::PollTimerFired { epoch },
        EngineEvent::LogFetched {
            mailbox_id,
            generation,
            result,
        } => Msg::LogFetched {
            mailbox_id,
            generation,
            result: result.map_err(Into::into),
        },
        EngineEvent::LogTick { generation } => Msg::LogTick { generation },
        EngineEvent::CommandCompleted { action, result } => Msg::CommandCompleted {
            action,
            result: result.map_err(Into::into),
        },
        EngineEvent::DashboardFetched(result) => Msg::DashboardFetched(result.map_err(Into::into)),
    }
}

pub struct EffectRunner {
    engine: EngineHandle,
    confirm: ConfirmMode,
    commands_in_flight: usize,
}

impl EffectRunner {
    pub fn new(engine: EngineHandle, confirm: ConfirmMode) -> Self {
        Self {
            engine,
            confirm,
            commands_in_flight: 0,
        }
    }

    pub fn engine(&self) -> &EngineHandle {
        &self.engine
    }

    pub fn commands_in_flight(&self) -> usize {
        self.commands_in_flight
    }

    pub fn command_completed(&mut self) {
        self.commands_in_flight = self.commands_in_flight.saturating_sub(1);
    }

    /// Executes `effects`. Returns messages that must be handled before
    /// anything else in the inbox, such as an answer given synchronously.
    pub fn run(&mut self, effects: Vec<Effect>) -> Vec<Msg> {
        let mut immediate = Vec::new();
        for effect in effects {
            watch_debug!("effect {:?}", effect);
            match effect {
                Effect::FetchJob { job_id, epoch } => self.engine.fetch_job(job_id, epoch),
                Effect::SchedulePoll { epoch, delay } => self.engine.schedule_poll(epoch, delay),
                Effect::Confirm { prompt } => match self.confirm {
                    ConfirmMode::AutoAccept => immediate.push(Msg::ConfirmAnswered(true)),
                    ConfirmMode::Ask => immediate.push(Msg::ConfirmAnswered(ask(&prompt))),
                    ConfirmMode::FromInput => {}
                },
                Effect::SendCommand(action) => {
                    self.commands_in_flight += 1;
                    self.engine.send_command(action);
                }
                Effect::FetchLog {
                    mailbox_id,
                    generation,
                } => self.engine.fetch_log(mailbox_id, generation),
                Effect::StartLogInterval {
                    mailbox_id,
                    generation,
                    every,
                } => self.engine.start_log_interval(mailbox_id, generation, every),
                Effect::CancelLogInterval { generation } => {
                    self.engine.cancel_log_interval(generation)
                }
                Effect::FetchDashboard => self.engine.fetch_dashboard(),
            }
        }
        immediate
    }
}

fn ask(prompt: &str) -> bool {
    print!("{prompt} [y/N] ");
    let _ = io::stdout().flush();
    let mut answer = String::new();
    if let Err(err) = io::stdin().lock().read_line(&mut answer) {
        watch_warn!("Could not read confirmation: {err}");
        return false;
    }
    is_yes(&answer)
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

#[cfg(test)]
mod tests {
    use syncwatch_core::{Action, CommandRejection, FailureClass};
    use syncwatch_engine::{CommandError, FailureKind, FetchError};

    use super::*;

    #[test]
    fn engine_failures_become_core_failures() {
        let msg = engine_event_to_msg(EngineEvent::JobFetched {
            epoch: 2,
            result: Err(FetchError {
                kind: FailureKind::NotFound,
                message: "404 Not Found".into(),
            }),
        });
        match msg {
            Msg::JobFetched {
                epoch: 2,
                result: Err(failure),
            } => assert_eq!(failure.class, FailureClass::NotFound),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn command_rejection_keeps_detail() {
        let msg = engine_event_to_msg(EngineEvent::CommandCompleted {
            action: Action::Retry(4),
            result: Err(CommandError::Rejected {
                status: 400,
                detail: Some("Mailbox is running".into()),
            }),
        });
        assert_eq!(
            msg,
            Msg::CommandCompleted {
                action: Action::Retry(4),
                result: Err(CommandRejection {
                    status: Some(400),
                    detail: Some("Mailbox is running".into()),
                }),
            }
        );
    }

    #[test]
    fn timers_map_to_their_messages() {
        assert_eq!(
            engine_event_to_msg(EngineEvent::PollDue { epoch: 9 }),
            Msg::PollTimerFired { epoch: 9 }
        );
        assert_eq!(
            engine_event_to_msg(EngineEvent::LogTick { generation: 3 }),
            Msg::LogTick { generation: 3 }
        );
    }

    #[test]
    fn only_explicit_yes_confirms() {
        assert!(is_yes("y\n"));
        assert!(is_yes(" YES "));
        assert!(!is_yes("\n"));
        assert!(!is_yes("yep"));
    }
}
