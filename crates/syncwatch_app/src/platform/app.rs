use std::collections::VecDeque;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{bail, Context};
use chrono::{Local, Utc};
use syncwatch_core::{update, Action, AppState, AppViewModel, JobId, MailboxId, Msg, ToastKind};
use syncwatch_engine::{export_job_logs, EngineHandle, ExportOptions};
use syncwatch_logging::{watch_debug, watch_info};

use super::config::AppConfig;
use super::effects::{ConfirmMode, EffectRunner, InboxSink};
use super::ui::input::{parse_line, Input, HELP};
use super::ui::render::{render_dashboard, render_toasts, Renderer};

const TICK_INTERVAL: Duration = Duration::from_millis(250);

/// Everything the event loop consumes, in arrival order.
pub enum Inbound {
    Msg(Msg),
    Line(String),
    Quit,
}

/// One `AppState` plus the runtime that executes its effects.
struct Session {
    state: AppState,
    runner: EffectRunner,
    inbox: mpsc::Receiver<Inbound>,
    tx: mpsc::Sender<Inbound>,
    started: Instant,
}

impl Session {
    fn start(config: &AppConfig, confirm: ConfirmMode) -> anyhow::Result<Self> {
        let (tx, inbox) = mpsc::channel();
        let sink = Arc::new(InboxSink::new(tx.clone()));
        let engine =
            EngineHandle::new(config.client_settings(), sink).context("starting the engine")?;
        Ok(Self {
            state: AppState::with_settings(config.core_settings()),
            runner: EffectRunner::new(engine, confirm),
            inbox,
            tx,
            started: Instant::now(),
        })
    }

    fn dispatch(&mut self, msg: Msg) {
        let mut queue = VecDeque::from([msg]);
        while let Some(msg) = queue.pop_front() {
            if matches!(msg, Msg::CommandCompleted { .. }) {
                self.runner.command_completed();
            }
            let (state, effects) = update(std::mem::take(&mut self.state), msg);
            self.state = state;
            queue.extend(self.runner.run(effects));
        }
    }

    /// Feeds inbox messages through `update` until `done` holds. `on_line`
    /// turns typed input into messages. Returns `false` if the user quit.
    fn run_until(
        &mut self,
        mut done: impl FnMut(&Session) -> bool,
        mut on_line: impl FnMut(&AppState, &str) -> Input,
        mut on_change: impl FnMut(&AppViewModel),
    ) -> bool {
        loop {
            if done(self) {
                return true;
            }
            let Ok(inbound) = self.inbox.recv() else {
                return false;
            };
            match inbound {
                Inbound::Msg(msg) => self.dispatch(msg),
                Inbound::Line(line) => match on_line(&self.state, &line) {
                    Input::Msg(msg) => self.dispatch(msg),
                    Input::Quit => return false,
                    Input::Help => println!("{HELP}"),
                    Input::Invalid(reason) => println!("{reason}"),
                },
                Inbound::Quit => return false,
            }
            if self.state.consume_dirty() {
                on_change(&self.state.view());
            }
        }
    }

    fn spawn_ticker(&self) {
        let tx = self.tx.clone();
        let started = self.started;
        thread::spawn(move || loop {
            thread::sleep(TICK_INTERVAL);
            let now_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
            if tx.send(Inbound::Msg(Msg::Tick { now_ms })).is_err() {
                break;
            }
        });
    }

    /// Reads stdin lines into the inbox. End of input quits when `quit_on_eof`.
    fn spawn_input(&self, quit_on_eof: bool) {
        let tx = self.tx.clone();
        thread::spawn(move || {
            let stdin = io::stdin();
            for line in stdin.lock().lines() {
                let Ok(line) = line else { break };
                if tx.send(Inbound::Line(line)).is_err() {
                    return;
                }
            }
            watch_debug!("stdin closed");
            if quit_on_eof {
                let _ = tx.send(Inbound::Quit);
            }
        });
    }

    fn print_toasts(&self) {
        let mut out = String::new();
        render_toasts(&mut out, &self.state.view().toasts);
        print!("{out}");
    }

    fn has_error_toast(&self) -> bool {
        self.state
            .toasts()
            .iter()
            .any(|toast| toast.kind == ToastKind::Error)
    }
}

/// Interactive job detail: live polling, commands on stdin, optional log pane.
pub fn run_watch(config: &AppConfig, job_id: JobId, auto_confirm: bool) -> anyhow::Result<()> {
    let confirm = if auto_confirm {
        ConfirmMode::AutoAccept
    } else {
        ConfirmMode::FromInput
    };
    let mut session = Session::start(config, confirm)?;
    session.spawn_ticker();
    session.spawn_input(true);
    watch_info!("Watching job {job_id}");
    println!("Watching job {job_id}. Type `help` for commands.");

    let renderer = Renderer {
        line_height: config.log_line_height.max(1),
    };
    session.dispatch(Msg::OpenJob(job_id.clone()));
    session.run_until(
        |_| false,
        |state, line| {
            let auto_scroll = state.log().is_some_and(|log| log.auto_scroll());
            parse_line(line, &job_id, auto_scroll)
        },
        |view| {
            println!();
            print!("{}", renderer.render(view));
            let _ = io::stdout().flush();
        },
    );
    session.dispatch(Msg::CloseLog);
    session.dispatch(Msg::CloseJob);
    Ok(())
}

/// Follows one mailbox log, printing only what was appended since the last fetch.
pub fn run_logs(config: &AppConfig, mailbox_id: MailboxId) -> anyhow::Result<()> {
    let mut session = Session::start(config, ConfirmMode::AutoAccept)?;
    session.spawn_input(false);
    session.dispatch(Msg::OpenLog(mailbox_id));

    let mut printed = String::new();
    let mut degraded = false;
    session.run_until(
        |_| false,
        |_, line| match line.trim() {
            "quit" | "q" | "exit" => Input::Quit,
            _ => Input::Msg(Msg::NoOp),
        },
        |view| {
            let Some(log) = &view.log else { return };
            if log.degraded && !degraded {
                eprintln!("(log for mailbox {mailbox_id} is not updating; retrying)");
            }
            degraded = log.degraded;
            let Some(text) = &log.text else { return };
            match text.strip_prefix(printed.as_str()) {
                Some(appended) => print!("{appended}"),
                None => {
                    println!("--- log restarted ---");
                    print!("{text}");
                }
            }
            let _ = io::stdout().flush();
            printed.clone_from(text);
        },
    );
    session.dispatch(Msg::CloseLog);
    Ok(())
}

pub fn run_jobs(config: &AppConfig) -> anyhow::Result<()> {
    let mut session = Session::start(config, ConfirmMode::AutoAccept)?;
    session.dispatch(Msg::RefreshDashboard);
    session.run_until(
        |s| !s.state.view().dashboard.loading,
        |_, _| Input::Msg(Msg::NoOp),
        |_| {},
    );
    let view = session.state.view().dashboard;
    print!("{}", render_dashboard(&view));
    if let Some(error) = view.error {
        bail!("{error}");
    }
    Ok(())
}

/// Runs one operator action to completion and prints its outcome.
pub fn run_action(config: &AppConfig, action: Action, auto_confirm: bool) -> anyhow::Result<()> {
    let confirm = if auto_confirm {
        ConfirmMode::AutoAccept
    } else {
        ConfirmMode::Ask
    };
    let mut session = Session::start(config, confirm)?;
    session.dispatch(Msg::ActionRequested(action));
    session.run_until(
        |s| s.runner.commands_in_flight() == 0 && !s.state.view().dashboard.loading,
        |_, _| Input::Msg(Msg::NoOp),
        |_| {},
    );
    session.print_toasts();
    if session.has_error_toast() {
        bail!("command failed");
    }
    Ok(())
}

pub fn run_export(config: &AppConfig, job_id: &str, out: PathBuf) -> anyhow::Result<()> {
    let session = Session::start(config, ConfirmMode::AutoAccept)?;
    let options = ExportOptions {
        output_dir: out,
        exported_at: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        date: Utc::now().format("%Y-%m-%d").to_string(),
    };
    let engine = session.runner.engine();
    let source = engine.source();
    let summary = engine
        .block_on(export_job_logs(source.as_ref(), job_id, &options))
        .with_context(|| format!("exporting logs for job {job_id}"))?;

    println!(
        "Exported {} mailbox logs to {}",
        summary.mailbox_count,
        summary.output_path.display()
    );
    if summary.failed_logs > 0 {
        println!("{} logs could not be fetched; see the file for details", summary.failed_logs);
    }
    Ok(())
}
