use syncwatch_core::{Action, JobId, Msg};

/// What one line typed on stdin asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Msg(Msg),
    Quit,
    Help,
    Invalid(String),
}

pub const HELP: &str = "\
commands:
  stop N        stop mailbox N
  retry N       retry mailbox N
  cancel        stop every running mailbox in this job
  logs N        tail the log of mailbox N
  close         close the log viewer
  scroll N      move the log viewer to offset N
  autoscroll    toggle following the log tail
  filter TEXT   show mailboxes matching TEXT (empty clears)
  refresh       resume polling if it stopped
  y / n         answer a pending confirmation
  quit";

/// Parses a line typed while watching `job_id`.
pub fn parse_line(line: &str, job_id: &JobId, auto_scroll: bool) -> Input {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    match word.to_ascii_lowercase().as_str() {
        "" => Input::Msg(Msg::NoOp),
        "y" | "yes" => Input::Msg(Msg::ConfirmAnswered(true)),
        "n" | "no" => Input::Msg(Msg::ConfirmAnswered(false)),
        "stop" => mailbox_arg(rest, |id| Msg::ActionRequested(Action::Stop(id))),
        "retry" => mailbox_arg(rest, |id| Msg::ActionRequested(Action::Retry(id))),
        "logs" | "log" => mailbox_arg(rest, Msg::OpenLog),
        "cancel" => Input::Msg(Msg::ActionRequested(Action::CancelAll(job_id.clone()))),
        "close" => Input::Msg(Msg::CloseLog),
        "filter" => Input::Msg(Msg::FilterChanged(rest.to_string())),
        "autoscroll" => Input::Msg(Msg::AutoScrollToggled(!auto_scroll)),
        "refresh" => Input::Msg(Msg::StartPolling),
        "scroll" => match rest.parse::<u32>() {
            Ok(offset) => Input::Msg(Msg::LogScrolled { offset }),
            Err(_) => Input::Invalid(format!("scroll needs an offset, got {rest:?}")),
        },
        "help" | "?" => Input::Help,
        "quit" | "q" | "exit" => Input::Quit,
        other => Input::Invalid(format!("unknown command {other:?}; type help")),
    }
}

fn mailbox_arg(rest: &str, to_msg: impl FnOnce(u64) -> Msg) -> Input {
    match rest.parse::<u64>() {
        Ok(id) => Input::Msg(to_msg(id)),
        Err(_) => Input::Invalid(format!("expected a mailbox id, got {rest:?}")),
    }
}
