use std::sync::Once;
use std::time::Duration;

use pretty_assertions::assert_eq;
use syncwatch_core::{
    update, AppState, Effect, FailureClass, FetchFailure, LogView, Msg, ToastKind,
};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(syncwatch_logging::initialize_for_tests);
}

/// `lines` lines of text; with the default 16-unit line height each line adds 16 units.
fn log_text(lines: usize) -> String {
    (0..lines).map(|i| format!("line {i}\n")).collect()
}

fn open(state: AppState, mailbox_id: u64) -> (AppState, u64) {
    let (state, effects) = update(state, Msg::OpenLog(mailbox_id));
    let generation = state.log().unwrap().generation();
    assert!(effects.contains(&Effect::FetchLog {
        mailbox_id,
        generation
    }));
    (state, generation)
}

fn deliver(state: AppState, mailbox_id: u64, generation: u64, text: String) -> AppState {
    update(
        state,
        Msg::LogFetched {
            mailbox_id,
            generation,
            result: Ok(text),
        },
    )
    .0
}

fn log_view(state: &AppState) -> LogView {
    state.view().log.expect("log viewer open")
}

#[test]
fn open_fetches_immediately_and_starts_interval() {
    init_logging();
    let (_, effects) = update(AppState::new(), Msg::OpenLog(7));
    assert_eq!(
        effects,
        vec![
            Effect::FetchLog {
                mailbox_id: 7,
                generation: 1
            },
            Effect::StartLogInterval {
                mailbox_id: 7,
                generation: 1,
                every: Duration::from_millis(2000),
            },
        ]
    );
}

#[test]
fn opening_another_viewer_cancels_the_previous_interval() {
    init_logging();
    let (state, first) = open(AppState::new(), 7);
    let (state, effects) = update(state, Msg::OpenLog(8));
    assert_eq!(
        effects.first(),
        Some(&Effect::CancelLogInterval { generation: first })
    );
    assert_eq!(state.log().unwrap().mailbox_id(), 8);
}

#[test]
fn stale_result_is_not_applied_after_switching_viewer() {
    init_logging();
    let (state, gen_a) = open(AppState::new(), 1);
    let (state, gen_b) = open(state, 2);

    let state = deliver(state, 1, gen_a, "mailbox A log\n".into());
    assert_eq!(log_view(&state).text, None);

    let state = deliver(state, 2, gen_b, "mailbox B log\n".into());
    assert_eq!(log_view(&state).text.as_deref(), Some("mailbox B log\n"));

    // Same mailbox reopened: answers for the earlier generation are stale too.
    let (state, _) = open(state, 2);
    let state = deliver(state, 2, gen_b, "old\n".into());
    assert_eq!(log_view(&state).text, None);
}

#[test]
fn scroll_position_kept_when_reading_earlier_content() {
    init_logging();
    let (state, generation) = open(AppState::new(), 7);
    // 100 lines = 1600 units of content, 480 visible, bottom at 1120.
    let state = deliver(state, 7, generation, log_text(100));
    assert_eq!(log_view(&state).offset, 1120);

    // Operator scrolls 500 units above the bottom.
    let (state, _) = update(state, Msg::LogScrolled { offset: 620 });
    let (state, _) = update(state, Msg::LogTick { generation });
    let state = deliver(state, 7, generation, log_text(200));

    let view = log_view(&state);
    assert_eq!(view.offset, 620);
    assert_eq!(view.max_offset, 200 * 16 - 480);
}

#[test]
fn follows_tail_when_at_bottom() {
    init_logging();
    let (state, generation) = open(AppState::new(), 7);
    let state = deliver(state, 7, generation, log_text(100));
    // Within the 50-unit threshold of the bottom.
    let (state, _) = update(state, Msg::LogScrolled { offset: 1080 });
    let (state, _) = update(state, Msg::LogTick { generation });
    let state = deliver(state, 7, generation, log_text(150));

    let view = log_view(&state);
    assert_eq!(view.offset, 150 * 16 - 480);
    assert_eq!(view.offset, view.max_offset);
}

#[test]
fn auto_scroll_off_keeps_position_even_at_bottom() {
    init_logging();
    let (state, generation) = open(AppState::new(), 7);
    let state = deliver(state, 7, generation, log_text(100));
    let (state, _) = update(state, Msg::AutoScrollToggled(false));
    let (state, _) = update(state, Msg::LogTick { generation });
    let state = deliver(state, 7, generation, log_text(150));
    assert_eq!(log_view(&state).offset, 1120);
}

#[test]
fn tick_while_fetch_outstanding_is_skipped() {
    init_logging();
    let (state, generation) = open(AppState::new(), 7);
    let (state, effects) = update(state, Msg::LogTick { generation });
    assert!(effects.is_empty());

    let state = deliver(state, 7, generation, log_text(1));
    let (state, effects) = update(state, Msg::LogTick { generation });
    assert_eq!(
        effects,
        vec![Effect::FetchLog {
            mailbox_id: 7,
            generation
        }]
    );
    // Ticks from a cancelled interval do nothing.
    let (_, effects) = update(state, Msg::LogTick { generation: 99 });
    assert!(effects.is_empty());
}

#[test]
fn failures_are_silent_until_streak_threshold() {
    init_logging();
    let (mut state, generation) = open(AppState::new(), 7);
    for attempt in 1..=4 {
        if attempt > 1 {
            state = update(state, Msg::LogTick { generation }).0;
        }
        state = update(
            state,
            Msg::LogFetched {
                mailbox_id: 7,
                generation,
                result: Err(FetchFailure::new(FailureClass::Transport, "connection reset")),
            },
        )
        .0;
        let toasts = state.view().toasts;
        if attempt < 3 {
            assert!(toasts.is_empty());
        } else {
            assert_eq!(toasts.len(), 1);
            assert_eq!(toasts[0].kind, ToastKind::Warning);
        }
    }
    assert!(log_view(&state).degraded);

    // Tailing carries on after failures.
    let (state, effects) = update(state, Msg::LogTick { generation });
    assert_eq!(effects.len(), 1);
    let state = deliver(state, 7, generation, log_text(3));
    assert!(!log_view(&state).degraded);
}

#[test]
fn close_is_idempotent() {
    init_logging();
    let (state, generation) = open(AppState::new(), 7);
    let (state, effects) = update(state, Msg::CloseLog);
    assert_eq!(effects, vec![Effect::CancelLogInterval { generation }]);
    assert!(state.view().log.is_none());

    let (state, effects) = update(state, Msg::CloseLog);
    assert!(effects.is_empty());
    let state = deliver(state, 7, generation, "late\n".into());
    assert!(state.view().log.is_none());
}

#[test]
fn viewport_resize_reclamps_offset() {
    init_logging();
    let (state, generation) = open(AppState::new(), 7);
    let state = deliver(state, 7, generation, log_text(40));
    assert_eq!(log_view(&state).offset, 40 * 16 - 480);
    let (state, _) = update(state, Msg::LogViewportResized { height: 800 });
    assert_eq!(log_view(&state).offset, 0);
}
