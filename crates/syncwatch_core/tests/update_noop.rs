use syncwatch_core::{update, AppState, Msg};

#[test]
fn update_is_noop() {
    let state = AppState::new();
    let (next, effects) = update(state.clone(), Msg::NoOp);

    assert_eq!(state, next);
    assert!(effects.is_empty());
}

#[test]
fn messages_without_open_views_are_ignored() {
    let state = AppState::new();
    for msg in [
        Msg::StartPolling,
        Msg::StopPolling,
        Msg::PollTimerFired { epoch: 1 },
        Msg::CloseLog,
        Msg::LogTick { generation: 1 },
        Msg::LogScrolled { offset: 10 },
        Msg::ConfirmAnswered(true),
    ] {
        let (next, effects) = update(state.clone(), msg);
        assert_eq!(next, state);
        assert!(effects.is_empty());
    }
}
