use chrono::{DateTime, Local, TimeZone};
use imagen_core::{update, AppState, Clock, Msg};
use pretty_assertions::assert_eq;

fn morning() -> DateTime<Local> {
    Local.with_ymd_and_hms(2024, 5, 17, 9, 5, 7).unwrap()
}

fn afternoon() -> DateTime<Local> {
    Local.with_ymd_and_hms(2024, 5, 17, 14, 30, 0).unwrap()
}

#[test]
fn entries_are_stamped_when_recorded() {
    let state = AppState::new().with_clock(Clock(morning));
    let (state, _) = update(
        state,
        Msg::BackendReady {
            model: "imagen-test".to_string(),
        },
    );

    let view = state.view();
    let entry = view.log.last().unwrap();
    assert_eq!(entry.at, morning());
    assert_eq!(entry.to_string(), "[09:05:07] Image backend ready: imagen-test");
}

#[test]
fn earlier_entries_keep_their_time() {
    let state = AppState::new().with_clock(Clock(morning));
    let (state, _) = update(state, Msg::PromptsEdited("a fox".to_string()));
    let (state, _) = update(state, Msg::ClearPromptsClicked);
    let (state, _) = update(state, Msg::ConfirmationAnswered(true));

    let state = state.with_clock(Clock(afternoon));
    let (state, _) = update(
        state,
        Msg::BackendFailed {
            message: "offline".to_string(),
        },
    );

    let lines: Vec<String> = state.view().log.iter().map(ToString::to_string).collect();
    assert_eq!(
        lines,
        vec![
            "[09:05:07] Prompts cleared".to_string(),
            "[14:30:00] Initialization error: offline".to_string(),
        ]
    );
}
