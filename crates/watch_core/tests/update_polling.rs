use std::sync::Once;
use std::time::Duration;

use pretty_assertions::assert_eq;
use watch_core::{
    update, CycleOutcome, DelayReason, Effect, Msg, Notification, Phase, PollSettings, PollState,
    Termination,
};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(watch_logging::initialize_for_tests);
}

fn polling(settings: PollSettings) -> PollState {
    let (state, _) = update(PollState::new(settings), Msg::Start);
    let (state, _) = update(state, Msg::IdentityChecked { reachable: true });
    state
}

fn complete(state: PollState, outcome: CycleOutcome) -> (PollState, Vec<Effect>) {
    update(state, Msg::CycleCompleted(outcome))
}

fn poll_sleep() -> Effect {
    Effect::Sleep {
        delay: Duration::from_secs(300),
        reason: DelayReason::PollInterval,
    }
}

#[test]
fn not_found_sleeps_poll_interval() {
    init_logging();
    let state = polling(PollSettings::default());

    let (state, effects) = complete(state, CycleOutcome::NotFound);

    assert_eq!(state.check_count(), 1);
    assert_eq!(effects, vec![poll_sleep()]);

    let (state, effects) = update(state, Msg::DelayElapsed);
    assert_eq!(state.phase(), Phase::Polling);
    assert_eq!(effects, vec![Effect::BeginCycle]);
}

#[test]
fn fetch_failure_uses_short_retry_and_still_counts() {
    init_logging();
    let mut state = polling(PollSettings::default());

    for expected in 1..=3 {
        let (next, effects) = complete(
            state,
            CycleOutcome::FetchFailed {
                reason: "timeout".into(),
            },
        );
        assert_eq!(next.check_count(), expected);
        assert_eq!(
            effects,
            vec![Effect::Sleep {
                delay: Duration::from_secs(30),
                reason: DelayReason::FetchRetry,
            }]
        );
        let (next, _) = update(next, Msg::DelayElapsed);
        state = next;
    }

    assert_eq!(state.phase(), Phase::Polling);
}

#[test]
fn unexpected_failure_uses_error_recovery_delay() {
    init_logging();
    let state = polling(PollSettings::default());

    let (state, effects) = complete(
        state,
        CycleOutcome::Unexpected {
            reason: "panic".into(),
        },
    );

    assert_eq!(state.phase(), Phase::Polling);
    assert_eq!(state.check_count(), 1);
    assert_eq!(
        effects,
        vec![Effect::Sleep {
            delay: Duration::from_secs(60),
            reason: DelayReason::ErrorRecovery,
        }]
    );
}

#[test]
fn status_notification_fires_only_on_multiples_of_cadence() {
    init_logging();
    let mut state = polling(PollSettings::default());
    let mut status_checks = Vec::new();

    for _ in 0..36 {
        let (next, effects) = complete(state, CycleOutcome::NotFound);
        for effect in &effects {
            if let Effect::Notify(Notification::Status { check_count }) = effect {
                status_checks.push(*check_count);
            }
        }
        assert_eq!(effects.last(), Some(&poll_sleep()));
        let (next, _) = update(next, Msg::DelayElapsed);
        state = next;
    }

    assert_eq!(status_checks, vec![12, 24, 36]);
}

#[test]
fn failed_fetch_on_cadence_sends_no_status() {
    init_logging();
    let settings = PollSettings {
        status_every: 2,
        ..PollSettings::default()
    };
    let state = polling(settings);
    let (state, _) = complete(state, CycleOutcome::NotFound);
    let (state, _) = update(state, Msg::DelayElapsed);

    let (state, effects) = complete(
        state,
        CycleOutcome::FetchFailed {
            reason: "http status 503".into(),
        },
    );

    assert_eq!(state.check_count(), 2);
    assert!(effects
        .iter()
        .all(|effect| !matches!(effect, Effect::Notify(_))));
}

#[test]
fn status_updates_can_be_disabled() {
    init_logging();
    let settings = PollSettings {
        status_every: 1,
        send_status_updates: false,
        ..PollSettings::default()
    };
    let state = polling(settings);

    let (_state, effects) = complete(state, CycleOutcome::NotFound);

    assert_eq!(effects, vec![poll_sleep()]);
}

#[test]
fn found_notifies_and_terminates() {
    init_logging();
    let state = polling(PollSettings::default());
    let line = "placement test lingua inglese b2 lm ingegneria tutte".to_string();

    let (state, effects) = complete(state, CycleOutcome::Found { line: line.clone() });

    assert_eq!(state.phase(), Phase::Found);
    assert_eq!(state.check_count(), 1);
    assert_eq!(
        effects,
        vec![
            Effect::Notify(Notification::Found { line }),
            Effect::Terminate(Termination::Found),
        ]
    );
}

#[test]
fn cancel_while_polling_sends_shutdown_exactly_once() {
    init_logging();
    let state = polling(PollSettings::default());
    let (state, _) = complete(state, CycleOutcome::NotFound);

    let (state, effects) = update(state, Msg::CancelRequested);
    assert_eq!(state.phase(), Phase::Stopped);
    assert_eq!(
        effects,
        vec![
            Effect::Notify(Notification::Shutdown),
            Effect::Terminate(Termination::Stopped),
        ]
    );

    let (state, effects) = update(state, Msg::CancelRequested);
    assert!(effects.is_empty());
    let (state, effects) = update(state, Msg::DelayElapsed);
    assert!(effects.is_empty());
    assert_eq!(state.check_count(), 1);
}

#[test]
fn results_after_found_are_ignored() {
    init_logging();
    let state = polling(PollSettings::default());
    let (state, _) = complete(
        state,
        CycleOutcome::Found {
            line: "b2".into(),
        },
    );

    let (state, effects) = complete(state, CycleOutcome::NotFound);

    assert_eq!(state.phase(), Phase::Found);
    assert_eq!(state.check_count(), 1);
    assert!(effects.is_empty());
}
