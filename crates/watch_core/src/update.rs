use crate::{
    CycleOutcome, DelayReason, Effect, Msg, Notification, Phase, PollState, Termination,
};

/// Pure update function: applies a message to state and returns any effects.
///
/// Terminal phases swallow every message, so each terminal transition (and
/// the shutdown notification in particular) happens at most once.
pub fn update(mut state: PollState, msg: Msg) -> (PollState, Vec<Effect>) {
    if state.phase().is_terminal() {
        return (state, Vec::new());
    }

    let effects = match msg {
        Msg::Start => match state.phase() {
            Phase::Starting => vec![Effect::CheckIdentity],
            _ => Vec::new(),
        },
        Msg::IdentityChecked { reachable } => {
            if state.phase() != Phase::Starting {
                return (state, Vec::new());
            }
            if reachable {
                state.set_phase(Phase::Polling);
                vec![Effect::Notify(Notification::Startup), Effect::BeginCycle]
            } else {
                state.set_phase(Phase::Aborted);
                vec![Effect::Terminate(Termination::Aborted)]
            }
        }
        Msg::CycleCompleted(outcome) => {
            if state.phase() != Phase::Polling {
                return (state, Vec::new());
            }
            let check_count = state.record_check();
            on_cycle_completed(&mut state, check_count, outcome)
        }
        Msg::DelayElapsed => match state.phase() {
            Phase::Polling => vec![Effect::BeginCycle],
            _ => Vec::new(),
        },
        Msg::CancelRequested => match state.phase() {
            // The startup notification was never sent, so there is nothing to
            // announce the shutdown of.
            Phase::Starting => {
                state.set_phase(Phase::Stopped);
                vec![Effect::Terminate(Termination::Stopped)]
            }
            Phase::Polling => {
                state.set_phase(Phase::Stopped);
                vec![
                    Effect::Notify(Notification::Shutdown),
                    Effect::Terminate(Termination::Stopped),
                ]
            }
            Phase::Found | Phase::Stopped | Phase::Aborted => Vec::new(),
        },
    };

    (state, effects)
}

fn on_cycle_completed(
    state: &mut PollState,
    check_count: u64,
    outcome: CycleOutcome,
) -> Vec<Effect> {
    match outcome {
        CycleOutcome::Found { line } => {
            state.set_phase(Phase::Found);
            vec![
                Effect::Notify(Notification::Found { line }),
                Effect::Terminate(Termination::Found),
            ]
        }
        CycleOutcome::NotFound => {
            let mut effects = Vec::with_capacity(2);
            if state.status_due() {
                effects.push(Effect::Notify(Notification::Status { check_count }));
            }
            effects.push(Effect::Sleep {
                delay: state.settings().poll_interval,
                reason: DelayReason::PollInterval,
            });
            effects
        }
        CycleOutcome::FetchFailed { .. } => vec![Effect::Sleep {
            delay: state.settings().short_retry_delay,
            reason: DelayReason::FetchRetry,
        }],
        CycleOutcome::Unexpected { .. } => vec![Effect::Sleep {
            delay: state.settings().error_recovery_delay,
            reason: DelayReason::ErrorRecovery,
        }],
    }
}
