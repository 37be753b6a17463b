use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    CheckIdentity,
    Notify(Notification),
    BeginCycle,
    Sleep { delay: Duration, reason: DelayReason },
    Terminate(Termination),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelayReason {
    PollInterval,
    FetchRetry,
    ErrorRecovery,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    Startup,
    Status { check_count: u64 },
    Found { line: String },
    Shutdown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    Found,
    Stopped,
    Aborted,
}
