#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// Driver started; kicks off the startup precondition.
    Start,
    /// Result of the messaging identity check.
    IdentityChecked { reachable: bool },
    /// One poll cycle (fetch, decode, detect) finished.
    CycleCompleted(CycleOutcome),
    /// A requested sleep ran to completion.
    DelayElapsed,
    /// External interrupt (Ctrl-C).
    CancelRequested,
}

/// How a single poll cycle ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    Found { line: String },
    NotFound,
    FetchFailed { reason: String },
    /// Anything the cycle did not anticipate, including panics.
    Unexpected { reason: String },
}
