use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Starting,
    Polling,
    Found,
    Stopped,
    Aborted,
}

impl Phase {
    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::Found | Phase::Stopped | Phase::Aborted)
    }
}

/// Cadence of the poll loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollSettings {
    /// Delay after a cycle that found nothing.
    pub poll_interval: Duration,
    /// Delay after a failed fetch.
    pub short_retry_delay: Duration,
    /// Delay after an unexpected failure inside a cycle.
    pub error_recovery_delay: Duration,
    /// A status notification is sent every `status_every` checks.
    pub status_every: u64,
    pub send_status_updates: bool,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(300),
            short_retry_delay: Duration::from_secs(30),
            error_recovery_delay: Duration::from_secs(60),
            status_every: 12,
            send_status_updates: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PollState {
    phase: Phase,
    check_count: u64,
    settings: PollSettings,
}

impl PollState {
    pub fn new(settings: PollSettings) -> Self {
        Self {
            phase: Phase::Starting,
            check_count: 0,
            settings,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Number of completed poll cycles, failed ones included.
    pub fn check_count(&self) -> u64 {
        self.check_count
    }

    pub fn settings(&self) -> &PollSettings {
        &self.settings
    }

    /// True when the current check count falls on the status cadence.
    pub fn status_due(&self) -> bool {
        self.settings.send_status_updates
            && self.settings.status_every > 0
            && self.check_count > 0
            && self.check_count % self.settings.status_every == 0
    }

    pub(crate) fn set_phase(&mut self, phase: Phase) {
        self.phase = phase;
    }

    pub(crate) fn record_check(&mut self) -> u64 {
        self.check_count += 1;
        self.check_count
    }
}
