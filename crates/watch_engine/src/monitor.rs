use std::any::Any;
use std::collections::VecDeque;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use chrono::Local;
use futures_util::FutureExt;
use tokio_util::sync::CancellationToken;
use watch_core::{
    update, CycleOutcome, DelayReason, Effect, Msg, Notification, Phase, PollSettings, PollState,
    Termination,
};
use watch_logging::{watch_error, watch_info, watch_warn};

use crate::{
    analyze, decode_html, render, CycleError, Fetcher, Keywords, MatchResult, MessageContext,
    Notifier, Sleeper,
};

#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub url: String,
    pub keywords: Keywords,
    pub poll: PollSettings,
    pub target_label: String,
}

impl MonitorConfig {
    fn message_context(&self) -> MessageContext {
        MessageContext {
            target_label: self.target_label.clone(),
            page_url: self.url.clone(),
            poll_interval: self.poll.poll_interval,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorReport {
    pub termination: Termination,
    /// Completed poll cycles, failed ones included.
    pub checks: u64,
}

/// Drives the poll state machine: executes its effects one at a time and
/// feeds the results back in as messages.
pub struct Monitor {
    config: MonitorConfig,
    messages: MessageContext,
    fetcher: Arc<dyn Fetcher>,
    notifier: Arc<dyn Notifier>,
    sleeper: Arc<dyn Sleeper>,
}

impl Monitor {
    pub fn new(
        config: MonitorConfig,
        fetcher: Arc<dyn Fetcher>,
        notifier: Arc<dyn Notifier>,
        sleeper: Arc<dyn Sleeper>,
    ) -> Self {
        let messages = config.message_context();
        Self {
            config,
            messages,
            fetcher,
            notifier,
            sleeper,
        }
    }

    /// Runs until the entry is found, `cancel` fires, or the messaging
    /// channel turns out to be unreachable at startup.
    ///
    /// Cancellation is observed before each cycle and during sleeps; a fetch
    /// already in flight always completes.
    pub async fn run(&self, cancel: &CancellationToken) -> MonitorReport {
        let mut state = PollState::new(self.config.poll.clone());
        let mut inbox = VecDeque::from([Msg::Start]);

        while let Some(msg) = inbox.pop_front() {
            let (next, effects) = update(state, msg);
            state = next;

            for effect in effects {
                match effect {
                    Effect::CheckIdentity => {
                        let reachable = self.check_identity().await;
                        inbox.push_back(Msg::IdentityChecked { reachable });
                    }
                    Effect::Notify(notification) => {
                        self.notify(&notification).await;
                    }
                    Effect::BeginCycle => {
                        if cancel.is_cancelled() {
                            inbox.push_back(Msg::CancelRequested);
                        } else {
                            let outcome = self.run_cycle(state.check_count() + 1).await;
                            inbox.push_back(Msg::CycleCompleted(outcome));
                        }
                    }
                    Effect::Sleep { delay, reason } => {
                        watch_info!("Next check in {}s ({})", delay.as_secs(), describe(reason));
                        let msg = tokio::select! {
                            biased;
                            _ = cancel.cancelled() => Msg::CancelRequested,
                            _ = self.sleeper.sleep(delay) => Msg::DelayElapsed,
                        };
                        inbox.push_back(msg);
                    }
                    Effect::Terminate(termination) => {
                        log_termination(termination, state.check_count());
                        return MonitorReport {
                            termination,
                            checks: state.check_count(),
                        };
                    }
                }
            }
        }

        // Every non-terminal transition yields a follow-up message, so the
        // inbox only drains after a terminal phase.
        let termination = match state.phase() {
            Phase::Found => Termination::Found,
            Phase::Aborted => Termination::Aborted,
            Phase::Starting | Phase::Polling | Phase::Stopped => Termination::Stopped,
        };
        MonitorReport {
            termination,
            checks: state.check_count(),
        }
    }

    async fn check_identity(&self) -> bool {
        match self.notifier.check_identity().await {
            Ok(identity) => {
                watch_info!("Messaging bot connected: @{}", identity.username);
                true
            }
            Err(err) => {
                watch_error!("Messaging channel unreachable: {}", err);
                false
            }
        }
    }

    /// Best-effort send; a failure is logged and otherwise ignored.
    async fn notify(&self, notification: &Notification) -> bool {
        let text = render(notification, &self.messages, Local::now().naive_local());
        match self.notifier.send(&text).await {
            Ok(()) => {
                watch_info!("Notification sent: {}", kind(notification));
                true
            }
            Err(err) => {
                watch_error!("Notification {} failed: {}", kind(notification), err);
                false
            }
        }
    }

    async fn run_cycle(&self, check: u64) -> CycleOutcome {
        watch_info!(
            "Check #{} - {}",
            check,
            Local::now().format("%d/%m/%Y %H:%M:%S")
        );

        let result = match AssertUnwindSafe(self.poll_once()).catch_unwind().await {
            Ok(result) => result,
            Err(panic) => Err(CycleError::Unexpected(panic_message(&*panic))),
        };

        match result {
            Ok(MatchResult {
                matched_line: Some(line),
                ..
            }) => {
                watch_info!("Entry found: {}", line);
                CycleOutcome::Found { line }
            }
            Ok(_) => {
                watch_info!("Entry not listed yet");
                CycleOutcome::NotFound
            }
            Err(CycleError::Fetch(err)) => {
                watch_warn!("Page not fetched ({}), retrying soon", err);
                CycleOutcome::FetchFailed {
                    reason: err.to_string(),
                }
            }
            Err(CycleError::Unexpected(reason)) => {
                watch_error!("Unexpected error during check #{}: {}", check, reason);
                CycleOutcome::Unexpected { reason }
            }
        }
    }

    async fn poll_once(&self) -> Result<MatchResult, CycleError> {
        watch_info!("Fetching page: {}", self.config.url);
        let output = self.fetcher.fetch(&self.config.url).await?;

        let decoded = match decode_html(&output.bytes, output.metadata.content_type.as_deref()) {
            Ok(decoded) => decoded,
            Err(err) => {
                watch_error!("Could not parse page content: {}", err);
                return Ok(MatchResult::not_found());
            }
        };

        let analysis = analyze(&decoded.html, &self.config.keywords);
        let presence = analysis
            .presence
            .iter()
            .map(|(keyword, present)| format!("{keyword}={present}"))
            .collect::<Vec<_>>()
            .join(", ");
        watch_info!("Keywords present: {}", presence);
        Ok(analysis.result)
    }
}

fn describe(reason: DelayReason) -> &'static str {
    match reason {
        DelayReason::PollInterval => "poll interval",
        DelayReason::FetchRetry => "fetch retry",
        DelayReason::ErrorRecovery => "error recovery",
    }
}

fn kind(notification: &Notification) -> &'static str {
    match notification {
        Notification::Startup => "startup",
        Notification::Status { .. } => "status",
        Notification::Found { .. } => "found",
        Notification::Shutdown => "shutdown",
    }
}

fn log_termination(termination: Termination, checks: u64) {
    match termination {
        Termination::Found => watch_info!("Monitoring finished after {} checks", checks),
        Termination::Stopped => watch_info!("Monitoring stopped after {} checks", checks),
        Termination::Aborted => watch_error!("Monitoring aborted before the first check"),
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "panic with non-string payload".to_string()
    }
}
