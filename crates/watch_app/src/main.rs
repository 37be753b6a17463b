mod config;

use std::sync::Arc;

use anyhow::{bail, Context};
use tokio_util::sync::CancellationToken;
use watch_core::Termination;
use watch_engine::{
    FetchSettings, Monitor, MonitorReport, ReqwestFetcher, TelegramNotifier, TokioSleeper,
};
use watch_logging::{watch_info, watch_warn};

use crate::config::Config;

fn main() -> anyhow::Result<()> {
    let config = Config::from_env().context("invalid configuration")?;

    watch_logging::initialize(&config.log_settings());
    watch_info!(
        "Exam watch starting: target={:?} url={} every {}s",
        config.target_label,
        config.url,
        config.poll.poll_interval.as_secs()
    );

    // One control thread: fetch, detect and notify never overlap.
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start the async runtime")?;
    let report = runtime.block_on(run(&config))?;

    match report.termination {
        Termination::Found => {
            watch_info!("Entry found after {} checks, go book it", report.checks);
        }
        Termination::Stopped => {
            watch_info!("Stopped by user after {} checks", report.checks);
        }
        Termination::Aborted => {
            bail!("messaging channel unreachable; check BOT_TOKEN and network access");
        }
    }
    Ok(())
}

async fn run(config: &Config) -> anyhow::Result<MonitorReport> {
    let fetcher =
        ReqwestFetcher::new(FetchSettings::default()).context("failed to build page fetcher")?;
    let notifier =
        TelegramNotifier::new(config.notify_settings()).context("failed to build notifier")?;

    let cancel = CancellationToken::new();
    let signal_token = cancel.clone();
    tokio::spawn(async move {
        match shutdown_signal().await {
            Ok(()) => {
                watch_info!("Interrupt received, stopping before the next check");
                signal_token.cancel();
            }
            Err(err) => watch_warn!("Could not listen for shutdown signals: {}", err),
        }
    });

    let monitor = Monitor::new(
        config.monitor_config(),
        Arc::new(fetcher),
        Arc::new(notifier),
        Arc::new(TokioSleeper),
    );
    Ok(monitor.run(&cancel).await)
}

/// Resolves on Ctrl-C, or SIGTERM on unix hosts.
async fn shutdown_signal() -> std::io::Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut terminate = signal(SignalKind::terminate())?;
        tokio::select! {
            result = tokio::signal::ctrl_c() => result,
            _ = terminate.recv() => Ok(()),
        }
    }
    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await
    }
}
