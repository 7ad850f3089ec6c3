//! # Shutdown triggers.
//!
//! The runtime stops when either its own token is cancelled
//! ([`Supervisor::shutdown`](crate::Supervisor::shutdown)) or, with
//! `supervisor.handle_signals`, the process receives a termination signal:
//!
//! - Unix: `SIGINT`, `SIGTERM`, `SIGQUIT`
//! - elsewhere: Ctrl-C
//!
//! A signal listener that cannot be installed is logged and never fires.

use tokio_util::sync::CancellationToken;

/// Where the shutdown request came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Trigger {
    Token,
    Signal,
}

/// Completes on the first shutdown trigger.
pub(crate) async fn wait_for_shutdown(token: &CancellationToken, handle_signals: bool) -> Trigger {
    if !handle_signals {
        token.cancelled().await;
        return Trigger::Token;
    }
    tokio::select! {
        _ = token.cancelled() => Trigger::Token,
        res = wait_for_signal() => {
            match res {
                Ok(()) => Trigger::Signal,
                Err(err) => {
                    tracing::warn!(error = %err, "signal handlers unavailable; waiting for explicit shutdown");
                    token.cancelled().await;
                    Trigger::Token
                }
            }
        }
    }
}

#[cfg(unix)]
async fn wait_for_signal() -> std::io::Result<()> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigquit = signal(SignalKind::quit())?;

    tokio::select! {
        _ = sigint.recv()  => {},
        _ = sigterm.recv() => {},
        _ = sigquit.recv() => {},
    }
    Ok(())
}

#[cfg(not(unix))]
async fn wait_for_signal() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await
}
