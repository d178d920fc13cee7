// Author: Dustin Pilgrim
// License: MIT

use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::watch;
use tracing::info;

/// Process-wide broadcast flag. Every component that may block holds
/// a clone of the `watch::Receiver` this module hands out; setting the flag
/// unblocks every one of them within the next `changed()` poll, which is
/// immediate rather than bounded only by `check_interval` (see
/// `subscriber::Subscriber::get_event`, which also re-polls on a timer as a
/// belt-and-braces fallback even though `watch` alone already beats it).
pub fn channel() -> (watch::Sender<bool>, watch::Receiver<bool>) {
    watch::channel(false)
}

/// Waits for SIGTERM or SIGINT (the latter covers interactive `Ctrl-C`
/// during development; only SIGTERM is a documented production signal) and
/// flips the shared flag. Runs until the first signal arrives.
pub async fn wait_for_termination(tx: watch::Sender<bool>) {
    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "failed to install SIGTERM handler");
            return;
        }
    };

    tokio::select! {
        _ = sigterm.recv() => info!("received SIGTERM"),
        _ = tokio::signal::ctrl_c() => info!("received SIGINT"),
    }

    let _ = tx.send(true);
}
