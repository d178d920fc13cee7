// Author: Dustin Pilgrim
// License: MIT

use std::time::Duration;

use tokio::process::Child;
use tracing::{debug, warn};

use super::command::Command as BuiltCommand;

/// Default grace period between a graceful termination signal and a forced
/// kill.
pub const DEFAULT_SUBPROCESS_TIMEOUT: Duration = Duration::from_secs(3);

/// Owns at most one live media-player/viewer subprocess. Provides a
/// graceful-stop-then-kill shutdown path; also kills on drop as a backstop
/// so a bug in a caller's control flow can never leak a child process.
pub struct ChildGuard {
    child: Option<Child>,
    label: &'static str,
}

impl ChildGuard {
    /// Spawns `cmd` with stdio discarded. Launch failure is the caller's to
    /// log and skip; this just surfaces the `io::Error`.
    pub fn spawn(cmd: &BuiltCommand, label: &'static str) -> std::io::Result<Self> {
        // Deliberately no `kill_on_drop`: whether a dropped/abandoned child
        // gets killed is decided by this type's own `Drop` impl, so that
        // `detach` can opt a specific child out of it (see `detach`).
        let child = tokio::process::Command::new(&cmd.program)
            .args(&cmd.args)
            .stdin(std::process::Stdio::null())
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .spawn()?;

        debug!(label, program = %cmd.program, pid = child.id(), "subprocess spawned");

        Ok(Self {
            child: Some(child),
            label,
        })
    }

    /// Waits for the child to exit on its own. Returns `Ok(None)` if there
    /// is no child (already stopped).
    pub async fn wait(&mut self) -> std::io::Result<Option<std::process::ExitStatus>> {
        match self.child.as_mut() {
            Some(child) => child.wait().await.map(Some),
            None => Ok(None),
        }
    }

    /// Graceful stop: SIGTERM, wait up to `timeout`, SIGKILL if still alive,
    /// reap in either case. Safe to call on an already-exited child.
    pub async fn stop(mut self, timeout: Duration) {
        let Some(mut child) = self.child.take() else {
            return;
        };

        if let Some(pid) = child.id() {
            // SAFETY: sending a signal to a pid we own via tokio::process::Child.
            let rc = unsafe { libc::kill(pid as libc::pid_t, libc::SIGTERM) };
            if rc != 0 {
                debug!(label = self.label, pid, "SIGTERM failed (process likely already exited)");
            }
        }

        match tokio::time::timeout(timeout, child.wait()).await {
            Ok(Ok(status)) => {
                debug!(label = self.label, ?status, "subprocess exited after graceful stop");
            }
            Ok(Err(e)) => {
                warn!(label = self.label, error = %e, "error waiting on subprocess during graceful stop");
            }
            Err(_) => {
                warn!(label = self.label, "subprocess did not exit within timeout; killing");
                if let Err(e) = child.start_kill() {
                    warn!(label = self.label, error = %e, "failed to send kill");
                }
                let _ = child.wait().await;
            }
        }
    }

    /// Releases the child without killing it, leaving it running
    /// independently of this guard. Used when `terminate_viewer` is off and
    /// the viewer should stay on screen rather than being torn down between
    /// images.
    pub fn detach(mut self) {
        if let Some(child) = self.child.take() {
            debug!(label = self.label, pid = child.id(), "detaching subprocess; leaving it running");
            drop(child);
        }
    }
}

impl Drop for ChildGuard {
    fn drop(&mut self) {
        // Best-effort backstop for a guard dropped without `stop` or
        // `detach` (e.g. an early return after a launch/wait error): kill
        // rather than leak. Callers that want the child left running call
        // `detach` first, which clears `self.child` so this is a no-op.
        if let Some(child) = self.child.as_mut() {
            let _ = child.start_kill();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slideshow::command::build;

    #[tokio::test]
    async fn stop_reaps_a_child_that_exits_promptly() {
        let cmd = build("sh", "-c \"exit 0\"", None);
        let guard = ChildGuard::spawn(&cmd, "test").unwrap();
        guard.stop(Duration::from_secs(1)).await;
    }

    #[tokio::test]
    async fn stop_kills_a_child_that_ignores_sigterm() {
        // `trap '' TERM` ignores SIGTERM, forcing the kill path.
        let cmd = build("sh", "-c \"trap '' TERM; sleep 30\"", None);
        let guard = ChildGuard::spawn(&cmd, "test").unwrap();
        let start = std::time::Instant::now();
        guard.stop(Duration::from_millis(200)).await;
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn wait_returns_exit_status_when_child_exits_on_its_own() {
        let cmd = build("sh", "-c \"exit 0\"", None);
        let mut guard = ChildGuard::spawn(&cmd, "test").unwrap();
        let status = guard.wait().await.unwrap();
        assert!(status.is_some());
    }
}
