// Author: Dustin Pilgrim
// License: MIT

pub mod command;
pub mod process;
pub mod worker;

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::{MediaConfig, SlideshowConfig};
use crate::core::media_set::MediaSet;

/// Public handle to the slideshow engine. `set_media` enqueues a
/// canonicalized set for display; `stop` tears everything down. Both are
/// safe to call any number of times, from any task.
pub struct Slideshow {
    tx: mpsc::UnboundedSender<MediaSet>,
    reader_task: JoinHandle<()>,
}

impl Slideshow {
    /// Spawns the queue reader and fires the one-shot framebuffer-resolution
    /// command, if one is configured.
    pub fn start(cfg: Arc<SlideshowConfig>, media: Arc<MediaConfig>, shutdown: watch::Receiver<bool>) -> Self {
        if let Some(fb_cmd) = cfg.framebuffer_resolution_cmd.clone() {
            tokio::spawn(async move {
                let built = command::build(&fb_cmd, "", None);
                match process::ChildGuard::spawn(&built, "framebuffer_resolution_cmd") {
                    Ok(guard) => guard.stop(process::DEFAULT_SUBPROCESS_TIMEOUT).await,
                    Err(e) => warn!(error = %e, "failed to run framebuffer_resolution_cmd"),
                }
            });
        }

        let (tx, rx) = mpsc::unbounded_channel();
        let reader_task = tokio::spawn(queue_reader(cfg, media, rx, shutdown));

        Self { tx, reader_task }
    }

    /// Enqueues `set`. Non-blocking; equal-to-current sets are still
    /// enqueued here, the queue reader is the one that coalesces them.
    pub fn set_media(&self, set: MediaSet) {
        let _ = self.tx.send(set);
    }

    /// Primes the queue reader with an empty set so it blanks the display;
    /// actual task teardown happens when the shared shutdown flag flips.
    /// Safe to call repeatedly.
    pub fn stop(&self) {
        self.set_media(MediaSet::empty());
    }

    pub async fn join(self) {
        let _ = self.reader_task.await;
    }
}

async fn queue_reader(
    cfg: Arc<SlideshowConfig>,
    media: Arc<MediaConfig>,
    mut rx: mpsc::UnboundedReceiver<MediaSet>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut current: Option<MediaSet> = None;
    let mut worker: Option<(JoinHandle<()>, watch::Sender<bool>)> = None;

    loop {
        tokio::select! {
            biased;

            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    stop_worker(&mut worker).await;
                    run_clear(&cfg).await;
                    break;
                }
            }

            maybe_set = rx.recv() => {
                let Some(set) = maybe_set else { break };

                if current.as_ref() == Some(&set) {
                    debug!("media set unchanged; coalescing");
                    continue;
                }

                stop_worker(&mut worker).await;

                if set.is_empty() {
                    info!("media set is empty; blanking display");
                    run_clear(&cfg).await;
                    current = Some(set);
                    continue;
                }

                let (change_tx, change_rx) = watch::channel(false);
                let media_clone = media.clone();
                let is_video = move |p: &std::path::Path| media_clone.is_video(p);
                let handle = tokio::spawn(worker::run(cfg.clone(), is_video, set.clone(), change_rx));
                worker = Some((handle, change_tx));
                current = Some(set);
            }
        }
    }
}

/// Signals the current worker to preempt, joins it, then clears the
/// `media_change` flag for the next worker. A no-op if there is none.
async fn stop_worker(worker: &mut Option<(JoinHandle<()>, watch::Sender<bool>)>) {
    if let Some((handle, change_tx)) = worker.take() {
        let _ = change_tx.send(true);
        let _ = handle.await;
    }
}

async fn run_clear(cfg: &SlideshowConfig) {
    let built = command::build(&cfg.clear_cmd, &cfg.clear_cmd_opts, None);
    match process::ChildGuard::spawn(&built, "clear_cmd") {
        Ok(guard) => guard.stop(process::DEFAULT_SUBPROCESS_TIMEOUT).await,
        Err(e) => warn!(error = %e, "failed to run clear_cmd"),
    }
}
