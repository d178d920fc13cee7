// Author: Dustin Pilgrim
// License: MIT

use std::path::PathBuf;
use std::sync::Arc;

use rand::seq::SliceRandom;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::config::SlideshowConfig;
use crate::core::media_set::MediaSet;

use super::command;
use super::process::ChildGuard;

/// Runs one `MediaSet` snapshot on a loop until `media_change` flips to
/// `true`. Ephemeral: a fresh worker is spawned by the queue reader for
/// every new set; the reader joins this task before starting the next one.
pub async fn run(cfg: Arc<SlideshowConfig>, is_video: impl Fn(&std::path::Path) -> bool, set: MediaSet, mut media_change: watch::Receiver<bool>) {
    let items = ordered(&cfg, set);
    if items.is_empty() {
        return;
    }

    'outer: loop {
        for (idx, item) in items.iter().enumerate() {
            if *media_change.borrow() {
                break 'outer;
            }

            let single_image = items.len() == 1 && !is_video(item);

            if is_video(item) {
                play_video(&cfg, item, &mut media_change).await;
            } else {
                play_image(&cfg, item, single_image, &mut media_change).await;
            }

            if *media_change.borrow() {
                break 'outer;
            }

            let last = idx + 1 == items.len();
            if !last || !single_image {
                if wait_or_change(cfg.time_between_slides, &mut media_change).await {
                    break 'outer;
                }
            }
        }
    }
}

fn ordered(cfg: &SlideshowConfig, set: MediaSet) -> Vec<PathBuf> {
    let mut items = set.into_vec();
    if cfg.shuffle {
        items.shuffle(&mut rand::rng());
    } else {
        items.sort_by_key(|p| {
            p.file_stem()
                .map(|s| s.to_string_lossy().to_lowercase())
                .unwrap_or_default()
        });
    }
    items
}

/// Waits for `duration` or until `media_change` flips true, whichever comes
/// first. Returns `true` if the wait ended because of a media change.
async fn wait_or_change(duration: std::time::Duration, media_change: &mut watch::Receiver<bool>) -> bool {
    if *media_change.borrow() {
        return true;
    }
    tokio::select! {
        _ = tokio::time::sleep(duration) => false,
        result = media_change.changed() => result.is_ok() && *media_change.borrow(),
    }
}

async fn play_video(cfg: &SlideshowConfig, path: &std::path::Path, media_change: &mut watch::Receiver<bool>) {
    let built = command::build(&cfg.video_player, &cfg.video_player_opts, Some(path));
    let mut guard = match ChildGuard::spawn(&built, "video_player") {
        Ok(g) => g,
        Err(e) => {
            warn!(error = %e, path = %path.display(), "failed to launch video player; skipping item");
            return;
        }
    };

    tokio::select! {
        _ = guard.wait() => {}
        _ = tokio::time::sleep(cfg.max_video_time) => {
            debug!(path = %path.display(), "max_video_time elapsed; stopping video");
        }
        result = media_change.changed() => {
            if result.is_err() || !*media_change.borrow() {
                return;
            }
        }
    }

    guard.stop(super::process::DEFAULT_SUBPROCESS_TIMEOUT).await;
    run_clear(cfg).await;
}

async fn play_image(
    cfg: &SlideshowConfig,
    path: &std::path::Path,
    single_image: bool,
    media_change: &mut watch::Receiver<bool>,
) {
    let built = command::build(&cfg.viewer, &cfg.viewer_opts, Some(path));
    let guard = match ChildGuard::spawn(&built, "viewer") {
        Ok(g) => g,
        Err(e) => {
            warn!(error = %e, path = %path.display(), "failed to launch image viewer; skipping item");
            return;
        }
    };

    if single_image {
        // Leaves the image on the framebuffer indefinitely; only a media
        // change (new set enqueued, or shutdown) ends this.
        let _ = media_change.changed().await;
        guard.stop(super::process::DEFAULT_SUBPROCESS_TIMEOUT).await;
        return;
    }

    if wait_or_change(cfg.image_display_time, media_change).await {
        // Preempted by a media change: always tear down, regardless of
        // `terminate_viewer` (that flag only governs the natural
        // between-images transition below).
        guard.stop(super::process::DEFAULT_SUBPROCESS_TIMEOUT).await;
        return;
    }

    if cfg.terminate_viewer {
        guard.stop(super::process::DEFAULT_SUBPROCESS_TIMEOUT).await;
        run_clear(cfg).await;
    } else {
        guard.detach();
    }
}

async fn run_clear(cfg: &SlideshowConfig) {
    let built = command::build(&cfg.clear_cmd, &cfg.clear_cmd_opts, None);
    match ChildGuard::spawn(&built, "clear_cmd") {
        Ok(guard) => guard.stop(super::process::DEFAULT_SUBPROCESS_TIMEOUT).await,
        Err(e) => warn!(error = %e, "failed to launch clear command"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn test_cfg() -> SlideshowConfig {
        SlideshowConfig {
            image_display_time: Duration::from_millis(50),
            max_video_time: Duration::from_millis(200),
            time_between_slides: Duration::from_millis(10),
            shuffle: false,
            terminate_viewer: false,
            viewer: "true".to_string(),
            viewer_opts: String::new(),
            video_player: "true".to_string(),
            video_player_opts: String::new(),
            clear_cmd: "true".to_string(),
            clear_cmd_opts: String::new(),
            framebuffer_resolution_cmd: None,
        }
    }

    #[tokio::test]
    async fn run_exits_promptly_once_media_change_is_signalled() {
        let cfg = Arc::new(test_cfg());
        let set = MediaSet::new(vec![PathBuf::from("/tmp/a.png"), PathBuf::from("/tmp/b.png")]);
        let (tx, rx) = watch::channel(false);

        let handle = tokio::spawn(run(cfg, |_| false, set, rx));
        tokio::time::sleep(Duration::from_millis(5)).await;
        tx.send(true).unwrap();

        tokio::time::timeout(Duration::from_secs(2), handle).await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn empty_set_returns_immediately() {
        let cfg = Arc::new(test_cfg());
        let (_tx, rx) = watch::channel(false);
        tokio::time::timeout(Duration::from_secs(1), run(cfg, |_| false, MediaSet::empty(), rx))
            .await
            .unwrap();
    }
}
