// Author: Dustin Pilgrim
// License: MIT

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, info};

use crate::config::Config;
use crate::core::event::Event;
use crate::core::state_change::{apply_arcade_remap, ChangeFilter};
use crate::core::{resolver, media_set::MediaSet};
use crate::slideshow::Slideshow;
use crate::subscriber::Subscriber;

/// How often `Subscriber::get_event` re-checks the shutdown flag while
/// otherwise waiting indefinitely for the next broker payload.
const CHECK_INTERVAL: Duration = Duration::from_secs(5);

/// Ties the Subscriber, state-change filter, Resolver and Slideshow Engine
/// together into the Event Handler's running loop. Owns nothing but the
/// config it was constructed with; every other component is injected or
/// built at `run` time so the whole pipeline stays unit-testable piece by
/// piece (see each module's own tests) rather than only through this loop.
pub async fn run(config: Config, mut shutdown: watch::Receiver<bool>) {
    let media = Arc::new(config.media);
    let slideshow_cfg = Arc::new(config.slideshow);

    resolver::warn_unreadable_media_root(&media);

    let slideshow = Slideshow::start(slideshow_cfg, media.clone(), shutdown.clone());

    info!("showing startup media");
    slideshow.set_media(resolver::resolve_startup(&media));

    let mut subscriber = Subscriber::start(config.recalbox);
    let mut filter = ChangeFilter::new();

    loop {
        let Some(raw_action) = subscriber.get_event(CHECK_INTERVAL, &mut shutdown).await else {
            info!("shutdown signaled; stopping event loop");
            break;
        };

        if raw_action.trim().is_empty() {
            info!("empty event payload; stopping event loop");
            break;
        }

        let mut params = subscriber.get_event_params().await;
        params.insert("Action".to_string(), raw_action.clone());
        let mut event = Event::new(raw_action, params);

        apply_arcade_remap(media.arcade_system_enabled, &media.arcade_systems, &mut event);

        let decision = filter.handle(&config.change, &event);

        if !decision.changed {
            debug!(action = %event.action, "state unchanged; skipping resolver");
            continue;
        }

        let resolved_event = Event::new(decision.action, decision.params);
        let set: MediaSet = resolver::resolve(&media, &resolved_event);
        info!(action = %resolved_event.action, count = set.len(), "state changed; updating slideshow");
        slideshow.set_media(set);
    }

    subscriber.stop().await;
    slideshow.stop();
    slideshow.join().await;
}
