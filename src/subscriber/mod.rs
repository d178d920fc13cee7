// Author: Dustin Pilgrim
// License: MIT

pub mod snapshot;

use std::collections::BTreeMap;
use std::time::Duration;

use rumqttc::{AsyncClient, Event as MqttEvent, MqttOptions, Packet, QoS};
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

use crate::config::RecalboxConfig;

/// Owns the broker connection and the front-end state-snapshot source.
/// `start()` spawns the network loop on its own task; `get_event` is
/// consumed by a single caller (the Event Handler).
pub struct Subscriber {
    cfg: RecalboxConfig,
    client: AsyncClient,
    rx: mpsc::UnboundedReceiver<String>,
    http: reqwest::Client,
    event_loop_task: tokio::task::JoinHandle<()>,
}

impl Subscriber {
    /// Connects to the broker, subscribes to the configured topic, and
    /// starts the network loop. Connection failures are logged; the
    /// network loop keeps retrying rather than panicking, leaning on
    /// rumqttc's own reconnect behavior.
    pub fn start(cfg: RecalboxConfig) -> Self {
        let mut options = MqttOptions::new("dynquee", cfg.host.clone(), cfg.port);
        options.set_keep_alive(Duration::from_secs(cfg.keepalive.max(1)));

        let (client, mut event_loop) = AsyncClient::new(options, 64);
        let (tx, rx) = mpsc::unbounded_channel();

        let topic = cfg.topic.clone();
        {
            let client = client.clone();
            tokio::spawn(async move {
                if let Err(e) = client.subscribe(&topic, QoS::AtMostOnce).await {
                    error!(topic = %topic, error = %e, "failed to subscribe to broker topic");
                }
            });
        }

        let event_loop_task = tokio::spawn(async move {
            loop {
                match event_loop.poll().await {
                    Ok(MqttEvent::Incoming(Packet::Publish(publish))) => {
                        match String::from_utf8(publish.payload.to_vec()) {
                            Ok(payload) => {
                                if tx.send(payload).is_err() {
                                    break;
                                }
                            }
                            Err(e) => warn!(error = %e, "broker payload was not valid UTF-8; dropping"),
                        }
                    }
                    Ok(_) => {}
                    Err(e) => {
                        // Transport errors are logged and left to rumqttc's own
                        // reconnect behavior; the subscriber must not crash.
                        warn!(error = %e, "broker transport error; will keep retrying");
                        tokio::time::sleep(Duration::from_secs(1)).await;
                    }
                }
            }
        });

        info!(host = %cfg.host, port = cfg.port, topic = %cfg.topic, "subscriber started");

        Self {
            cfg,
            client,
            rx,
            http: reqwest::Client::new(),
            event_loop_task,
        }
    }

    /// Blocking (from the caller's perspective) wait for the next event
    /// payload. Returns `None` once `shutdown` is signaled, polling it
    /// every `check_interval` while otherwise waiting indefinitely.
    pub async fn get_event(
        &mut self,
        check_interval: Duration,
        shutdown: &mut watch::Receiver<bool>,
    ) -> Option<String> {
        loop {
            if *shutdown.borrow() {
                return None;
            }
            tokio::select! {
                payload = self.rx.recv() => {
                    return payload;
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        return None;
                    }
                }
                _ = tokio::time::sleep(check_interval) => {
                    // Wake up periodically purely to re-check the shutdown
                    // flag; `changed()` above already unblocks promptly on
                    // real shutdown, this is just a fallback.
                }
            }
        }
    }

    /// Reads the current front-end parameter snapshot. Failures (missing
    /// file, malformed JSON, HTTP error) are logged and degrade to an empty
    /// map rather than propagating.
    pub async fn get_event_params(&self) -> BTreeMap<String, String> {
        let result = if self.cfg.is_local {
            self.read_local_snapshot().await
        } else {
            self.read_remote_snapshot().await
        };

        match result {
            Ok(params) => params,
            Err(e) => {
                warn!(error = %e, "failed to read state snapshot; continuing with empty params");
                BTreeMap::new()
            }
        }
    }

    async fn read_local_snapshot(&self) -> Result<BTreeMap<String, String>, std::io::Error> {
        let path = self.cfg.es_state_local_file.clone();
        let text = tokio::fs::read_to_string(&path).await?;
        Ok(snapshot::parse(&text))
    }

    async fn read_remote_snapshot(&self) -> Result<BTreeMap<String, String>, reqwest::Error> {
        let body: snapshot::RemoteSnapshotBody = self
            .http
            .get(&self.cfg.es_state_remote_url)
            .send()
            .await?
            .json()
            .await?;
        Ok(snapshot::parse(&body.data.read_file))
    }

    /// Disconnects and terminates the network loop.
    pub async fn stop(self) {
        if let Err(e) = self.client.disconnect().await {
            debug!(error = %e, "error disconnecting from broker (ignored)");
        }
        self.event_loop_task.abort();
    }
}
