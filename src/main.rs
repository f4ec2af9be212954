// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `light-watchdog` daemon.
//!
//! Usage: `light-watchdog [config.json]`
//!
//! Connects to the MQTT broker, tracks every room's light and raises an
//! alert (webhook or log) when a light stays on past the threshold. State
//! survives restarts in the state directory.

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};
use tracing_subscriber::EnvFilter;

use light_watchdog::event::{LightEvent, MonitorEvent};
use light_watchdog::manager::{LightMonitor, ReconciliationLoop};
use light_watchdog::notify::{HttpNotifierConfig, LogNotifier, Notifier};
use light_watchdog::protocol::MqttEventSource;
use light_watchdog::state::Transition;
use light_watchdog::store::JsonFileStore;
use light_watchdog::types::format_clock;
use light_watchdog::{MonitorConfig, Result};

#[tokio::main]
async fn main() -> Result<()> {
    let config = match std::env::args().nth(1) {
        Some(path) => MonitorConfig::from_file(path)?,
        None => MonitorConfig::default(),
    };

    init_logging(config.log_level());

    let state_dir = config.state_dir()?;
    let store = Arc::new(JsonFileStore::open(&state_dir)?);
    let monitor = LightMonitor::new(store, config.threshold());

    spawn_event_logger(monitor.subscribe());

    for room in config.rooms() {
        monitor.add_room(room.clone());
    }

    tracing::info!(
        state_dir = %state_dir.display(),
        threshold_secs = config.threshold().as_secs(),
        rooms = monitor.room_count(),
        "light-watchdog starting"
    );

    let mut builder = MqttEventSource::builder()
        .url(config.broker_url())?
        .layout(config.layout());
    if let Some((username, password)) = config.broker_credentials() {
        builder = builder.credentials(username, password);
    }
    let (source, events) = builder.build().await?;

    match config.webhook_url() {
        Some(url) => {
            let notifier = HttpNotifierConfig::new(url)
                .with_timeout(config.webhook_timeout())
                .into_notifier()?;
            run(&config, monitor, source, events, notifier).await
        }
        None => {
            tracing::info!("No webhook configured, alerts will only be logged");
            run(&config, monitor, source, events, LogNotifier).await
        }
    }
}

async fn run<N: Notifier>(
    config: &MonitorConfig,
    monitor: LightMonitor,
    source: MqttEventSource,
    mut events: mpsc::Receiver<LightEvent>,
    notifier: N,
) -> Result<()> {
    let reconciler = ReconciliationLoop::new(monitor.clone(), notifier)
        .with_tick_interval(config.tick_interval())
        .with_drain_timeout(config.webhook_timeout())
        .spawn();

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else {
                    tracing::warn!("Event source closed");
                    break;
                };
                // Store failures are logged by the tracker
                let _ = monitor.handle_event(&event);
            }
            result = &mut shutdown => {
                if let Err(e) = result {
                    tracing::error!(error = %e, "Failed to listen for shutdown signal");
                }
                tracing::info!("Shutting down");
                break;
            }
        }
    }

    reconciler.shutdown().await;
    if let Err(e) = source.disconnect().await {
        tracing::warn!(error = %e, "Failed to disconnect from MQTT broker");
    }
    Ok(())
}

fn init_logging(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn spawn_event_logger(mut events: broadcast::Receiver<MonitorEvent>) {
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(MonitorEvent::LightChanged {
                    room, transition, ..
                }) => match transition {
                    Transition::TurnedOn { at } => {
                        tracing::info!(room = %room, at = %at, "Light on");
                    }
                    Transition::TurnedOff { on_for } => {
                        tracing::info!(room = %room, on_for = %format_clock(on_for), "Light off");
                    }
                    Transition::DuplicateIgnored => {}
                },
                Ok(MonitorEvent::RoomAdded { room }) => {
                    tracing::info!(room = %room, "Tracking room");
                }
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Event logger lagging");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });
}
