//! The polling driver: fetch, parse, reconcile, act, then wait for the next tick.

use std::time::{Duration, Instant};

use anyhow::{Context as _, Result};
use tokio::{select, signal, time::MissedTickBehavior};

use crate::{
    config::OverlayConfig,
    labels::LabelFiles,
    overlay::{OverlayAction, OverlayTimers, Slot},
    status::Snapshot,
    title::TitlePresenter,
    vmix::VmixClient,
};

/// Everything a tick needs, owned by the loop.
struct Driver {
    client: VmixClient,
    presenter: TitlePresenter,
    labels: LabelFiles,
    timers: OverlayTimers,
}

impl Driver {
    fn new(client: VmixClient, config: &OverlayConfig) -> Result<Self> {
        Ok(Self {
            presenter: TitlePresenter::new(client.clone(), config),
            labels: LabelFiles::new(config.now_playing_file.clone(), config.next_up_file.clone()),
            timers: OverlayTimers::new(config.timing()?),
            client,
        })
    }

    /// A failed fetch skips the tick and leaves the session untouched.
    async fn tick(&mut self) {
        let document = match self.client.fetch_status().await {
            Ok(document) => document,
            Err(e) => {
                tracing::warn!(?e, "Failed to fetch vMix status");
                return;
            }
        };
        let snapshot = Snapshot::from_status(&document);
        let actions = self.timers.reconcile(snapshot.as_ref(), Instant::now());
        tracing::trace!(
            ?snapshot,
            now_playing = self.timers.is_shown(Slot::NowPlaying),
            next_up = self.timers.is_shown(Slot::NextUp),
            "Status polled"
        );
        self.apply(actions).await;
    }

    /// Run actions strictly in order.
    async fn apply(&self, actions: Vec<OverlayAction>) {
        for action in actions {
            match action {
                OverlayAction::WriteLabels { current, next } => {
                    if let Err(e) = self.labels.write(&current, &next) {
                        tracing::warn!(?e, "Failed to write label files");
                    }
                }
                OverlayAction::Show { slot, label } => {
                    if !self.presenter.show(slot, &label).await {
                        tracing::warn!(?slot, %label, "Title not shown, it will not be retried for this item");
                    }
                }
                OverlayAction::Hide(slot) => {
                    if !self.presenter.hide(slot).await {
                        tracing::warn!(?slot, "Title may still be on air");
                    }
                }
            }
        }
    }

    /// Take any shown title off air before exiting.
    async fn shutdown(&mut self) {
        let actions = self.timers.reconcile(None, Instant::now());
        self.apply(actions).await;
    }
}

/// Poll `client` every `period` until interrupted.
///
/// # Errors
///
/// Returns an error if the configuration is invalid or the interrupt signal cannot be
/// listened for. Failures inside a tick are logged and never end the loop.
pub async fn poll_loop(client: VmixClient, config: OverlayConfig, period: Duration) -> Result<()> {
    let mut driver = Driver::new(client, &config)?;
    tracing::info!(url = %driver.client.url(), ?period, "Polling vMix");

    driver
        .presenter
        .configure_transitions(
            &config.overlay_transition_type,
            config.overlay_transition_duration,
        )
        .await;

    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let interrupted = signal::ctrl_c();
    tokio::pin!(interrupted);

    loop {
        select! {
            _ = ticker.tick() => driver.tick().await,
            result = &mut interrupted => {
                tracing::info!("Interrupted. Hiding titles and exiting");
                driver.shutdown().await;
                return result.context("Failed to listen for Ctrl-C");
            }
        }
    }
}
