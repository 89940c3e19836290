//! Fetch and render tasks.
//!
//! - [`Fetcher`] runs every update interval: fetch each line, parse, and
//!   commit the combined list only if every line succeeded. Fetching and
//!   parsing happen on task-local buffers; the commit is a single slot swap.
//! - [`Renderer`] wakes on every commit or settings change, builds a
//!   snapshot from whatever is current at that moment, pushes it to the
//!   strip and publishes it. Commits that land while a render is in progress
//!   collapse into one wake-up, so only the latest list is guaranteed to be
//!   drawn.
//!
//! Any cycle failure keeps the previously committed list on display.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

use crate::config::DisplayConfig;
use crate::feed::{parse_trips_for_route, FetchError};
use crate::snapshot::Snapshot;
use crate::traits::{FeedSource, LedStrip};
use crate::vehicle::{Vehicle, VehicleList};
use crate::{log_debug, log_info, log_warn};

use super::shared::SharedLinkState;

// ============================================================================
// Fetcher
// ============================================================================

/// Periodic fetch-and-commit task.
pub struct Fetcher<F: FeedSource> {
    state: Arc<SharedLinkState>,
    source: Arc<F>,
}

impl<F: FeedSource> Fetcher<F> {
    /// Creates a fetcher committing into `state`.
    pub fn new(state: Arc<SharedLinkState>, source: Arc<F>) -> Self {
        Self { state, source }
    }

    /// Fetch every line and commit the result.
    ///
    /// Returns the new generation. On error nothing is committed.
    pub async fn run_cycle(&self) -> Result<u64, FetchError> {
        let logger = self.state.logger().clone();
        let threshold = self.state.settings().at_station_threshold_secs;
        let timeout = self.state.feed_config().request_timeout();

        let mut candidate: Vec<Vehicle> = Vec::new();
        for &line in self.source.lines() {
            log_info!(
                logger,
                "Fetching data for {} (route: {}) from {}",
                line.name(),
                line.route_id(),
                self.source.describe()
            );
            let body = match tokio::time::timeout(timeout, self.source.fetch_line(line)).await {
                Ok(result) => result?,
                Err(_) => return Err(FetchError::Timeout(timeout)),
            };
            let vehicles = parse_trips_for_route(&body, line, threshold, &*logger)?;
            candidate.extend(vehicles);
        }

        let count = candidate.len();
        let generation = self.state.commit(candidate);
        log_info!(logger, "Committed {} vehicles (generation {})", count, generation);
        Ok(generation)
    }

    /// One cycle with failures logged and recorded instead of returned.
    pub async fn tick(&self) -> Option<u64> {
        match self.run_cycle().await {
            Ok(generation) => {
                self.state.record_fetch_success();
                Some(generation)
            }
            Err(e) => {
                log_warn!(
                    self.state.logger(),
                    "Fetch failed, keeping generation {}: {}. Will retry on next update cycle.",
                    self.state.current_vehicles().generation,
                    e
                );
                self.state.record_fetch_failure(&e);
                None
            }
        }
    }

    /// Run forever, one cycle per update interval (the first immediately).
    pub async fn run(self) {
        let period = self.state.feed_config().update_interval();
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        log_info!(
            self.state.logger(),
            "Fetcher started: every {}s from {}",
            period.as_secs(),
            self.source.describe()
        );
        loop {
            interval.tick().await;
            self.tick().await;
        }
    }
}

// ============================================================================
// Renderer
// ============================================================================

/// Snapshot-and-push task.
pub struct Renderer<S: LedStrip> {
    state: Arc<SharedLinkState>,
    strip: S,
    vehicles: watch::Receiver<Arc<VehicleList>>,
    settings: watch::Receiver<DisplayConfig>,
}

impl<S: LedStrip> Renderer<S> {
    /// Creates a renderer pushing to `strip`.
    pub fn new(state: Arc<SharedLinkState>, strip: S) -> Self {
        let vehicles = state.subscribe_vehicles();
        let settings = state.subscribe_settings();
        Self {
            state,
            strip,
            vehicles,
            settings,
        }
    }

    /// The strip being driven.
    pub fn strip(&self) -> &S {
        &self.strip
    }

    /// Render whatever is current right now and publish it.
    pub fn render_current(&mut self) -> Arc<Snapshot> {
        let vehicles = self.vehicles.borrow_and_update().clone();
        let settings = self.settings.borrow_and_update().clone();
        let snapshot = Arc::new(self.state.build_snapshot_of(vehicles, &settings));

        if let Err(e) = self.strip.show(&snapshot.colors) {
            log_warn!(self.state.logger(), "Strip push failed: {:?}", e);
        }
        log_debug!(
            self.state.logger(),
            "Rendered generation {}: {} vehicles on {} LEDs",
            snapshot.generation(),
            snapshot.placements.len(),
            snapshot.aggregator.occupied().count()
        );
        self.state.publish_snapshot(snapshot.clone());
        snapshot
    }

    /// Wait until a commit or a settings change is pending.
    ///
    /// Returns false once neither can change again.
    pub async fn changed(&mut self) -> bool {
        tokio::select! {
            r = self.vehicles.changed() => r.is_ok(),
            r = self.settings.changed() => r.is_ok(),
        }
    }

    /// Render once, then again after every commit or settings change.
    pub async fn run(mut self) {
        self.render_current();
        while self.changed().await {
            self.render_current();
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
