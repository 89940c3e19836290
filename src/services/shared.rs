//! The single context shared by the fetcher, renderer and web API.
//!
//! `SharedLinkState` owns every piece of mutable state in the process. The
//! committed vehicle list, the display settings and the latest snapshot each
//! live in a `tokio::sync::watch` slot: a writer replaces the whole value,
//! readers clone an `Arc` out of it, and nothing is ever patched in place. A
//! reader therefore sees either the previous complete value or the next one.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use linklight::config::Config;
//! use linklight::log::NoOpLogger;
//! use linklight::services::SharedLinkState;
//! use linklight::topology::link_table;
//!
//! let state = SharedLinkState::builder(Arc::new(link_table().unwrap()))
//!     .config(&Config::default())
//!     .logger(Arc::new(NoOpLogger))
//!     .build();
//!
//! assert_eq!(state.current_vehicles().generation, 0);
//! state.set_focus(Some("40_101"));
//! assert_eq!(state.settings().focus(), Some("40_101"));
//! ```

use std::sync::{Arc, Mutex};
use std::time::Instant;

use serde::Serialize;
use tokio::sync::watch;

use crate::config::{Config, DeviceConfig, DisplayConfig, FeedConfig};
use crate::log::{Logger, NoOpLogger, RingBufferLogger};
use crate::resolver::PositionResolver;
use crate::serializer::LedStateSerializer;
use crate::snapshot::{Snapshot, SnapshotBuilder};
use crate::topology::Topology;
use crate::vehicle::{Vehicle, VehicleList};

// ============================================================================
// Fetch Status
// ============================================================================

/// Outcome of recent fetch cycles, for status reporting.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchStatus {
    /// Timestamp (ms since start) of the last successful cycle.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_success_ms: Option<u64>,
    /// Message of the most recent failure, cleared on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    /// Failures since the last success.
    pub consecutive_failures: u32,
}

// ============================================================================
// Shared Link State
// ============================================================================

/// Explicitly owned process state, shared behind an `Arc`.
pub struct SharedLinkState {
    topology: Arc<Topology>,
    feed: FeedConfig,
    device: DeviceConfig,
    logger: Arc<dyn Logger>,
    logs: Arc<RingBufferLogger>,
    builder: SnapshotBuilder,
    serializer: LedStateSerializer,
    start_time: Instant,

    vehicles: watch::Sender<Arc<VehicleList>>,
    settings: watch::Sender<DisplayConfig>,
    snapshot: watch::Sender<Arc<Snapshot>>,

    fetch_status: Mutex<FetchStatus>,
}

impl SharedLinkState {
    /// Start building state around a topology.
    pub fn builder(topology: Arc<Topology>) -> SharedLinkStateBuilder {
        SharedLinkStateBuilder {
            topology,
            config: Config::default(),
            logger: Arc::new(NoOpLogger),
            logs: Arc::new(RingBufferLogger::new()),
        }
    }

    /// Get current timestamp in milliseconds since state creation.
    #[inline]
    pub fn now_ms(&self) -> u64 {
        self.start_time.elapsed().as_millis() as u64
    }

    /// The topology in use.
    pub fn topology(&self) -> &Arc<Topology> {
        &self.topology
    }

    /// Feed client configuration.
    pub fn feed_config(&self) -> &FeedConfig {
        &self.feed
    }

    /// Device identification.
    pub fn device(&self) -> &DeviceConfig {
        &self.device
    }

    /// Logger handed to every component.
    pub fn logger(&self) -> &Arc<dyn Logger> {
        &self.logger
    }

    /// Recent log entries captured for the web API.
    pub fn logs(&self) -> &RingBufferLogger {
        &self.logs
    }

    /// Dashboard serializer for this topology.
    pub fn serializer(&self) -> &LedStateSerializer {
        &self.serializer
    }

    // ------------------------------------------------------------------------
    // Vehicle list
    // ------------------------------------------------------------------------

    /// The committed vehicle list.
    pub fn current_vehicles(&self) -> Arc<VehicleList> {
        self.vehicles.borrow().clone()
    }

    /// Receiver notified on every commit.
    pub fn subscribe_vehicles(&self) -> watch::Receiver<Arc<VehicleList>> {
        self.vehicles.subscribe()
    }

    /// Replace the committed list wholesale; returns the new generation.
    ///
    /// Stop names are bound to station ids here, once per commit.
    pub fn commit(&self, mut vehicles: Vec<Vehicle>) -> u64 {
        self.topology.bind_stops(&mut vehicles);
        let mut generation = 0;
        self.vehicles.send_modify(|current| {
            generation = current.generation + 1;
            *current = Arc::new(VehicleList::new(generation, vehicles));
        });
        generation
    }

    // ------------------------------------------------------------------------
    // Display settings
    // ------------------------------------------------------------------------

    /// Current display settings.
    pub fn settings(&self) -> DisplayConfig {
        self.settings.borrow().clone()
    }

    /// Receiver notified on every settings change.
    pub fn subscribe_settings(&self) -> watch::Receiver<DisplayConfig> {
        self.settings.subscribe()
    }

    /// Modify the settings in place; returns the new settings.
    pub fn update_settings(&self, modify: impl FnOnce(&mut DisplayConfig)) -> DisplayConfig {
        self.settings.send_modify(modify);
        self.settings()
    }

    /// Set or clear (`None` or empty) the focus filter.
    pub fn set_focus(&self, vehicle_id: Option<&str>) -> DisplayConfig {
        let id = vehicle_id.unwrap_or("");
        self.update_settings(|s| *s = s.clone().with_focused_vehicle(id))
    }

    // ------------------------------------------------------------------------
    // Snapshots
    // ------------------------------------------------------------------------

    /// Build a snapshot from the committed list and current settings.
    pub fn build_snapshot(&self) -> Snapshot {
        let settings = self.settings();
        self.builder.build(self.current_vehicles(), &settings)
    }

    /// Build a snapshot from explicit inputs.
    pub fn build_snapshot_of(&self, vehicles: Arc<VehicleList>, settings: &DisplayConfig) -> Snapshot {
        self.builder.build(vehicles, settings)
    }

    /// The most recently rendered snapshot.
    pub fn latest_snapshot(&self) -> Arc<Snapshot> {
        self.snapshot.borrow().clone()
    }

    /// Receiver notified on every rendered snapshot.
    pub fn subscribe_snapshots(&self) -> watch::Receiver<Arc<Snapshot>> {
        self.snapshot.subscribe()
    }

    /// Publish a rendered snapshot.
    pub fn publish_snapshot(&self, snapshot: Arc<Snapshot>) {
        self.snapshot.send_replace(snapshot);
    }

    // ------------------------------------------------------------------------
    // Fetch status
    // ------------------------------------------------------------------------

    /// Record a successful cycle.
    pub fn record_fetch_success(&self) {
        let now_ms = self.now_ms();
        if let Ok(mut status) = self.fetch_status.lock() {
            status.last_success_ms = Some(now_ms);
            status.last_error = None;
            status.consecutive_failures = 0;
        }
    }

    /// Record a failed cycle.
    pub fn record_fetch_failure(&self, error: &impl core::fmt::Display) {
        if let Ok(mut status) = self.fetch_status.lock() {
            status.last_error = Some(error.to_string());
            status.consecutive_failures = status.consecutive_failures.saturating_add(1);
        }
    }

    /// Recent fetch outcomes.
    pub fn fetch_status(&self) -> FetchStatus {
        self.fetch_status
            .lock()
            .map(|s| s.clone())
            .unwrap_or_default()
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Builder for [`SharedLinkState`].
pub struct SharedLinkStateBuilder {
    topology: Arc<Topology>,
    config: Config,
    logger: Arc<dyn Logger>,
    logs: Arc<RingBufferLogger>,
}

impl SharedLinkStateBuilder {
    /// Use this configuration (feed, display, device sections).
    pub fn config(mut self, config: &Config) -> Self {
        self.config = config.clone();
        self
    }

    /// Logger handed to every component.
    pub fn logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = logger;
        self
    }

    /// Ring buffer served by the log endpoint.
    ///
    /// Add the same buffer to the logger's sinks for it to receive entries.
    pub fn log_buffer(mut self, logs: Arc<RingBufferLogger>) -> Self {
        self.logs = logs;
        self
    }

    /// Create the state with an empty committed list and an all-off snapshot.
    pub fn build(self) -> SharedLinkState {
        let resolver = PositionResolver::new(self.topology.clone(), self.logger.clone());
        let builder = SnapshotBuilder::new(resolver, self.logger.clone());
        let serializer = LedStateSerializer::new(self.topology.clone());

        let empty = Arc::new(VehicleList::default());
        let initial = builder.build(empty.clone(), &self.config.display);

        let (vehicles, _) = watch::channel(empty);
        let (settings, _) = watch::channel(self.config.display.clone());
        let (snapshot, _) = watch::channel(Arc::new(initial));

        SharedLinkState {
            topology: self.topology,
            feed: self.config.feed,
            device: self.config.device,
            logger: self.logger,
            logs: self.logs,
            builder,
            serializer,
            start_time: Instant::now(),
            vehicles,
            settings,
            snapshot,
            fetch_status: Mutex::new(FetchStatus::default()),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
