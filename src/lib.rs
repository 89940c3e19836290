//! # linklight
//!
//! Live light-rail vehicle positions mirrored onto a single addressable LED
//! strip, with a JSON API for a dashboard.
//!
//! ## Features
//!
//! - **Feed parsing**: trips-for-route documents for the 1 Line and 2 Line
//! - **Position resolution**: station table plus corridor overrides map each vehicle to one LED
//! - **Aggregation**: per-LED occupancy reduced to line or shared colors
//! - **Atomic handoff**: fetch and render tasks exchange whole lists, never partial ones
//! - **Web API**: dashboard LED state, trains, stations, settings and logs
//!
//! ## Architecture
//!
//! - `vehicle`, `classify` - Vehicle records and at-station classification
//! - `topology` - Station-to-LED table for the strip
//! - `resolver`, `aggregator` - Vehicle to LED index, LED index to color
//! - `snapshot`, `serializer` - Render-cycle state and its dashboard encoding
//! - `traits` - Strip and feed abstractions
//! - `hal` - Concrete strips and mocks for testing
//! - `services` - Shared state, fetch/render tasks and the web API
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use linklight::{
//!     config::DisplayConfig,
//!     log::NoOpLogger,
//!     resolver::PositionResolver,
//!     snapshot::SnapshotBuilder,
//!     topology::link_table,
//!     Direction, Line, StopRef, Vehicle, VehicleList, VehicleState,
//! };
//!
//! let topology = Arc::new(link_table().unwrap());
//! let resolver = PositionResolver::new(topology, Arc::new(NoOpLogger));
//! let builder = SnapshotBuilder::new(resolver, Arc::new(NoOpLogger));
//!
//! let vehicle = Vehicle {
//!     id: "40_101".into(),
//!     trip_id: "40_t1".into(),
//!     line: Line::One,
//!     direction: Direction::Northbound,
//!     state: VehicleState::AtStation,
//!     closest_stop: StopRef::new("40_990005", "Westlake"),
//!     closest_stop_offset_secs: 0,
//!     next_stop: StopRef::new("40_990005", "Westlake"),
//!     next_stop_offset_secs: 5,
//!     headsign: String::new(),
//! };
//!
//! let snapshot = builder.build(Arc::new(VehicleList::new(1, vec![vehicle])), &DisplayConfig::default());
//! assert_eq!(snapshot.placements[0].led_index, 21);
//! assert!(!snapshot.colors[21].is_off());
//! ```

#![warn(missing_docs)]

/// Per-LED vehicle accumulation and color reduction.
pub mod aggregator;
/// At-station vs. moving classification.
pub mod classify;
/// RGB colors and hex parsing.
pub mod color;
/// Runtime configuration.
pub mod config;
/// Feed document parsing and fetch errors.
pub mod feed;
/// Hardware abstraction layer with mock implementations for testing.
pub mod hal;
/// Logger trait, sinks and macros.
pub mod log;
/// Process-wide tracing subscriber setup.
pub mod logging;
/// Vehicle-to-LED position resolution.
pub mod resolver;
/// Dashboard encoding of a snapshot.
pub mod serializer;
/// Shared state, fetch/render tasks and network services.
pub mod services;
/// Render-cycle state built from one committed vehicle list.
pub mod snapshot;
/// Station-to-LED table.
pub mod topology;
/// Core traits for the strip and the feed.
pub mod traits;
/// Vehicle records.
pub mod vehicle;

// Re-exports for convenience
pub use aggregator::{AggregateError, ColorScheme, SlotState, VehicleAggregator};
pub use classify::classify;
pub use color::Rgb;
pub use config::{Config, DeviceConfig, DisplayConfig, FeedConfig, WebConfig};
pub use feed::{parse_trips_for_route, FeedError, FetchError};
pub use resolver::{PositionResolver, Resolution, ResolutionKind};
pub use serializer::{LedStateMessage, LedStateSerializer};
pub use snapshot::{Placement, Snapshot, SnapshotBuilder};
pub use topology::{link_table, Station, StripRow, Topology, LED_COUNT};
pub use traits::{FeedSource, LedStrip};
pub use vehicle::{Direction, Line, StopRef, Vehicle, VehicleList, VehicleState};
