//! Station-to-LED topology.
//!
//! The [`Topology`] maps each station name to four physical LED indices and
//! describes how the strip is divided into labelled [`StripRow`]s. It is
//! validated once at construction and never mutated afterwards, so it can be
//! shared across tasks behind an `Arc` (or the process-wide [`link_topology`])
//! without locking.
//!
//! Station names must match the feed's stop-name vocabulary exactly; lookup
//! is case- and whitespace-sensitive.
//!
//! # Example
//!
//! ```rust
//! use linklight::topology::{Station, StripRow, Topology};
//!
//! let topology = Topology::builder(10)
//!     .station(Station::new("Alpha", 1, 0, 8, 7))
//!     .row(StripRow::new("Northbound", 0, 5, false))
//!     .build()
//!     .unwrap();
//!
//! let alpha = topology.lookup("Alpha").unwrap();
//! assert_eq!(alpha.northbound, 1);
//! assert!(topology.lookup("alpha").is_none());
//! ```

use std::collections::HashMap;
use std::sync::OnceLock;

use serde::Serialize;
use thiserror::Error;

use crate::vehicle::{Direction, Vehicle, VehicleState};

/// Number of LEDs on the physical strip.
pub const LED_COUNT: usize = 157;

/// Compact station identity, assigned in table order at load time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StationId(u16);

impl StationId {
    /// Position of the station in the table.
    #[inline]
    pub const fn index(&self) -> usize {
        self.0 as usize
    }
}

/// One station and its four LED coordinates.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Station {
    /// Feed stop name.
    pub name: String,
    /// LED lit while a northbound vehicle is at the platform.
    #[serde(rename = "northboundIndex")]
    pub northbound: usize,
    /// LED lit while a northbound vehicle approaches this station.
    #[serde(rename = "northboundEnrouteIndex")]
    pub northbound_enroute: usize,
    /// LED lit while a southbound vehicle is at the platform.
    #[serde(rename = "southboundIndex")]
    pub southbound: usize,
    /// LED lit while a southbound vehicle approaches this station.
    #[serde(rename = "southboundEnrouteIndex")]
    pub southbound_enroute: usize,
}

impl Station {
    /// Creates a station mapping.
    pub fn new(
        name: impl Into<String>,
        northbound: usize,
        northbound_enroute: usize,
        southbound: usize,
        southbound_enroute: usize,
    ) -> Self {
        Self {
            name: name.into(),
            northbound,
            northbound_enroute,
            southbound,
            southbound_enroute,
        }
    }

    /// Select the LED for a direction and state.
    ///
    /// At-station selects the platform LED; moving selects the enroute LED
    /// that leads into this station.
    #[inline]
    pub const fn index_for(&self, direction: Direction, state: VehicleState) -> usize {
        match (direction, state) {
            (Direction::Northbound, VehicleState::AtStation) => self.northbound,
            (Direction::Northbound, VehicleState::Moving) => self.northbound_enroute,
            (Direction::Southbound, VehicleState::AtStation) => self.southbound,
            (Direction::Southbound, VehicleState::Moving) => self.southbound_enroute,
        }
    }

    /// All four indices, in field order.
    #[inline]
    pub const fn indices(&self) -> [usize; 4] {
        [
            self.northbound,
            self.northbound_enroute,
            self.southbound,
            self.southbound_enroute,
        ]
    }
}

/// A labelled physical segment of the strip.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StripRow {
    /// Label shown by the dashboard (e.g. "1 Line Northbound").
    pub label: String,
    /// First LED index of the segment.
    pub start: usize,
    /// Number of LEDs in the segment.
    pub count: usize,
    /// Whether the client should walk this row from high index to low.
    pub descending: bool,
}

impl StripRow {
    /// Creates a row.
    pub fn new(label: impl Into<String>, start: usize, count: usize, descending: bool) -> Self {
        Self {
            label: label.into(),
            start,
            count,
            descending,
        }
    }

    /// Returns true if `index` falls inside this row.
    #[inline]
    pub fn contains(&self, index: usize) -> bool {
        index >= self.start && index < self.start + self.count
    }

    /// LED indices covered by the row, ascending.
    #[inline]
    pub fn indices(&self) -> core::ops::Range<usize> {
        self.start..self.start + self.count
    }
}

/// Reasons a topology table is rejected at construction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TopologyError {
    /// A station index is not below the LED count.
    #[error("station '{station}' index {index} is outside 0..{led_count}")]
    IndexOutOfRange {
        /// Offending station.
        station: String,
        /// Offending index.
        index: usize,
        /// Strip length.
        led_count: usize,
    },
    /// Two entries share a station name.
    #[error("station '{0}' is defined more than once")]
    DuplicateStation(String),
    /// A row extends past the end of the strip.
    #[error("row '{label}' ends at {end}, past the strip length {led_count}")]
    RowOutOfRange {
        /// Offending row label.
        label: String,
        /// One past the row's last index.
        end: usize,
        /// Strip length.
        led_count: usize,
    },
}

/// Immutable station-to-LED mapping plus strip layout.
#[derive(Debug, Clone)]
pub struct Topology {
    led_count: usize,
    stations: Vec<Station>,
    by_name: HashMap<String, StationId>,
    rows: Vec<StripRow>,
}

impl Topology {
    /// Start building a topology for a strip of `led_count` LEDs.
    pub fn builder(led_count: usize) -> TopologyBuilder {
        TopologyBuilder {
            led_count,
            stations: Vec::new(),
            rows: Vec::new(),
        }
    }

    /// Number of LEDs on the strip.
    #[inline]
    pub fn led_count(&self) -> usize {
        self.led_count
    }

    /// Exact-match lookup by station name.
    pub fn lookup(&self, name: &str) -> Option<&Station> {
        self.station_id(name).map(|id| self.station(id))
    }

    /// Resolve a station name to its compact id.
    #[inline]
    pub fn station_id(&self, name: &str) -> Option<StationId> {
        self.by_name.get(name).copied()
    }

    /// Station for an id handed out by this topology.
    #[inline]
    pub fn station(&self, id: StationId) -> &Station {
        &self.stations[id.index()]
    }

    /// Station for an id, or `None` if the id is not from this table.
    #[inline]
    pub fn get(&self, id: StationId) -> Option<&Station> {
        self.stations.get(id.index())
    }

    /// Bind each vehicle's stop names to station ids once, so resolution
    /// on every render indexes the table instead of hashing names.
    ///
    /// Unknown names stay unbound. Bound ids are only meaningful to this
    /// topology.
    pub fn bind_stops(&self, vehicles: &mut [Vehicle]) {
        for vehicle in vehicles {
            for stop in [&mut vehicle.closest_stop, &mut vehicle.next_stop] {
                stop.station = self.station_id(&stop.name);
            }
        }
    }

    /// All stations in table order.
    pub fn stations(&self) -> &[Station] {
        &self.stations
    }

    /// Physical rows in table order.
    pub fn rows(&self) -> &[StripRow] {
        &self.rows
    }

    /// Returns true if `index` addresses a physical LED.
    #[inline]
    pub fn in_range(&self, index: usize) -> bool {
        index < self.led_count
    }
}

/// Builder for [`Topology`]; validation happens in [`build`](Self::build).
#[derive(Debug, Clone)]
pub struct TopologyBuilder {
    led_count: usize,
    stations: Vec<Station>,
    rows: Vec<StripRow>,
}

impl TopologyBuilder {
    /// Add a station.
    pub fn station(mut self, station: Station) -> Self {
        self.stations.push(station);
        self
    }

    /// Add a physical row.
    pub fn row(mut self, row: StripRow) -> Self {
        self.rows.push(row);
        self
    }

    /// Validate and freeze the table.
    ///
    /// Every station index must be below the LED count, names must be
    /// unique, and rows must fit on the strip. Indices may repeat across
    /// stations; shared-corridor aliasing is intentional.
    pub fn build(self) -> Result<Topology, TopologyError> {
        let led_count = self.led_count;
        let mut by_name = HashMap::with_capacity(self.stations.len());

        for (position, station) in self.stations.iter().enumerate() {
            if let Some(&index) = station.indices().iter().find(|&&i| i >= led_count) {
                return Err(TopologyError::IndexOutOfRange {
                    station: station.name.clone(),
                    index,
                    led_count,
                });
            }
            let id = StationId(position as u16);
            if by_name.insert(station.name.clone(), id).is_some() {
                return Err(TopologyError::DuplicateStation(station.name.clone()));
            }
        }

        for row in &self.rows {
            let end = row.start + row.count;
            if end > led_count {
                return Err(TopologyError::RowOutOfRange {
                    label: row.label.clone(),
                    end,
                    led_count,
                });
            }
        }

        Ok(Topology {
            led_count,
            stations: self.stations,
            by_name,
            rows: self.rows,
        })
    }
}

// ============================================================================
// Built-in table
// ============================================================================

// 1 Line stations south of Rainier Beach, northbound order. They sit on a
// tail segment after the 2 Line rows.
const LINE_ONE_SOUTH_STATIONS: [&str; 6] = [
    "Federal Way Downtown",
    "Star Lake",
    "Kent Des Moines",
    "Angle Lake",
    "SeaTac/Airport",
    "Tukwila Int'l Blvd",
];

// 1 Line stations from Rainier Beach north, northbound order.
const LINE_ONE_STATIONS: [&str; 21] = [
    "Rainier Beach",
    "Othello",
    "Columbia City",
    "Mount Baker",
    "Beacon Hill",
    "SODO",
    "Stadium",
    "Int'l Dist/Chinatown",
    "Pioneer Square",
    "Symphony",
    "Westlake",
    "Capitol Hill",
    "Univ of Washington",
    "U District",
    "Roosevelt",
    "Northgate",
    "Pinehurst",
    "Shoreline South/148th",
    "Shoreline North/185th",
    "Mountlake Terrace",
    "Lynnwood City Center",
];

// 2 Line stations, northbound (toward Redmond) order.
const LINE_TWO_STATIONS: [&str; 12] = [
    "Judkins Park",
    "Mercer Island",
    "South Bellevue",
    "East Main",
    "Bellevue Downtown",
    "Wilburton",
    "Spring District",
    "BelRed",
    "Overlake Village",
    "Redmond Technology",
    "Marymoor Village",
    "Downtown Redmond",
];

/// LED marking the unbuilt 2 Line / 1 Line junction.
pub const JUNCTION_LED: usize = 66;

/// Builds the hand-authored Link light rail table.
///
/// Layout, by index range:
///
/// | Range | Row |
/// |-------|-----|
/// | 0..42 | 1 Line northbound (enroute, platform pairs) |
/// | 42..66 | 2 Line northbound |
/// | 66 | junction marker |
/// | 67..109 | 1 Line southbound |
/// | 109..133 | 2 Line southbound |
/// | 133..145 | 1 Line south tail, northbound |
/// | 145..157 | 1 Line south tail, southbound |
///
/// Each station's enroute LED sits one below its platform LED, in the
/// direction of travel.
pub fn link_table() -> Result<Topology, TopologyError> {
    let mut builder = Topology::builder(LED_COUNT);

    for (k, name) in LINE_ONE_STATIONS.iter().enumerate() {
        let northbound = 2 * k + 1;
        let southbound = 108 - 2 * k;
        builder = builder.station(Station::new(
            *name,
            northbound,
            northbound - 1,
            southbound,
            southbound - 1,
        ));
    }

    for (k, name) in LINE_TWO_STATIONS.iter().enumerate() {
        let northbound = 43 + 2 * k;
        let southbound = 132 - 2 * k;
        builder = builder.station(Station::new(
            *name,
            northbound,
            northbound - 1,
            southbound,
            southbound - 1,
        ));
    }

    for (k, name) in LINE_ONE_SOUTH_STATIONS.iter().enumerate() {
        let northbound = 134 + 2 * k;
        let southbound = 156 - 2 * k;
        builder = builder.station(Station::new(
            *name,
            northbound,
            northbound - 1,
            southbound,
            southbound - 1,
        ));
    }

    builder
        .row(StripRow::new("1 Line Northbound", 0, 42, false))
        .row(StripRow::new("2 Line Northbound", 42, 24, false))
        .row(StripRow::new("2 Line Junction", JUNCTION_LED, 1, false))
        .row(StripRow::new("1 Line Southbound", 67, 42, true))
        .row(StripRow::new("2 Line Southbound", 109, 24, true))
        .row(StripRow::new("1 Line South Northbound", 133, 12, false))
        .row(StripRow::new("1 Line South Southbound", 145, 12, true))
        .build()
}

/// The process-wide built-in topology, created on first use.
///
/// The built-in table is validated by the test suite, so a failure here is a
/// programming error in the table itself; it degrades to an empty topology
/// (every vehicle then falls back to index 0) instead of aborting.
pub fn link_topology() -> &'static Topology {
    static TOPOLOGY: OnceLock<Topology> = OnceLock::new();
    TOPOLOGY.get_or_init(|| {
        link_table().unwrap_or_else(|err| {
            tracing::error!("built-in topology rejected: {}", err);
            Topology {
                led_count: LED_COUNT,
                stations: Vec::new(),
                by_name: HashMap::new(),
                rows: Vec::new(),
            }
        })
    })
}
