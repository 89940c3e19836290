//! Vehicle records produced by each fetch cycle.
//!
//! A [`VehicleList`] is built wholesale by the fetcher and replaced on every
//! successful cycle; nothing in it is patched in place.

use serde::{Deserialize, Serialize};

use crate::topology::StationId;

/// A rail line served by the strip.
///
/// Each line is fetched from the feed under its own route id and carries its
/// own configured color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Line {
    /// 1 Line (north-south spine).
    #[serde(rename = "1")]
    One,
    /// 2 Line (east side).
    #[serde(rename = "2")]
    Two,
}

impl Line {
    /// Every line, in fetch order.
    pub const ALL: [Line; 2] = [Line::One, Line::Two];

    /// Feed route id for this line.
    #[inline]
    pub const fn route_id(&self) -> &'static str {
        match self {
            Line::One => "40_100479",
            Line::Two => "40_2LINE",
        }
    }

    /// Human-readable line name.
    #[inline]
    pub const fn name(&self) -> &'static str {
        match self {
            Line::One => "Line 1",
            Line::Two => "Line 2",
        }
    }

    /// Look up a line by its feed route id.
    ///
    /// ```
    /// use linklight::Line;
    ///
    /// assert_eq!(Line::from_route_id("40_2LINE"), Some(Line::Two));
    /// assert_eq!(Line::from_route_id("40_999"), None);
    /// ```
    pub fn from_route_id(route_id: &str) -> Option<Self> {
        Line::ALL.into_iter().find(|line| line.route_id() == route_id)
    }
}

/// Direction of travel as reported by the feed's trip reference.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Feed `directionId` "1".
    Northbound,
    /// Feed `directionId` "0".
    Southbound,
}

impl Direction {
    /// Parse a feed `directionId`.
    ///
    /// ```
    /// use linklight::Direction;
    ///
    /// assert_eq!(Direction::from_direction_id("1"), Some(Direction::Northbound));
    /// assert_eq!(Direction::from_direction_id("0"), Some(Direction::Southbound));
    /// assert_eq!(Direction::from_direction_id(""), None);
    /// ```
    pub fn from_direction_id(id: &str) -> Option<Self> {
        match id.trim() {
            "1" => Some(Direction::Northbound),
            "0" => Some(Direction::Southbound),
            _ => None,
        }
    }

    /// Returns the direction as a lowercase string.
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Direction::Northbound => "northbound",
            Direction::Southbound => "southbound",
        }
    }
}

/// Whether a vehicle is dwelling at a platform or travelling between stations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VehicleState {
    /// At (or about to reach) a platform.
    AtStation,
    /// Between two stations.
    Moving,
}

impl VehicleState {
    /// Returns the state as an uppercase label.
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            VehicleState::AtStation => "AT_STATION",
            VehicleState::Moving => "MOVING",
        }
    }
}

/// A stop as reported by the feed: raw id plus the resolved stop name.
///
/// The topology is keyed by `name`; when the feed omits a stop reference the
/// name falls back to the id.
#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StopRef {
    /// Feed stop id (e.g. `40_990001`).
    pub id: String,
    /// Stop name used for topology lookup (e.g. `Westlake`).
    pub name: String,
    /// Station bound from `name` when the list was committed; `None` until
    /// then, or when the name is not in the topology.
    #[serde(skip)]
    pub station: Option<StationId>,
}

impl StopRef {
    /// Creates a stop reference.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            station: None,
        }
    }

    /// Creates a stop reference whose id and name are the same string.
    pub fn named(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: name.clone(),
            name,
            station: None,
        }
    }
}

/// One active transit vehicle in a fetch cycle.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vehicle {
    /// Vehicle identity (feed vehicle id, or trip id when absent).
    pub id: String,
    /// Trip the vehicle is serving.
    pub trip_id: String,
    /// Line the vehicle was fetched under.
    pub line: Line,
    /// Direction of travel.
    pub direction: Direction,
    /// Classified state, derived from `next_stop_offset_secs`.
    pub state: VehicleState,
    /// Stop the vehicle is nearest to.
    pub closest_stop: StopRef,
    /// Seconds relative to the closest stop (negative once departed).
    pub closest_stop_offset_secs: i32,
    /// Stop the vehicle is heading to.
    pub next_stop: StopRef,
    /// Seconds until arrival at the next stop.
    pub next_stop_offset_secs: i32,
    /// Trip headsign, informational only.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub headsign: String,
}

/// A complete, committed vehicle list.
///
/// `generation` increases by one on every commit, so two lists with the same
/// generation are the same commit.
#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VehicleList {
    /// Commit counter; 0 is the empty list present before the first fetch.
    pub generation: u64,
    /// Every vehicle in the cycle.
    pub vehicles: Vec<Vehicle>,
}

impl VehicleList {
    /// Creates a list for the given commit.
    pub fn new(generation: u64, vehicles: Vec<Vehicle>) -> Self {
        Self {
            generation,
            vehicles,
        }
    }

    /// Number of vehicles in the list.
    #[inline]
    pub fn len(&self) -> usize {
        self.vehicles.len()
    }

    /// Returns true if the list holds no vehicles.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vehicles.is_empty()
    }

    /// Iterate vehicles of one line.
    pub fn on_line(&self, line: Line) -> impl Iterator<Item = &Vehicle> {
        self.vehicles.iter().filter(move |v| v.line == line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_route_ids_round_trip() {
        for line in Line::ALL {
            assert_eq!(Line::from_route_id(line.route_id()), Some(line));
        }
    }

    #[test]
    fn line_serializes_as_number_string() {
        assert_eq!(serde_json::to_string(&Line::One).unwrap(), "\"1\"");
        assert_eq!(serde_json::to_string(&Line::Two).unwrap(), "\"2\"");
    }

    #[test]
    fn direction_id_whitespace_tolerated() {
        assert_eq!(Direction::from_direction_id(" 1 "), Some(Direction::Northbound));
        assert_eq!(Direction::from_direction_id("2"), None);
    }

    #[test]
    fn state_labels() {
        assert_eq!(VehicleState::AtStation.as_str(), "AT_STATION");
        assert_eq!(VehicleState::Moving.as_str(), "MOVING");
    }

    #[test]
    fn stop_ref_named_uses_same_id() {
        let stop = StopRef::named("Westlake");
        assert_eq!(stop.id, "Westlake");
        assert_eq!(stop.name, "Westlake");
    }

    #[test]
    fn vehicle_list_filters_by_line() {
        let make = |id: &str, line| Vehicle {
            id: id.into(),
            trip_id: id.into(),
            line,
            direction: Direction::Northbound,
            state: VehicleState::Moving,
            closest_stop: StopRef::named("SODO"),
            closest_stop_offset_secs: 0,
            next_stop: StopRef::named("Stadium"),
            next_stop_offset_secs: 60,
            headsign: String::new(),
        };
        let list = VehicleList::new(1, vec![make("a", Line::One), make("b", Line::Two)]);
        assert_eq!(list.len(), 2);
        let ids: Vec<_> = list.on_line(Line::Two).map(|v| v.id.as_str()).collect();
        assert_eq!(ids, vec!["b"]);
    }
}
