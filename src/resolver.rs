//! Vehicle-to-LED position resolution.
//!
//! [`PositionResolver`] turns one [`Vehicle`] into exactly one LED index:
//!
//! 1. A vehicle matching a [`CorridorOverride`] is sent to that entry's index.
//! 2. `AtStation` looks up the closest stop and takes its platform LED.
//! 3. `Moving` looks up the next stop and takes its enroute LED.
//! 4. An unknown station, or an index past the strip, falls back to index 0
//!    with a warning so the vehicle stays visible.
//!
//! The result depends only on the vehicle and the topology; the vehicle's
//! state was classified from its own offsets before it got here.

use std::sync::Arc;

use crate::log::Logger;
use crate::log_warn;
use crate::topology::{Topology, JUNCTION_LED};
use crate::vehicle::{Direction, Line, Vehicle, VehicleState};

/// Index used when a vehicle cannot be placed.
pub const FALLBACK_INDEX: usize = 0;

/// A removable redirect for one cross-corridor transition.
///
/// Overrides cover track the strip does not model yet. Each one matches a
/// moving vehicle by line, direction, and the stop pair it is travelling
/// between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CorridorOverride {
    /// Line the redirect applies to.
    pub line: Line,
    /// Direction the redirect applies to.
    pub direction: Direction,
    /// Closest stop name (the stop being left).
    pub from_stop: &'static str,
    /// Next stop name (the stop being approached).
    pub to_stop: &'static str,
    /// LED to light instead.
    pub index: usize,
    /// Why the redirect exists.
    pub reason: &'static str,
}

impl CorridorOverride {
    /// Returns true if `vehicle` is making this transition.
    pub fn matches(&self, vehicle: &Vehicle) -> bool {
        vehicle.state == VehicleState::Moving
            && vehicle.line == self.line
            && vehicle.direction == self.direction
            && vehicle.closest_stop.name == self.from_stop
            && vehicle.next_stop.name == self.to_stop
    }
}

/// Temporary redirects for the built-in topology.
///
/// TODO: drop the Judkins Park entry once the I-90 connection to
/// Int'l Dist/Chinatown is wired into the strip.
pub const TEMPORARY_OVERRIDES: &[CorridorOverride] = &[CorridorOverride {
    line: Line::Two,
    direction: Direction::Southbound,
    from_stop: "Judkins Park",
    to_stop: "Int'l Dist/Chinatown",
    index: JUNCTION_LED,
    reason: "2 Line junction with the 1 Line corridor is not on the strip",
}];

/// How an index was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionKind {
    /// Normal topology lookup.
    Station,
    /// A [`CorridorOverride`] applied.
    Override,
    /// The station was not in the topology; fell back to [`FALLBACK_INDEX`].
    StationNotFound,
    /// The looked-up index was past the strip; fell back to [`FALLBACK_INDEX`].
    OutOfRange,
}

/// Result of resolving one vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    /// LED index, always inside the strip.
    pub index: usize,
    /// How `index` was obtained.
    pub kind: ResolutionKind,
}

impl Resolution {
    /// Returns true if the vehicle was placed without a fallback.
    #[inline]
    pub fn is_placed(&self) -> bool {
        matches!(self.kind, ResolutionKind::Station | ResolutionKind::Override)
    }
}

/// Maps vehicles onto LED indices.
#[derive(Clone)]
pub struct PositionResolver {
    topology: Arc<Topology>,
    overrides: &'static [CorridorOverride],
    logger: Arc<dyn Logger>,
}

impl PositionResolver {
    /// Creates a resolver with the built-in [`TEMPORARY_OVERRIDES`].
    pub fn new(topology: Arc<Topology>, logger: Arc<dyn Logger>) -> Self {
        Self::with_overrides(topology, TEMPORARY_OVERRIDES, logger)
    }

    /// Creates a resolver with a custom override table (possibly empty).
    pub fn with_overrides(
        topology: Arc<Topology>,
        overrides: &'static [CorridorOverride],
        logger: Arc<dyn Logger>,
    ) -> Self {
        Self {
            topology,
            overrides,
            logger,
        }
    }

    /// The topology this resolver reads.
    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    /// Resolve a vehicle to its LED index; see the module docs for the rules.
    pub fn resolve(&self, vehicle: &Vehicle) -> Resolution {
        if let Some(entry) = self.overrides.iter().find(|o| o.matches(vehicle)) {
            return self.checked(vehicle, entry.index, ResolutionKind::Override);
        }

        let stop = match vehicle.state {
            VehicleState::AtStation => &vehicle.closest_stop,
            VehicleState::Moving => &vehicle.next_stop,
        };

        // Stops bound at commit skip the name lookup
        let station = match stop.station {
            Some(id) => self.topology.get(id),
            None => self.topology.lookup(&stop.name),
        };
        let Some(station) = station else {
            log_warn!(
                self.logger,
                "Station '{}' ({}) not found for vehicle {} on {}, using LED {}",
                stop.name,
                stop.id,
                vehicle.id,
                vehicle.line.name(),
                FALLBACK_INDEX
            );
            return Resolution {
                index: FALLBACK_INDEX,
                kind: ResolutionKind::StationNotFound,
            };
        };

        let index = station.index_for(vehicle.direction, vehicle.state);
        self.checked(vehicle, index, ResolutionKind::Station)
    }

    fn checked(&self, vehicle: &Vehicle, index: usize, kind: ResolutionKind) -> Resolution {
        if self.topology.in_range(index) {
            return Resolution { index, kind };
        }
        log_warn!(
            self.logger,
            "LED index {} out of range (0..{}) for vehicle {}, using LED {}",
            index,
            self.topology.led_count(),
            vehicle.id,
            FALLBACK_INDEX
        );
        Resolution {
            index: FALLBACK_INDEX,
            kind: ResolutionKind::OutOfRange,
        }
    }
}
