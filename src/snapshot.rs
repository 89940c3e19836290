//! Render snapshots.
//!
//! A [`Snapshot`] pairs one committed [`VehicleList`] with the aggregation
//! derived from it. The strip push and the dashboard JSON are both produced
//! from the same snapshot, so they always agree.

use std::borrow::Cow;
use std::sync::Arc;

use serde::Serialize;

use crate::aggregator::VehicleAggregator;
use crate::classify::classify;
use crate::color::Rgb;
use crate::config::DisplayConfig;
use crate::log::Logger;
use crate::log_debug;
use crate::resolver::PositionResolver;
use crate::vehicle::{Direction, Line, Vehicle, VehicleList, VehicleState};

/// Where one displayed vehicle ended up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Placement {
    /// Vehicle id.
    pub vehicle_id: String,
    /// Line.
    pub line: Line,
    /// Direction of travel.
    pub direction: Direction,
    /// State used for resolution (classified with the current threshold).
    pub state: VehicleState,
    /// Name of the stop the LED represents.
    pub station: String,
    /// LED index.
    pub led_index: usize,
    /// False when the vehicle sits on the fallback LED.
    pub placed: bool,
}

/// One internally consistent render input.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    /// The committed list this snapshot was built from.
    pub vehicles: Arc<VehicleList>,
    /// Per-LED occupancy.
    pub aggregator: VehicleAggregator,
    /// One color per LED.
    pub colors: Vec<Rgb>,
    /// Displayed vehicles and their LEDs, in list order.
    pub placements: Vec<Placement>,
    /// Focus filter in effect, if any.
    pub focus: Option<String>,
}

impl Snapshot {
    /// Commit generation of the underlying list.
    #[inline]
    pub fn generation(&self) -> u64 {
        self.vehicles.generation
    }

    /// Strip length.
    #[inline]
    pub fn led_count(&self) -> usize {
        self.colors.len()
    }
}

/// Builds snapshots: focus filter, classify, resolve, aggregate, color.
#[derive(Clone)]
pub struct SnapshotBuilder {
    resolver: PositionResolver,
    logger: Arc<dyn Logger>,
}

impl SnapshotBuilder {
    /// Creates a builder around a resolver.
    pub fn new(resolver: PositionResolver, logger: Arc<dyn Logger>) -> Self {
        Self { resolver, logger }
    }

    /// The resolver in use.
    pub fn resolver(&self) -> &PositionResolver {
        &self.resolver
    }

    /// Build a snapshot of `vehicles` under `display` settings.
    pub fn build(&self, vehicles: Arc<VehicleList>, display: &DisplayConfig) -> Snapshot {
        let led_count = self.resolver.topology().led_count();
        let mut aggregator = VehicleAggregator::new(led_count, self.logger.clone());
        let mut placements = Vec::with_capacity(vehicles.len());
        let focus = display.focus();

        for vehicle in &vehicles.vehicles {
            if focus.is_some_and(|id| id != vehicle.id) {
                continue;
            }
            let vehicle = reclassified(vehicle, display.at_station_threshold_secs);
            let resolution = self.resolver.resolve(&vehicle);
            // Rejections are logged by the aggregator; the vehicle still
            // appears in `placements`
            let _ = aggregator.add_vehicle(resolution.index, vehicle.line, &vehicle.id);

            let station = match vehicle.state {
                VehicleState::AtStation => &vehicle.closest_stop.name,
                VehicleState::Moving => &vehicle.next_stop.name,
            };
            placements.push(Placement {
                vehicle_id: vehicle.id.clone(),
                line: vehicle.line,
                direction: vehicle.direction,
                state: vehicle.state,
                station: station.clone(),
                led_index: resolution.index,
                placed: resolution.is_placed(),
            });
        }

        if let Some(id) = focus {
            log_debug!(
                self.logger,
                "Focus on {}: {} of {} vehicles shown",
                id,
                placements.len(),
                vehicles.len()
            );
        }

        let colors = aggregator.colors(&display.color_scheme());
        Snapshot {
            vehicles,
            aggregator,
            colors,
            placements,
            focus: focus.map(str::to_owned),
        }
    }
}

/// Re-derive the state with `threshold` so threshold changes apply without
/// waiting for the next fetch.
fn reclassified(vehicle: &Vehicle, threshold_secs: u32) -> Cow<'_, Vehicle> {
    let state = classify(i64::from(vehicle.next_stop_offset_secs), threshold_secs);
    if state == vehicle.state {
        Cow::Borrowed(vehicle)
    } else {
        let mut owned = vehicle.clone();
        owned.state = state;
        Cow::Owned(owned)
    }
}
