//! Per-LED vehicle accumulation and color reduction.
//!
//! The aggregator is rebuilt every render cycle: [`reset`](VehicleAggregator::reset),
//! one [`add_vehicle`](VehicleAggregator::add_vehicle) per resolved vehicle, then
//! [`colors`](VehicleAggregator::colors) for the strip push. A slot's color
//! depends only on which lines are present:
//!
//! | Lines at slot | Color |
//! |---------------|-------|
//! | none | off |
//! | one line (any count) | that line's color |
//! | two or more lines | the shared color |
//!
//! The shared color is its own configured value, not a blend.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::color::Rgb;
use crate::log::Logger;
use crate::log_warn;
use crate::vehicle::Line;

/// Rejected [`VehicleAggregator::add_vehicle`] calls.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AggregateError {
    /// Index not below the strip length.
    #[error("LED index {index} is outside 0..{led_count}")]
    IndexOutOfRange {
        /// Offending index.
        index: usize,
        /// Strip length.
        led_count: usize,
    },
}

/// A vehicle placed on a slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Occupant {
    /// Line the vehicle runs on.
    pub line: Line,
    /// Vehicle id, exactly as placed.
    pub vehicle_id: String,
}

/// Reduced state of one slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    /// No vehicles.
    Off,
    /// Vehicles from exactly one line.
    Single(Line),
    /// Vehicles from two or more lines.
    Shared,
}

/// Display colors for each reduced slot state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorScheme {
    /// Color for slots holding only 1 Line vehicles.
    pub line1: Rgb,
    /// Color for slots holding only 2 Line vehicles.
    pub line2: Rgb,
    /// Color for slots holding vehicles from both lines.
    pub shared: Rgb,
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self {
            line1: Rgb::new(0, 32, 0),
            line2: Rgb::new(0, 0, 32),
            shared: Rgb::new(32, 32, 0),
        }
    }
}

impl ColorScheme {
    /// Color of one line.
    #[inline]
    pub fn line_color(&self, line: Line) -> Rgb {
        match line {
            Line::One => self.line1,
            Line::Two => self.line2,
        }
    }

    /// Color for a reduced slot state.
    #[inline]
    pub fn color_for(&self, state: SlotState) -> Rgb {
        match state {
            SlotState::Off => Rgb::OFF,
            SlotState::Single(line) => self.line_color(line),
            SlotState::Shared => self.shared,
        }
    }
}

// Unbounded: the fallback LED collects every unplaceable vehicle.
type Slot = Vec<Occupant>;

/// Accumulates vehicles per LED index for one render cycle.
#[derive(Clone)]
pub struct VehicleAggregator {
    slots: Vec<Slot>,
    logger: Arc<dyn Logger>,
}

impl core::fmt::Debug for VehicleAggregator {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("VehicleAggregator")
            .field("led_count", &self.slots.len())
            .field("occupied", &self.occupied().count())
            .finish()
    }
}

impl PartialEq for VehicleAggregator {
    fn eq(&self, other: &Self) -> bool {
        self.slots == other.slots
    }
}

impl VehicleAggregator {
    /// Creates an empty aggregator for a strip of `led_count` LEDs.
    pub fn new(led_count: usize, logger: Arc<dyn Logger>) -> Self {
        Self {
            slots: vec![Slot::new(); led_count],
            logger,
        }
    }

    /// Strip length.
    #[inline]
    pub fn led_count(&self) -> usize {
        self.slots.len()
    }

    /// Empty every slot.
    pub fn reset(&mut self) {
        for slot in &mut self.slots {
            slot.clear();
        }
    }

    /// Place a vehicle on a slot.
    ///
    /// Out-of-range indices are rejected, never moved to another slot.
    pub fn add_vehicle(
        &mut self,
        index: usize,
        line: Line,
        vehicle_id: &str,
    ) -> Result<(), AggregateError> {
        let led_count = self.slots.len();
        let Some(slot) = self.slots.get_mut(index) else {
            log_warn!(
                self.logger,
                "Rejected vehicle {} at LED {}: outside 0..{}",
                vehicle_id,
                index,
                led_count
            );
            return Err(AggregateError::IndexOutOfRange { index, led_count });
        };

        slot.push(Occupant {
            line,
            vehicle_id: vehicle_id.to_owned(),
        });
        Ok(())
    }

    /// Occupants of a slot in insertion order; empty for out-of-range indices.
    pub fn vehicles_at(&self, index: usize) -> &[Occupant] {
        self.slots.get(index).map(|s| s.as_slice()).unwrap_or(&[])
    }

    /// Reduce one slot to its display state.
    pub fn slot_state(&self, index: usize) -> SlotState {
        let mut occupants = self.vehicles_at(index).iter();
        let Some(first) = occupants.next() else {
            return SlotState::Off;
        };
        if occupants.all(|o| o.line == first.line) {
            SlotState::Single(first.line)
        } else {
            SlotState::Shared
        }
    }

    /// One color per LED, covering the whole strip.
    pub fn colors(&self, scheme: &ColorScheme) -> Vec<Rgb> {
        (0..self.slots.len())
            .map(|index| scheme.color_for(self.slot_state(index)))
            .collect()
    }

    /// Indices holding at least one vehicle, ascending.
    pub fn occupied(&self) -> impl Iterator<Item = usize> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| !slot.is_empty())
            .map(|(index, _)| index)
    }

    /// Total number of placed vehicles.
    pub fn vehicle_count(&self) -> usize {
        self.slots.iter().map(|s| s.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::{NoOpLogger, RingBufferLogger};

    fn aggregator(led_count: usize) -> VehicleAggregator {
        VehicleAggregator::new(led_count, Arc::new(NoOpLogger))
    }

    #[test]
    fn two_lines_on_one_led_use_shared_color() {
        let mut agg = aggregator(20);
        agg.add_vehicle(10, Line::One, "a").unwrap();
        agg.add_vehicle(10, Line::Two, "b").unwrap();

        let ids: Vec<_> = agg.vehicles_at(10).iter().map(|o| o.vehicle_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(agg.slot_state(10), SlotState::Shared);

        let scheme = ColorScheme::default();
        let colors = agg.colors(&scheme);
        assert_eq!(colors[10], scheme.shared);
        assert_ne!(colors[10], scheme.line1);
        assert_ne!(colors[10], scheme.line2);
    }

    #[test]
    fn same_line_many_vehicles_keeps_line_color() {
        let mut agg = aggregator(5);
        agg.add_vehicle(2, Line::Two, "x").unwrap();
        agg.add_vehicle(2, Line::Two, "y").unwrap();
        agg.add_vehicle(2, Line::Two, "z").unwrap();
        assert_eq!(agg.slot_state(2), SlotState::Single(Line::Two));
        assert_eq!(agg.colors(&ColorScheme::default())[2], Rgb::new(0, 0, 32));
    }

    #[test]
    fn reset_clears_everything() {
        let mut agg = aggregator(8);
        agg.add_vehicle(0, Line::One, "a").unwrap();
        agg.add_vehicle(7, Line::Two, "b").unwrap();
        agg.reset();

        for index in 0..8 {
            assert!(agg.vehicles_at(index).is_empty());
            assert_eq!(agg.slot_state(index), SlotState::Off);
        }
        assert!(agg.colors(&ColorScheme::default()).iter().all(|c| c.is_off()));
        assert_eq!(agg.vehicle_count(), 0);
    }

    #[test]
    fn out_of_range_is_rejected_not_clamped() {
        let ring = Arc::new(RingBufferLogger::new());
        let mut agg = VehicleAggregator::new(4, ring.clone());
        let err = agg.add_vehicle(4, Line::One, "late").unwrap_err();
        assert_eq!(
            err,
            AggregateError::IndexOutOfRange {
                index: 4,
                led_count: 4
            }
        );
        assert!(agg.vehicles_at(0).is_empty());
        assert_eq!(agg.vehicle_count(), 0);
        assert_eq!(ring.len(), 1);
    }

    #[test]
    fn crowded_slot_keeps_every_vehicle() {
        let mut agg = aggregator(2);
        for i in 0..20 {
            agg.add_vehicle(0, Line::One, &format!("v{}", i)).unwrap();
        }
        agg.add_vehicle(0, Line::Two, "last").unwrap();

        assert_eq!(agg.vehicles_at(0).len(), 21);
        assert_eq!(agg.vehicles_at(0)[20].vehicle_id, "last");
        assert_eq!(agg.slot_state(0), SlotState::Shared);
        assert_eq!(agg.vehicle_count(), 21);
    }

    #[test]
    fn long_ids_are_kept_whole() {
        let mut agg = aggregator(1);
        let long = "40_trip_LLR_2025_03_15_weekday_block_4417_x";
        agg.add_vehicle(0, Line::One, long).unwrap();
        assert_eq!(agg.vehicles_at(0)[0].vehicle_id, long);
    }

    #[test]
    fn occupied_lists_ascending_indices() {
        let mut agg = aggregator(10);
        agg.add_vehicle(7, Line::One, "a").unwrap();
        agg.add_vehicle(2, Line::One, "b").unwrap();
        agg.add_vehicle(7, Line::Two, "c").unwrap();
        assert_eq!(agg.occupied().collect::<Vec<_>>(), vec![2, 7]);
        assert_eq!(agg.vehicle_count(), 3);
    }

    #[test]
    fn colors_cover_whole_strip() {
        let agg = aggregator(crate::topology::LED_COUNT);
        assert_eq!(agg.colors(&ColorScheme::default()).len(), crate::topology::LED_COUNT);
    }
}
