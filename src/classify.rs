//! At-station vs. moving classification.
//!
//! The offset to the next stop is the only feed field that behaves
//! monotonically from approach to departure, so it alone decides the state:
//! a vehicle due at its next stop in fewer than `threshold` seconds is shown
//! at that platform, otherwise it is shown on the enroute LED.

use crate::vehicle::VehicleState;

/// Default at-station threshold in seconds.
pub const DEFAULT_AT_STATION_THRESHOLD_SECS: u32 = 30;

/// Largest accepted at-station threshold in seconds.
pub const MAX_AT_STATION_THRESHOLD_SECS: u32 = 60;

/// Classify a vehicle from its next-stop time offset.
///
/// ```
/// use linklight::{classify, VehicleState};
///
/// assert_eq!(classify(10, 30), VehicleState::AtStation);
/// assert_eq!(classify(30, 30), VehicleState::Moving);
/// assert_eq!(classify(-5, 0), VehicleState::AtStation);
/// ```
#[inline]
pub fn classify(next_stop_offset_secs: i64, threshold_secs: u32) -> VehicleState {
    if next_stop_offset_secs < i64::from(threshold_secs) {
        VehicleState::AtStation
    } else {
        VehicleState::Moving
    }
}
