//! Feed document parsing.
//!
//! Each line is fetched as one "trips-for-route" document:
//!
//! ```json
//! { "code": 200,
//!   "data": {
//!     "list": [ { "tripId": "40_t1",
//!                 "status": { "closestStop": "40_990005", "closestStopTimeOffset": -12,
//!                             "nextStop": "40_990006", "nextStopTimeOffset": 75,
//!                             "vehicleId": "40_101", "scheduledDistanceAlongTrip": 1520.4 } } ],
//!     "references": {
//!       "trips": [ { "id": "40_t1", "directionId": "1", "routeId": "40_100479",
//!                    "tripHeadsign": "Lynnwood City Center" } ],
//!       "stops": [ { "id": "40_990005", "name": "Westlake" } ] } } }
//! ```
//!
//! A broken document fails with [`FeedError`]. A broken record is skipped
//! with a warning and the rest of the document is kept.

use std::collections::HashMap;
use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::classify::classify;
use crate::log::Logger;
use crate::vehicle::{Direction, Line, StopRef, Vehicle};
use crate::{log_debug, log_info, log_warn};

/// Below this `scheduledDistanceAlongTrip` a trip has not started yet.
pub const MIN_SCHEDULED_DISTANCE: f64 = 0.001;

/// Whole-document parse failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeedError {
    /// Body is not JSON.
    #[error("invalid JSON: {0}")]
    InvalidJson(String),
    /// No `data` object.
    #[error("response missing 'data' object")]
    MissingData,
    /// No `data.list` array.
    #[error("response missing 'data.list' array")]
    MissingList,
    /// Top-level `code` other than 200.
    #[error("feed returned code {code}: {text}")]
    ApiCode {
        /// Reported code.
        code: i64,
        /// Reported text, possibly empty.
        text: String,
    },
}

/// Reasons a fetch cycle produced no list.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The request did not complete in time.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    /// Non-success HTTP status.
    #[error("HTTP status {0}")]
    Status(u16),
    /// Connection or protocol failure.
    #[error("transport error: {0}")]
    Transport(String),
    /// Local read failure (sample data).
    #[error("I/O error: {0}")]
    Io(String),
    /// The body arrived but could not be parsed.
    #[error(transparent)]
    Parse(#[from] FeedError),
}

// ============================================================================
// Wire schema
// ============================================================================

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    code: Option<i64>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    data: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
struct References {
    #[serde(default)]
    trips: Vec<Value>,
    #[serde(default)]
    stops: Vec<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TripReference {
    id: String,
    #[serde(default)]
    direction_id: Value,
    #[serde(default)]
    trip_headsign: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StopReference {
    id: String,
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TripItem {
    #[serde(default)]
    trip_id: String,
    #[serde(default)]
    status: Option<TripStatus>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TripStatus {
    closest_stop: Option<String>,
    closest_stop_time_offset: Option<i64>,
    next_stop: Option<String>,
    next_stop_time_offset: Option<i64>,
    #[serde(default)]
    vehicle_id: Option<String>,
    #[serde(default)]
    scheduled_distance_along_trip: Option<f64>,
}

struct TripInfo {
    direction: Option<Direction>,
    headsign: String,
}

// ============================================================================
// Parser
// ============================================================================

/// Parse one trips-for-route document into vehicles of `line`.
///
/// Vehicles are classified with `threshold_secs`.
pub fn parse_trips_for_route(
    body: &[u8],
    line: Line,
    threshold_secs: u32,
    logger: &dyn Logger,
) -> Result<Vec<Vehicle>, FeedError> {
    let envelope: Envelope =
        serde_json::from_slice(body).map_err(|e| FeedError::InvalidJson(e.to_string()))?;

    if let Some(code) = envelope.code.filter(|&c| c != 200) {
        return Err(FeedError::ApiCode {
            code,
            text: envelope.text.unwrap_or_default(),
        });
    }

    let mut data = match envelope.data {
        Some(Value::Object(map)) => map,
        _ => return Err(FeedError::MissingData),
    };
    let list = match data.remove("list") {
        Some(Value::Array(list)) => list,
        _ => return Err(FeedError::MissingList),
    };
    let references: References = data
        .remove("references")
        .and_then(|r| serde_json::from_value(r).ok())
        .unwrap_or_default();

    let trips = trip_map(references.trips);
    let stops = stop_map(references.stops);
    log_debug!(
        logger,
        "{}: {} trip references, {} stop references",
        line.name(),
        trips.len(),
        stops.len()
    );

    let mut vehicles = Vec::with_capacity(list.len());
    for item in list {
        let item: TripItem = match serde_json::from_value(item) {
            Ok(item) => item,
            Err(e) => {
                log_warn!(logger, "{}: skipping malformed trip record: {}", line.name(), e);
                continue;
            }
        };
        if let Some(vehicle) = vehicle_from(item, line, threshold_secs, &trips, &stops, logger) {
            vehicles.push(vehicle);
        }
    }

    log_info!(logger, "{}: processed {} vehicle positions", line.name(), vehicles.len());
    Ok(vehicles)
}

fn trip_map(trips: Vec<Value>) -> HashMap<String, TripInfo> {
    trips
        .into_iter()
        .filter_map(|t| serde_json::from_value::<TripReference>(t).ok())
        .map(|t| {
            let direction = match &t.direction_id {
                Value::String(s) => Direction::from_direction_id(s),
                Value::Number(n) => Direction::from_direction_id(&n.to_string()),
                _ => None,
            };
            let info = TripInfo {
                direction,
                headsign: t.trip_headsign.unwrap_or_default(),
            };
            (t.id, info)
        })
        .collect()
}

fn stop_map(stops: Vec<Value>) -> HashMap<String, String> {
    stops
        .into_iter()
        .filter_map(|s| serde_json::from_value::<StopReference>(s).ok())
        .filter_map(|s| s.name.map(|name| (s.id, name)))
        .collect()
}

fn vehicle_from(
    item: TripItem,
    line: Line,
    threshold_secs: u32,
    trips: &HashMap<String, TripInfo>,
    stops: &HashMap<String, String>,
    logger: &dyn Logger,
) -> Option<Vehicle> {
    let trip_id = item.trip_id;
    let Some(status) = item.status else {
        log_warn!(logger, "Status missing for trip {}", trip_id);
        return None;
    };

    let (Some(closest), Some(closest_offset), Some(next), Some(next_offset)) = (
        status.closest_stop,
        status.closest_stop_time_offset,
        status.next_stop,
        status.next_stop_time_offset,
    ) else {
        log_warn!(logger, "Incomplete status for trip {}, skipping", trip_id);
        return None;
    };

    let Some(trip) = trips.get(&trip_id) else {
        log_warn!(logger, "No trip reference for trip {}, skipping", trip_id);
        return None;
    };
    let Some(direction) = trip.direction else {
        log_warn!(logger, "No usable direction for trip {}, skipping", trip_id);
        return None;
    };

    let id = match status.vehicle_id {
        Some(v) if !v.trim().is_empty() => v,
        _ => trip_id.clone(),
    };
    if id.is_empty() {
        log_warn!(logger, "Trip record without vehicle or trip id, skipping");
        return None;
    }

    match status.scheduled_distance_along_trip {
        Some(d) if d >= MIN_SCHEDULED_DISTANCE => {}
        Some(d) => log_warn!(
            logger,
            "Trip {} not in progress yet, scheduledDistanceAlongTrip: {:.2}",
            trip_id,
            d
        ),
        None => log_warn!(
            logger,
            "Trip {} not in progress yet, no scheduledDistanceAlongTrip",
            trip_id
        ),
    }

    let closest_stop = stop_ref(closest, stops, logger);
    let next_stop = stop_ref(next, stops, logger);
    let state = classify(next_offset, threshold_secs);

    Some(Vehicle {
        id,
        trip_id,
        line,
        direction,
        state,
        closest_stop,
        closest_stop_offset_secs: saturate(closest_offset),
        next_stop,
        next_stop_offset_secs: saturate(next_offset),
        headsign: trip.headsign.clone(),
    })
}

fn stop_ref(id: String, stops: &HashMap<String, String>, logger: &dyn Logger) -> StopRef {
    match stops.get(&id) {
        Some(name) => StopRef::new(id.clone(), name.clone()),
        None => {
            log_warn!(logger, "Stop name not found for stop ID: {}", id);
            StopRef::named(id)
        }
    }
}

fn saturate(value: i64) -> i32 {
    value.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::{NoOpLogger, RingBufferLogger};
    use crate::vehicle::VehicleState;
    use serde_json::json;

    fn document(list: Value) -> Vec<u8> {
        json!({
            "code": 200,
            "data": {
                "list": list,
                "references": {
                    "trips": [
                        { "id": "t1", "directionId": "1", "routeId": "40_100479", "tripHeadsign": "Lynnwood City Center" },
                        { "id": "t2", "directionId": "0", "routeId": "40_100479", "tripHeadsign": "Angle Lake" },
                        { "id": "t3", "directionId": "", "routeId": "40_100479" }
                    ],
                    "stops": [
                        { "id": "s1", "name": "Westlake" },
                        { "id": "s2", "name": "Capitol Hill" }
                    ]
                }
            }
        })
        .to_string()
        .into_bytes()
    }

    fn item(trip: &str, vehicle: Option<&str>, next_offset: i64) -> Value {
        json!({
            "tripId": trip,
            "status": {
                "closestStop": "s1",
                "closestStopTimeOffset": -5,
                "nextStop": "s2",
                "nextStopTimeOffset": next_offset,
                "vehicleId": vehicle,
                "scheduledDistanceAlongTrip": 100.0
            }
        })
    }

    fn parse(body: &[u8]) -> Result<Vec<Vehicle>, FeedError> {
        parse_trips_for_route(body, Line::One, 30, &NoOpLogger)
    }

    #[test]
    fn parses_complete_record() {
        let vehicles = parse(&document(json!([item("t1", Some("v1"), 90)]))).unwrap();
        assert_eq!(vehicles.len(), 1);
        let v = &vehicles[0];
        assert_eq!(v.id, "v1");
        assert_eq!(v.trip_id, "t1");
        assert_eq!(v.line, Line::One);
        assert_eq!(v.direction, Direction::Northbound);
        assert_eq!(v.state, VehicleState::Moving);
        assert_eq!(v.closest_stop, StopRef::new("s1", "Westlake"));
        assert_eq!(v.next_stop, StopRef::new("s2", "Capitol Hill"));
        assert_eq!(v.closest_stop_offset_secs, -5);
        assert_eq!(v.next_stop_offset_secs, 90);
        assert_eq!(v.headsign, "Lynnwood City Center");
    }

    #[test]
    fn classifies_with_threshold() {
        let body = document(json!([item("t2", Some("v2"), 12)]));
        let vehicles = parse(&body).unwrap();
        assert_eq!(vehicles[0].state, VehicleState::AtStation);
        assert_eq!(vehicles[0].direction, Direction::Southbound);

        let strict = parse_trips_for_route(&body, Line::One, 10, &NoOpLogger).unwrap();
        assert_eq!(strict[0].state, VehicleState::Moving);
    }

    #[test]
    fn vehicle_id_falls_back_to_trip_id() {
        let vehicles = parse(&document(json!([item("t1", None, 90), item("t2", Some(""), 90)]))).unwrap();
        assert_eq!(vehicles[0].id, "t1");
        assert_eq!(vehicles[1].id, "t2");
    }

    #[test]
    fn malformed_records_are_skipped() {
        let ring = RingBufferLogger::new();
        let list = json!([
            { "tripId": "t1" },
            { "tripId": "t1", "status": { "closestStop": "s1", "closestStopTimeOffset": 0, "nextStop": "s2" } },
            item("unknown-trip", Some("vx"), 90),
            item("t3", Some("v3"), 90),
            "not an object",
            item("t2", Some("ok"), 90)
        ]);
        let vehicles = parse_trips_for_route(&document(list), Line::One, 30, &ring).unwrap();
        assert_eq!(vehicles.len(), 1);
        assert_eq!(vehicles[0].id, "ok");
        assert!(ring.len() >= 5);
    }

    #[test]
    fn unknown_stop_keeps_id_as_name() {
        let list = json!([{
            "tripId": "t1",
            "status": {
                "closestStop": "s9", "closestStopTimeOffset": 0,
                "nextStop": "s2", "nextStopTimeOffset": 60,
                "scheduledDistanceAlongTrip": 5.0
            }
        }]);
        let vehicles = parse(&document(list)).unwrap();
        assert_eq!(vehicles[0].closest_stop, StopRef::named("s9"));
    }

    #[test]
    fn not_started_trip_is_kept_with_warning() {
        let ring = RingBufferLogger::new();
        let list = json!([{
            "tripId": "t1",
            "status": {
                "closestStop": "s1", "closestStopTimeOffset": 0,
                "nextStop": "s2", "nextStopTimeOffset": 60,
                "vehicleId": "v1", "scheduledDistanceAlongTrip": 0.0
            }
        }]);
        let vehicles = parse_trips_for_route(&document(list), Line::One, 30, &ring).unwrap();
        assert_eq!(vehicles.len(), 1);
        assert!(ring.entries(0).iter().any(|e| e.message.contains("not in progress")));
    }

    #[test]
    fn numeric_direction_id_accepted() {
        let body = json!({
            "data": {
                "list": [item("t1", Some("v1"), 90)],
                "references": { "trips": [ { "id": "t1", "directionId": 0 } ], "stops": [] }
            }
        })
        .to_string();
        let vehicles = parse(body.as_bytes()).unwrap();
        assert_eq!(vehicles[0].direction, Direction::Southbound);
    }

    #[test]
    fn document_errors() {
        assert!(matches!(parse(b"<html>"), Err(FeedError::InvalidJson(_))));
        assert_eq!(parse(br#"{"code":200}"#), Err(FeedError::MissingData));
        assert_eq!(parse(br#"{"data":{}}"#), Err(FeedError::MissingList));
        assert_eq!(
            parse(br#"{"code":401,"text":"permission denied","data":{"list":[]}}"#),
            Err(FeedError::ApiCode {
                code: 401,
                text: "permission denied".into()
            })
        );
    }

    #[test]
    fn empty_list_is_success() {
        assert_eq!(parse(&document(json!([]))).unwrap(), vec![]);
    }

    #[test]
    fn offsets_saturate() {
        assert_eq!(saturate(i64::MAX), i32::MAX);
        assert_eq!(saturate(-3), -3);
    }

    #[test]
    fn fetch_error_wraps_feed_error() {
        let err: FetchError = FeedError::MissingData.into();
        assert_eq!(err.to_string(), "response missing 'data' object");
    }
}
