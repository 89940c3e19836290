//! API request and response types for the web API.

use serde::{Deserialize, Serialize};

use crate::config::{DisplayConfig, FeedConfig};
use crate::log::LogEntry;
use crate::snapshot::{Placement, Snapshot};
use crate::vehicle::Vehicle;
use crate::{log_debug, log_info};

use super::shared::{FetchStatus, SharedLinkState};

// ============================================================================
// Response Types
// ============================================================================

/// API response wrapper for consistent JSON structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// Whether the request was successful
    pub success: bool,
    /// Response data (present when success=true)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Error message (present when success=false)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    /// Create a successful response with data
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    /// Create an error response
    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Committed vehicles plus where the displayed ones landed
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainsResponse {
    /// Generation of the rendered snapshot
    pub generation: u64,
    /// Focus filter in effect
    #[serde(skip_serializing_if = "Option::is_none")]
    pub focused_vehicle: Option<String>,
    /// Every vehicle in the committed list
    pub vehicles: Vec<Vehicle>,
    /// Displayed vehicles and their LEDs
    pub placements: Vec<Placement>,
}

impl TrainsResponse {
    /// Build from a rendered snapshot
    pub fn from_snapshot(snapshot: &Snapshot) -> Self {
        Self {
            generation: snapshot.generation(),
            focused_vehicle: snapshot.focus.clone(),
            vehicles: snapshot.vehicles.vehicles.clone(),
            placements: snapshot.placements.clone(),
        }
    }
}

/// Settings visible to the web UI
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigResponse {
    /// Device hostname
    pub hostname: String,
    /// Whether a feed API key is configured
    pub api_key_set: bool,
    /// Seconds between fetch cycles
    pub update_interval: u32,
    /// Runtime display settings
    pub display: DisplayConfig,
}

impl ConfigResponse {
    /// Build from the shared state's current values
    pub fn from_state(state: &SharedLinkState) -> Self {
        let feed: &FeedConfig = state.feed_config();
        Self {
            hostname: state.device().hostname.as_str().to_owned(),
            api_key_set: !feed.uses_sample_data(),
            update_interval: feed.update_interval_secs,
            display: state.settings(),
        }
    }
}

/// Result of a settings update
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigUpdateResponse {
    /// Settings after the update
    pub config: ConfigResponse,
    /// Fields that were rejected and left unchanged
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ignored: Vec<String>,
}

/// Focus filter request: `{"vehicleId": "40_101"}`; empty or null clears
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FocusRequest {
    /// Vehicle to focus on
    #[serde(default)]
    pub vehicle_id: Option<String>,
}

/// Focus filter after a change
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FocusResponse {
    /// Vehicle now focused, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub focused_vehicle: Option<String>,
}

/// Query for the log endpoint
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LogsQuery {
    /// Newest entries to return (0 or absent = all)
    #[serde(default)]
    pub max: usize,
}

/// Device and pipeline status
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    /// Device hostname
    pub hostname: String,
    /// Milliseconds since start
    pub uptime_ms: u64,
    /// Generation of the committed list
    pub generation: u64,
    /// Vehicles in the committed list
    pub vehicle_count: usize,
    /// Vehicles shown in the latest snapshot
    pub displayed_count: usize,
    /// Whether sample data is being shown
    pub sample_data: bool,
    /// Recent fetch outcomes
    pub fetch: FetchStatus,
}

impl StatusResponse {
    /// Build from the shared state's current values
    pub fn from_state(state: &SharedLinkState) -> Self {
        let vehicles = state.current_vehicles();
        Self {
            hostname: state.device().hostname.as_str().to_owned(),
            uptime_ms: state.now_ms(),
            generation: vehicles.generation,
            vehicle_count: vehicles.len(),
            displayed_count: state.latest_snapshot().placements.len(),
            sample_data: state.feed_config().uses_sample_data(),
            fetch: state.fetch_status(),
        }
    }
}

// ============================================================================
// WebSocket Messages
// ============================================================================

/// Server-to-dashboard push messages besides the LED state
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PushMessage {
    /// Buffered log entries, oldest first
    Logs {
        /// Captured entries
        entries: Vec<LogEntry>,
    },
    /// Vehicles and placements of a rendered snapshot
    Trains(TrainsResponse),
}

/// Dashboard-to-server WebSocket messages
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientMessage {
    /// `{"type":"setFocus","vehicleId":"40_101"}`; empty or null clears
    #[serde(rename_all = "camelCase")]
    SetFocus {
        /// Vehicle to focus on
        #[serde(default)]
        vehicle_id: Option<String>,
    },
}

/// Messages sent when a dashboard client connects: logs, trains, LED state
pub fn connect_messages(
    state: &SharedLinkState,
    snapshot: &Snapshot,
) -> Result<Vec<String>, serde_json::Error> {
    let logs = PushMessage::Logs {
        entries: state.logs().entries(0),
    };
    let mut messages = vec![serde_json::to_string(&logs)?];
    messages.extend(render_messages(state, snapshot)?);
    Ok(messages)
}

/// Messages broadcast after each render: trains, LED state
pub fn render_messages(
    state: &SharedLinkState,
    snapshot: &Snapshot,
) -> Result<Vec<String>, serde_json::Error> {
    let trains = PushMessage::Trains(TrainsResponse::from_snapshot(snapshot));
    Ok(vec![
        serde_json::to_string(&trains)?,
        state.serializer().to_json(snapshot)?,
    ])
}

/// Apply one text message from a dashboard client
pub fn apply_client_message(
    state: &SharedLinkState,
    text: &str,
) -> Result<ClientMessage, serde_json::Error> {
    let message: ClientMessage = serde_json::from_str(text)?;
    log_debug!(state.logger(), "WebSocket message: {}", text);

    match &message {
        ClientMessage::SetFocus { vehicle_id } => {
            match state.set_focus(vehicle_id.as_deref()).focus() {
                Some(id) => log_info!(state.logger(), "Focus set to vehicle {}", id),
                None => log_info!(state.logger(), "Focus cleared"),
            }
        }
    }
    Ok(message)
}
