//! Axum-based HTTP server for the dashboard API.
//!
//! Provides REST endpoints for:
//! - GET `/api/leds` - Dashboard LED message (rows of occupied LEDs)
//! - GET `/api/trains` - Committed vehicles and their placements
//! - GET `/api/stations` - Station table
//! - GET `/api/config` - Current settings
//! - POST `/api/config` - Update display settings
//! - POST `/api/focus` - Set or clear the focused vehicle
//! - GET `/api/logs` - Recent log entries
//! - GET `/api/status` - Device and fetch status
//!
//! and a WebSocket at `/ws` that pushes logs, trains and LED state on
//! connect, then trains and LED state after every render. Clients may send
//! `{"type":"setFocus","vehicleId":...}`.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use tower_http::cors::{Any, CorsLayer};

use crate::config::{DisplayUpdate, WebConfig};
use crate::log::LogEntry;
use crate::serializer::LedStateMessage;
use crate::topology::Station;
use crate::{log_debug, log_info, log_warn};

use super::api::{
    apply_client_message, connect_messages, render_messages, ApiResponse, ConfigResponse,
    ConfigUpdateResponse, FocusRequest, FocusResponse, LogsQuery, StatusResponse, TrainsResponse,
};
use super::shared::SharedLinkState;

// ============================================================================
// Route Handlers
// ============================================================================

/// GET /api/leds - Dashboard message for the latest snapshot
async fn get_leds(State(state): State<Arc<SharedLinkState>>) -> Json<LedStateMessage> {
    let snapshot = state.latest_snapshot();
    Json(state.serializer().message(&snapshot))
}

/// GET /api/trains - Committed vehicles plus placements
async fn get_trains(
    State(state): State<Arc<SharedLinkState>>,
) -> Json<ApiResponse<TrainsResponse>> {
    let snapshot = state.latest_snapshot();
    Json(ApiResponse::ok(TrainsResponse::from_snapshot(&snapshot)))
}

/// GET /api/stations - Station table with LED indices
async fn get_stations(
    State(state): State<Arc<SharedLinkState>>,
) -> Json<ApiResponse<Vec<Station>>> {
    Json(ApiResponse::ok(state.topology().stations().to_vec()))
}

/// GET /api/config - Current settings
async fn get_config(State(state): State<Arc<SharedLinkState>>) -> Json<ApiResponse<ConfigResponse>> {
    Json(ApiResponse::ok(ConfigResponse::from_state(&state)))
}

/// POST /api/config - Update display settings
///
/// Accepts JSON: `{"line1Color": "#00ff00", "atStationThreshold": 20}`.
/// Every field is optional; malformed colors are reported in `ignored`.
async fn update_config(
    State(state): State<Arc<SharedLinkState>>,
    body: Bytes,
) -> Json<ApiResponse<ConfigUpdateResponse>> {
    let update: DisplayUpdate = match serde_json::from_slice(&body) {
        Ok(update) => update,
        Err(e) => return Json(ApiResponse::err(format!("Invalid config request: {}", e))),
    };

    let mut ignored = Vec::new();
    state.update_settings(|settings| ignored = update.apply_to(settings));
    if !ignored.is_empty() {
        log_warn!(state.logger(), "Ignored invalid settings: {}", ignored.join(", "));
    }
    log_info!(state.logger(), "Display settings updated");

    Json(ApiResponse::ok(ConfigUpdateResponse {
        config: ConfigResponse::from_state(&state),
        ignored: ignored.into_iter().map(str::to_owned).collect(),
    }))
}

/// POST /api/focus - Set or clear the focus filter
///
/// Accepts JSON: `{"vehicleId": "40_101"}`; empty or null clears.
async fn set_focus(
    State(state): State<Arc<SharedLinkState>>,
    body: Bytes,
) -> Json<ApiResponse<FocusResponse>> {
    let request: FocusRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => return Json(ApiResponse::err(format!("Invalid focus request: {}", e))),
    };

    let settings = state.set_focus(request.vehicle_id.as_deref());
    match settings.focus() {
        Some(id) => log_info!(state.logger(), "Focus set to vehicle {}", id),
        None => log_info!(state.logger(), "Focus cleared"),
    }
    Json(ApiResponse::ok(FocusResponse {
        focused_vehicle: settings.focus().map(str::to_owned),
    }))
}

/// GET /api/logs?max=N - Recent log entries, oldest first
async fn get_logs(
    State(state): State<Arc<SharedLinkState>>,
    Query(query): Query<LogsQuery>,
) -> Json<ApiResponse<Vec<LogEntry>>> {
    Json(ApiResponse::ok(state.logs().entries(query.max)))
}

/// GET /api/status - Device and fetch status
async fn get_status(State(state): State<Arc<SharedLinkState>>) -> Json<ApiResponse<StatusResponse>> {
    Json(ApiResponse::ok(StatusResponse::from_state(&state)))
}

/// GET /ws - Dashboard push channel
async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<SharedLinkState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| dashboard_socket(socket, state))
}

async fn send_all(socket: &mut WebSocket, messages: Vec<String>) -> Result<(), axum::Error> {
    for message in messages {
        socket.send(Message::Text(message)).await?;
    }
    Ok(())
}

async fn dashboard_socket(mut socket: WebSocket, state: Arc<SharedLinkState>) {
    log_info!(state.logger(), "Dashboard client connected");

    // Subscribe before reading so a render between the two is not missed
    let mut snapshots = state.subscribe_snapshots();
    let snapshot = snapshots.borrow_and_update().clone();
    let initial = match connect_messages(&state, &snapshot) {
        Ok(messages) => messages,
        Err(e) => {
            log_warn!(state.logger(), "Could not serialize dashboard state: {}", e);
            return;
        }
    };
    if send_all(&mut socket, initial).await.is_err() {
        return;
    }

    loop {
        tokio::select! {
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = snapshots.borrow_and_update().clone();
                match render_messages(&state, &snapshot) {
                    Ok(messages) => {
                        if send_all(&mut socket, messages).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => log_warn!(state.logger(), "Could not serialize dashboard state: {}", e),
                }
            }
            incoming = socket.recv() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    if let Err(e) = apply_client_message(&state, &text) {
                        log_warn!(state.logger(), "Ignored WebSocket message: {}", e);
                    }
                }
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
        }
    }

    log_debug!(state.logger(), "Dashboard client disconnected");
}

/// Fallback handler for 404
async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(ApiResponse::<()>::err("Not found")),
    )
}

// ============================================================================
// Server Builder
// ============================================================================

/// Configuration for the web server
#[derive(Debug, Clone)]
pub struct WebServerConfig {
    /// Address to bind to
    pub addr: SocketAddr,
    /// Whether to enable CORS for all origins
    pub cors_permissive: bool,
}

impl Default for WebServerConfig {
    fn default() -> Self {
        Self::from_config(&WebConfig::default())
    }
}

impl WebServerConfig {
    /// Create a new config with the given address
    pub fn new(addr: impl Into<SocketAddr>) -> Self {
        Self {
            addr: addr.into(),
            ..Default::default()
        }
    }

    /// Set whether CORS should be permissive
    pub fn cors(mut self, permissive: bool) -> Self {
        self.cors_permissive = permissive;
        self
    }

    /// Create from shared WebConfig
    pub fn from_config(config: &WebConfig) -> Self {
        Self {
            addr: ([0, 0, 0, 0], config.port).into(),
            cors_permissive: config.cors_permissive,
        }
    }
}

/// Build the Axum router with all routes
pub fn build_router(state: Arc<SharedLinkState>, config: &WebServerConfig) -> Router {
    let mut router = Router::new()
        .route("/api/leds", get(get_leds))
        .route("/api/trains", get(get_trains))
        .route("/api/stations", get(get_stations))
        .route("/api/config", get(get_config).post(update_config))
        .route("/api/focus", post(set_focus))
        .route("/api/logs", get(get_logs))
        .route("/api/status", get(get_status))
        .route("/ws", get(ws_handler))
        .fallback(not_found)
        .with_state(state);

    if config.cors_permissive {
        router = router.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );
    }

    router
}

/// Start the web server with shared state
///
/// This function runs until the server is shut down.
pub async fn run_server_with_state(
    state: Arc<SharedLinkState>,
    config: WebServerConfig,
) -> Result<(), std::io::Error> {
    let logger = state.logger().clone();
    let router = build_router(state, &config);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    log_info!(logger, "Web server listening on http://{}", config.addr);

    axum::serve(listener, router).await
}
