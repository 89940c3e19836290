//! Configuration for the feed client, display engine, web API and device.
//!
//! Strings use `heapless::String` so every setting has a fixed upper size,
//! matching the preference store on the device.
//!
//! # Example
//!
//! ```rust
//! use linklight::config::{Config, DisplayConfig, FeedConfig, WebConfig};
//!
//! // Use defaults
//! let config = Config::default();
//! assert!(config.feed.uses_sample_data());
//!
//! // Or customize
//! let config = Config::default()
//!     .with_feed(FeedConfig::default().with_api_key("secret"))
//!     .with_display(DisplayConfig::default().with_at_station_threshold_secs(20))
//!     .with_web(WebConfig::default().with_port(3000));
//! assert_eq!(config.display.at_station_threshold_secs, 20);
//! ```

use heapless::String as HString;
use serde::{Deserialize, Serialize};

use crate::aggregator::ColorScheme;
use crate::classify::{DEFAULT_AT_STATION_THRESHOLD_SECS, MAX_AT_STATION_THRESHOLD_SECS};
use crate::color::Rgb;

/// Maximum length for short config strings (hostnames, keys, vehicle ids)
pub const MAX_SHORT_STRING: usize = 64;

/// Maximum length for longer config strings (URLs, paths)
pub const MAX_LONG_STRING: usize = 128;

/// Type alias for short config strings
pub type ShortString = HString<MAX_SHORT_STRING>;

/// Type alias for longer config strings
pub type LongString = HString<MAX_LONG_STRING>;

/// Default feed API base URL.
pub const DEFAULT_API_BASE_URL: &str = "https://api.pugetsound.onebusaway.org/api/where";

/// Default update interval in seconds.
pub const DEFAULT_UPDATE_INTERVAL_SECS: u32 = 30;

/// Accepted update interval range in seconds.
pub const UPDATE_INTERVAL_RANGE_SECS: core::ops::RangeInclusive<u32> = 15..=60;

/// Default device hostname.
pub const DEFAULT_HOSTNAME: &str = "LinkLight";

// ============================================================================
// Helpers for creating heapless strings
// ============================================================================

fn truncated<const N: usize>(s: &str) -> HString<N> {
    let mut hs = HString::new();
    for c in s.chars() {
        // Stop at the first char that does not fit; never split one
        if hs.push(c).is_err() {
            break;
        }
    }
    hs
}

/// Create a ShortString from a &str, truncating if too long
pub fn short_string(s: &str) -> ShortString {
    truncated(s)
}

/// Create a LongString from a &str, truncating if too long
pub fn long_string(s: &str) -> LongString {
    truncated(s)
}

/// Reduce a requested hostname to RFC 1123 characters.
///
/// Keeps ASCII letters and digits plus hyphens that are neither first nor
/// last in the input. Falls back to [`DEFAULT_HOSTNAME`] when nothing valid
/// remains.
///
/// ```
/// use linklight::config::sanitize_hostname;
///
/// assert_eq!(sanitize_hostname("link-light"), "link-light");
/// assert_eq!(sanitize_hostname("-my host!-"), "myhost");
/// assert_eq!(sanitize_hostname("***"), "LinkLight");
/// ```
pub fn sanitize_hostname(requested: &str) -> ShortString {
    let requested = short_string(requested);
    let last = requested.chars().count().saturating_sub(1);
    let mut out = ShortString::new();
    for (i, c) in requested.chars().enumerate() {
        let keep = c.is_ascii_alphanumeric() || (c == '-' && i > 0 && i < last);
        if keep {
            let _ = out.push(c);
        }
    }
    if out.is_empty() {
        short_string(DEFAULT_HOSTNAME)
    } else {
        out
    }
}

// ============================================================================
// Main Config
// ============================================================================

/// Complete application configuration
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Feed client configuration
    pub feed: FeedConfig,
    /// Display engine settings (runtime-mutable)
    pub display: DisplayConfig,
    /// Web server configuration
    pub web: WebConfig,
    /// Device identification
    pub device: DeviceConfig,
}

impl Config {
    /// Set feed configuration
    pub fn with_feed(mut self, feed: FeedConfig) -> Self {
        self.feed = feed;
        self
    }

    /// Set display configuration
    pub fn with_display(mut self, display: DisplayConfig) -> Self {
        self.display = display;
        self
    }

    /// Set web configuration
    pub fn with_web(mut self, web: WebConfig) -> Self {
        self.web = web;
        self
    }

    /// Set device configuration
    pub fn with_device(mut self, device: DeviceConfig) -> Self {
        self.device = device;
        self
    }
}

// ============================================================================
// Feed Config
// ============================================================================

/// Transit feed client configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedConfig {
    /// Base URL of the feed API (without trailing slash)
    pub api_base_url: LongString,
    /// API key (empty = sample-data mode)
    #[serde(skip_serializing)]
    pub api_key: ShortString,
    /// Seconds between fetch cycles
    pub update_interval_secs: u32,
    /// Per-request timeout in milliseconds
    pub request_timeout_ms: u32,
    /// Sample document used when no API key is set
    pub sample_data_path: LongString,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            api_base_url: long_string(DEFAULT_API_BASE_URL),
            api_key: ShortString::new(),
            update_interval_secs: DEFAULT_UPDATE_INTERVAL_SECS,
            request_timeout_ms: 10_000,
            sample_data_path: long_string("data/sample_trips.json"),
        }
    }
}

impl FeedConfig {
    /// Set the API base URL; a trailing slash is dropped
    pub fn with_api_base_url(mut self, url: &str) -> Self {
        self.api_base_url = long_string(url.trim_end_matches('/'));
        self
    }

    /// Set the API key
    pub fn with_api_key(mut self, key: &str) -> Self {
        self.api_key = short_string(key.trim());
        self
    }

    /// Set the update interval; values outside 15..=60 use the default
    pub fn with_update_interval_secs(mut self, secs: u32) -> Self {
        self.update_interval_secs = if UPDATE_INTERVAL_RANGE_SECS.contains(&secs) {
            secs
        } else {
            DEFAULT_UPDATE_INTERVAL_SECS
        };
        self
    }

    /// Set the request timeout
    pub fn with_request_timeout_ms(mut self, ms: u32) -> Self {
        self.request_timeout_ms = ms;
        self
    }

    /// Set the sample document path
    pub fn with_sample_data_path(mut self, path: &str) -> Self {
        self.sample_data_path = long_string(path);
        self
    }

    /// Check if the live feed should be skipped in favour of sample data
    pub fn uses_sample_data(&self) -> bool {
        self.api_key.is_empty()
    }

    /// Update interval as a `Duration`
    pub fn update_interval(&self) -> core::time::Duration {
        core::time::Duration::from_secs(u64::from(self.update_interval_secs))
    }

    /// Request timeout as a `Duration`
    pub fn request_timeout(&self) -> core::time::Duration {
        core::time::Duration::from_millis(u64::from(self.request_timeout_ms))
    }
}

// ============================================================================
// Display Config
// ============================================================================

/// Runtime display settings read by the render path.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayConfig {
    /// Color for LEDs holding only 1 Line vehicles
    pub line1_color: Rgb,
    /// Color for LEDs holding only 2 Line vehicles
    pub line2_color: Rgb,
    /// Color for LEDs holding vehicles from both lines
    pub shared_color: Rgb,
    /// At-station threshold in seconds (0..=60)
    pub at_station_threshold_secs: u32,
    /// Only this vehicle is displayed when non-empty. Kept whole, since a
    /// shortened id would never match.
    pub focused_vehicle: String,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        let scheme = ColorScheme::default();
        Self {
            line1_color: scheme.line1,
            line2_color: scheme.line2,
            shared_color: scheme.shared,
            at_station_threshold_secs: DEFAULT_AT_STATION_THRESHOLD_SECS,
            focused_vehicle: String::new(),
        }
    }
}

impl DisplayConfig {
    /// Set the 1 Line color
    pub fn with_line1_color(mut self, color: Rgb) -> Self {
        self.line1_color = color;
        self
    }

    /// Set the 2 Line color
    pub fn with_line2_color(mut self, color: Rgb) -> Self {
        self.line2_color = color;
        self
    }

    /// Set the shared color
    pub fn with_shared_color(mut self, color: Rgb) -> Self {
        self.shared_color = color;
        self
    }

    /// Set the at-station threshold; values above 60 use the default
    pub fn with_at_station_threshold_secs(mut self, secs: u32) -> Self {
        self.at_station_threshold_secs = if secs <= MAX_AT_STATION_THRESHOLD_SECS {
            secs
        } else {
            DEFAULT_AT_STATION_THRESHOLD_SECS
        };
        self
    }

    /// Set the focused vehicle (empty clears the filter)
    pub fn with_focused_vehicle(mut self, vehicle_id: &str) -> Self {
        self.focused_vehicle = vehicle_id.trim().to_owned();
        self
    }

    /// Colors as a reduction scheme
    pub fn color_scheme(&self) -> ColorScheme {
        ColorScheme {
            line1: self.line1_color,
            line2: self.line2_color,
            shared: self.shared_color,
        }
    }

    /// Focused vehicle id, if the filter is active
    pub fn focus(&self) -> Option<&str> {
        if self.focused_vehicle.is_empty() {
            None
        } else {
            Some(self.focused_vehicle.as_str())
        }
    }
}

/// Partial display update, as submitted by the web UI.
///
/// Colors must be `#RRGGBB`; malformed colors are ignored and reported back.
/// An out-of-range threshold falls back to the default.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayUpdate {
    /// New 1 Line color
    pub line1_color: Option<String>,
    /// New 2 Line color
    pub line2_color: Option<String>,
    /// New shared color
    pub shared_color: Option<String>,
    /// New at-station threshold
    pub at_station_threshold: Option<u32>,
}

impl DisplayUpdate {
    /// Apply to `config`, returning the names of ignored fields.
    pub fn apply_to(&self, config: &mut DisplayConfig) -> Vec<&'static str> {
        let mut ignored = Vec::new();
        let colors = [
            ("line1Color", &self.line1_color, &mut config.line1_color),
            ("line2Color", &self.line2_color, &mut config.line2_color),
            ("sharedColor", &self.shared_color, &mut config.shared_color),
        ];
        for (name, requested, target) in colors {
            let Some(requested) = requested else { continue };
            match Rgb::from_hex(requested) {
                Some(color) => *target = color,
                None => ignored.push(name),
            }
        }
        if let Some(secs) = self.at_station_threshold {
            *config = config.clone().with_at_station_threshold_secs(secs);
        }
        ignored
    }
}

// ============================================================================
// Web Config
// ============================================================================

/// Web server configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebConfig {
    /// Port to listen on
    pub port: u16,
    /// Whether to enable CORS for all origins
    pub cors_permissive: bool,
    /// Whether web server is enabled
    pub enabled: bool,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            cors_permissive: true,
            enabled: true,
        }
    }
}

impl WebConfig {
    /// Set the port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set CORS mode
    pub fn with_cors(mut self, permissive: bool) -> Self {
        self.cors_permissive = permissive;
        self
    }

    /// Enable or disable web server
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

// ============================================================================
// Device Config
// ============================================================================

/// Device identification configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Network hostname (RFC 1123 characters only)
    pub hostname: ShortString,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            hostname: short_string(DEFAULT_HOSTNAME),
        }
    }
}

impl DeviceConfig {
    /// Set the hostname, sanitised with [`sanitize_hostname`]
    pub fn with_hostname(mut self, hostname: &str) -> Self {
        self.hostname = sanitize_hostname(hostname);
        self
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert_eq!(config.feed.update_interval_secs, 30);
        assert_eq!(config.feed.request_timeout_ms, 10_000);
        assert_eq!(config.display.at_station_threshold_secs, 30);
        assert_eq!(config.web.port, 8080);
        assert_eq!(config.device.hostname.as_str(), "LinkLight");
    }

    #[test]
    fn builder_pattern() {
        let config = Config::default()
            .with_feed(
                FeedConfig::default()
                    .with_api_base_url("http://localhost:9000/api/where/")
                    .with_api_key(" abc "),
            )
            .with_web(WebConfig::default().with_port(3000))
            .with_device(DeviceConfig::default().with_hostname("tracks"));

        assert_eq!(config.feed.api_base_url.as_str(), "http://localhost:9000/api/where");
        assert_eq!(config.feed.api_key.as_str(), "abc");
        assert!(!config.feed.uses_sample_data());
        assert_eq!(config.web.port, 3000);
        assert_eq!(config.device.hostname.as_str(), "tracks");
    }

    // =========================================================================
    // FeedConfig Tests
    // =========================================================================

    #[test]
    fn update_interval_out_of_range_uses_default() {
        assert_eq!(FeedConfig::default().with_update_interval_secs(15).update_interval_secs, 15);
        assert_eq!(FeedConfig::default().with_update_interval_secs(60).update_interval_secs, 60);
        assert_eq!(FeedConfig::default().with_update_interval_secs(14).update_interval_secs, 30);
        assert_eq!(FeedConfig::default().with_update_interval_secs(61).update_interval_secs, 30);
    }

    #[test]
    fn feed_durations() {
        let feed = FeedConfig::default()
            .with_update_interval_secs(45)
            .with_request_timeout_ms(2500);
        assert_eq!(feed.update_interval().as_secs(), 45);
        assert_eq!(feed.request_timeout().as_millis(), 2500);
    }

    #[test]
    fn api_key_not_serialized() {
        let feed = FeedConfig::default().with_api_key("secret");
        let json = serde_json::to_string(&feed).unwrap();
        assert!(!json.contains("secret"));
        assert!(json.contains("updateIntervalSecs"));
    }

    // =========================================================================
    // DisplayConfig Tests
    // =========================================================================

    #[test]
    fn display_defaults_match_scheme() {
        let display = DisplayConfig::default();
        assert_eq!(display.color_scheme(), ColorScheme::default());
        assert_eq!(display.line1_color.to_hex().as_str(), "#002000");
        assert_eq!(display.shared_color.to_hex().as_str(), "#202000");
        assert!(display.focus().is_none());
    }

    #[test]
    fn threshold_out_of_range_uses_default() {
        assert_eq!(DisplayConfig::default().with_at_station_threshold_secs(0).at_station_threshold_secs, 0);
        assert_eq!(DisplayConfig::default().with_at_station_threshold_secs(60).at_station_threshold_secs, 60);
        assert_eq!(DisplayConfig::default().with_at_station_threshold_secs(61).at_station_threshold_secs, 30);
    }

    #[test]
    fn focus_trims_and_clears() {
        let display = DisplayConfig::default().with_focused_vehicle(" 40_101 ");
        assert_eq!(display.focus(), Some("40_101"));
        assert!(display.with_focused_vehicle("").focus().is_none());
    }

    #[test]
    fn long_focus_id_is_kept_whole() {
        let long = format!("40_{}", "9".repeat(MAX_SHORT_STRING + 20));
        let display = DisplayConfig::default().with_focused_vehicle(&long);
        assert_eq!(display.focus(), Some(long.as_str()));
    }

    #[test]
    fn display_update_applies_valid_fields() {
        let mut display = DisplayConfig::default();
        let update = DisplayUpdate {
            line1_color: Some("#FF0000".into()),
            line2_color: Some("blue".into()),
            shared_color: None,
            at_station_threshold: Some(99),
        };
        let ignored = update.apply_to(&mut display);
        assert_eq!(ignored, vec!["line2Color"]);
        assert_eq!(display.line1_color, Rgb::new(255, 0, 0));
        assert_eq!(display.line2_color, DisplayConfig::default().line2_color);
        assert_eq!(display.at_station_threshold_secs, DEFAULT_AT_STATION_THRESHOLD_SECS);
    }

    #[test]
    fn display_update_from_json() {
        let update: DisplayUpdate =
            serde_json::from_str(r##"{"sharedColor":"#101010","atStationThreshold":10}"##).unwrap();
        let mut display = DisplayConfig::default();
        assert!(update.apply_to(&mut display).is_empty());
        assert_eq!(display.shared_color, Rgb::new(16, 16, 16));
        assert_eq!(display.at_station_threshold_secs, 10);
    }

    // =========================================================================
    // DeviceConfig Tests
    // =========================================================================

    #[test]
    fn hostname_sanitised() {
        assert_eq!(sanitize_hostname("LinkLight-2").as_str(), "LinkLight-2");
        assert_eq!(sanitize_hostname("-edge-").as_str(), "edge");
        assert_eq!(sanitize_hostname("a b.c").as_str(), "abc");
        assert_eq!(sanitize_hostname("").as_str(), DEFAULT_HOSTNAME);
        assert_eq!(sanitize_hostname("---").as_str(), "-");
    }

    // =========================================================================
    // String Helper Tests
    // =========================================================================

    #[test]
    fn short_string_truncation() {
        let long_input = "a".repeat(100);
        let s = short_string(&long_input);
        assert_eq!(s.len(), MAX_SHORT_STRING);
    }

    #[test]
    fn long_string_truncation() {
        let long_input = "b".repeat(200);
        let s = long_string(&long_input);
        assert_eq!(s.len(), MAX_LONG_STRING);
    }

    #[test]
    fn string_helpers_utf8_boundary() {
        // 63 ASCII bytes leave no room for a 4-byte char
        let input = format!("{}{}", "x".repeat(63), "🚆");
        let s = short_string(&input);
        assert_eq!(s.len(), 63);
        assert!(core::str::from_utf8(s.as_bytes()).is_ok());
    }
}
