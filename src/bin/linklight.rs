//! Desktop runner: live (or sample) vehicle positions on a console strip,
//! with the dashboard API on port 8080.
//!
//! # Usage
//!
//! Sample data (no API key):
//! ```sh
//! cargo run --bin linklight
//! ```
//!
//! Live feed:
//! ```sh
//! LINKLIGHT_API_KEY=... cargo run --bin linklight
//! ```
//!
//! # Environment
//!
//! - `LINKLIGHT_API_KEY` - feed API key (unset = sample data)
//! - `LINKLIGHT_API_BASE_URL` - feed API base URL
//! - `LINKLIGHT_UPDATE_INTERVAL` - seconds between fetches (15-60)
//! - `LINKLIGHT_AT_STATION_THRESHOLD` - at-station threshold in seconds (0-60)
//! - `LINKLIGHT_PORT` - web API port
//! - `LINKLIGHT_HOSTNAME` - device hostname
//! - `LINKLIGHT_SAMPLE_DATA` - sample document path
//! - `RUST_LOG` - log filter (default `info`)

use std::sync::Arc;

use anyhow::Context;

use linklight::hal::ConsoleStrip;
use linklight::log::{FanoutLogger, Logger, RingBufferLogger, TracingLogger};
use linklight::services::{
    run_server_with_state, FileFeed, Fetcher, HttpFeed, Renderer, SharedLinkState, WebServerConfig,
};
use linklight::topology::link_table;
use linklight::{log_info, Config};

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn env_number<T>(name: &str) -> anyhow::Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    env_var(name)
        .map(|v| v.trim().parse::<T>().with_context(|| format!("invalid {}: {:?}", name, v)))
        .transpose()
}

/// Default configuration with `LINKLIGHT_*` overrides applied.
fn load_config() -> anyhow::Result<Config> {
    let mut config = Config::default();

    if let Some(key) = env_var("LINKLIGHT_API_KEY") {
        config.feed = config.feed.with_api_key(&key);
    }
    if let Some(url) = env_var("LINKLIGHT_API_BASE_URL") {
        config.feed = config.feed.with_api_base_url(&url);
    }
    if let Some(secs) = env_number("LINKLIGHT_UPDATE_INTERVAL")? {
        config.feed = config.feed.with_update_interval_secs(secs);
    }
    if let Some(path) = env_var("LINKLIGHT_SAMPLE_DATA") {
        config.feed = config.feed.with_sample_data_path(&path);
    }
    if let Some(secs) = env_number("LINKLIGHT_AT_STATION_THRESHOLD")? {
        config.display = config.display.with_at_station_threshold_secs(secs);
    }
    if let Some(port) = env_number("LINKLIGHT_PORT")? {
        config.web = config.web.with_port(port);
    }
    if let Some(hostname) = env_var("LINKLIGHT_HOSTNAME") {
        config.device = config.device.with_hostname(&hostname);
    }

    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A subscriber may already be installed by an embedding process
    let _ = linklight::logging::init_logging();

    let config = load_config()?;
    let topology = Arc::new(link_table().context("built-in station table is invalid")?);

    let logs = Arc::new(RingBufferLogger::new());
    let logger: Arc<dyn Logger> = Arc::new(
        FanoutLogger::new()
            .with_sink(Arc::new(TracingLogger))
            .with_sink(logs.clone()),
    );

    let state = Arc::new(
        SharedLinkState::builder(topology.clone())
            .config(&config)
            .logger(logger.clone())
            .log_buffer(logs)
            .build(),
    );

    log_info!(
        logger,
        "{} starting: {} LEDs, {} stations",
        config.device.hostname.as_str(),
        topology.led_count(),
        topology.stations().len()
    );

    // =========================================================================
    // Fetch task
    // =========================================================================
    if config.feed.uses_sample_data() {
        log_info!(logger, "No API key set, using sample data");
        let feed = Arc::new(FileFeed::new(config.feed.sample_data_path.as_str()));
        tokio::spawn(Fetcher::new(Arc::clone(&state), feed).run());
    } else {
        let feed = Arc::new(HttpFeed::new(&config.feed)?);
        tokio::spawn(Fetcher::new(Arc::clone(&state), feed).run());
    }

    // =========================================================================
    // Render task
    // =========================================================================
    let strip = ConsoleStrip::new(topology.led_count(), topology.rows().to_vec(), logger.clone());
    let renderer = tokio::spawn(Renderer::new(Arc::clone(&state), strip).run());

    // =========================================================================
    // Web API
    // =========================================================================
    if config.web.enabled {
        let web_config = WebServerConfig::from_config(&config.web);
        run_server_with_state(state, web_config)
            .await
            .context("web server failed")?;
    } else {
        renderer.await.context("render task panicked")?;
    }

    Ok(())
}
