//! Runtime services: shared state, fetch/render tasks, feed sources and the
//! web API.
//!
//! - `shared`: the single [`SharedLinkState`] every task holds an `Arc` of
//! - `pipeline`: the [`Fetcher`] and [`Renderer`] tasks
//! - `file_feed`: sample data read from disk
//! - `http-feed` feature: live feed client over HTTPS
//! - `web` feature: Axum-based HTTP API server with JSON endpoints
//!
//! # Shared State Pattern
//!
//! ```ignore
//! use std::sync::Arc;
//! use linklight::services::{Fetcher, Renderer, SharedLinkState};
//!
//! let state = Arc::new(SharedLinkState::builder(topology).config(&config).build());
//!
//! tokio::spawn(Fetcher::new(Arc::clone(&state), feed).run());
//! tokio::spawn(Renderer::new(Arc::clone(&state), strip).run());
//! let web_router = build_router(Arc::clone(&state), &web_config);
//! ```

pub mod file_feed;
pub mod pipeline;
pub mod shared;

#[cfg(feature = "http-feed")]
pub mod http_feed;

#[cfg(feature = "web")]
pub mod api;

#[cfg(feature = "web")]
pub mod web;

// Re-exports
pub use file_feed::*;
pub use pipeline::*;
pub use shared::*;

#[cfg(feature = "http-feed")]
pub use http_feed::*;

#[cfg(feature = "web")]
pub use api::*;

#[cfg(feature = "web")]
pub use web::*;
