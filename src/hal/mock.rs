//! Mock implementations for testing without hardware or network.
//!
//! # Available Mocks
//!
//! | Mock | Trait | Purpose |
//! |------|-------|---------|
//! | [`MockStrip`] | [`LedStrip`] | Records every pushed frame |
//! | [`MockFeed`] | [`FeedSource`] | Scripted per-line responses, optional delay |
//!
//! # Example
//!
//! ```rust
//! use linklight::hal::MockStrip;
//! use linklight::traits::LedStrip;
//! use linklight::Rgb;
//!
//! let mut strip = MockStrip::new(4);
//! let frames = strip.clone(); // shares the recording
//! strip.show(&[Rgb::new(0, 32, 0)]).unwrap();
//!
//! let last = frames.last_frame().unwrap();
//! assert_eq!(last.len(), 4);
//! assert_eq!(last[0], Rgb::new(0, 32, 0));
//! assert!(last[1].is_off());
//! ```
//!
//! [`LedStrip`]: crate::traits::LedStrip
//! [`FeedSource`]: crate::traits::FeedSource

use core::future::Future;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::color::Rgb;
use crate::feed::FetchError;
use crate::traits::{FeedSource, LedStrip};
use crate::vehicle::Line;

// ============================================================================
// Strip Mock
// ============================================================================

/// Mock LED strip.
///
/// Clones share the same frame history, so a test can keep one handle and
/// give the other to the render task.
#[derive(Debug, Clone)]
pub struct MockStrip {
    led_count: usize,
    frames: Arc<Mutex<Vec<Vec<Rgb>>>>,
}

impl MockStrip {
    /// Creates a strip of `led_count` LEDs with no frames recorded.
    pub fn new(led_count: usize) -> Self {
        Self {
            led_count,
            frames: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Every frame pushed so far, oldest first.
    pub fn frames(&self) -> Vec<Vec<Rgb>> {
        self.frames.lock().map(|f| f.clone()).unwrap_or_default()
    }

    /// The most recent frame.
    pub fn last_frame(&self) -> Option<Vec<Rgb>> {
        self.frames.lock().ok().and_then(|f| f.last().cloned())
    }

    /// Number of frames pushed.
    pub fn frame_count(&self) -> usize {
        self.frames.lock().map(|f| f.len()).unwrap_or(0)
    }
}

impl LedStrip for MockStrip {
    type Error = ();

    fn led_count(&self) -> usize {
        self.led_count
    }

    fn show(&mut self, colors: &[Rgb]) -> Result<(), ()> {
        let mut frame = vec![Rgb::OFF; self.led_count];
        for (slot, color) in frame.iter_mut().zip(colors) {
            *slot = *color;
        }
        self.frames.lock().map_err(|_| ())?.push(frame);
        Ok(())
    }
}

// ============================================================================
// Feed Mock
// ============================================================================

/// Mock feed with one scripted response per line.
///
/// Lines without a scripted response answer with HTTP 404. Responses can be
/// changed while a fetcher is running.
#[derive(Debug)]
pub struct MockFeed {
    responses: Mutex<HashMap<Line, Result<Vec<u8>, FetchError>>>,
    lines: Vec<Line>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl Default for MockFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl MockFeed {
    /// Creates a feed serving every line, with nothing scripted.
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(HashMap::new()),
            lines: Line::ALL.to_vec(),
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Restrict the lines the feed reports.
    pub fn with_lines(mut self, lines: &[Line]) -> Self {
        self.lines = lines.to_vec();
        self
    }

    /// Delay every response (uses tokio time, so paused clocks apply).
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Script a successful body for `line`.
    pub fn set_body(&self, line: Line, body: impl Into<Vec<u8>>) {
        self.set_response(line, Ok(body.into()));
    }

    /// Script a failure for `line`.
    pub fn set_error(&self, line: Line, error: FetchError) {
        self.set_response(line, Err(error));
    }

    /// Script any response for `line`.
    pub fn set_response(&self, line: Line, response: Result<Vec<u8>, FetchError>) {
        if let Ok(mut responses) = self.responses.lock() {
            responses.insert(line, response);
        }
    }

    /// Number of `fetch_line` calls so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl FeedSource for MockFeed {
    fn lines(&self) -> &[Line] {
        &self.lines
    }

    fn describe(&self) -> &str {
        "mock feed"
    }

    fn fetch_line(&self, line: Line) -> impl Future<Output = Result<Vec<u8>, FetchError>> + Send {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let response = self
            .responses
            .lock()
            .ok()
            .and_then(|r| r.get(&line).cloned())
            .unwrap_or(Err(FetchError::Status(404)));
        let delay = self.delay;
        async move {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            response
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
