//! Trait definitions for the two edges of the engine.
//!
//! The engine only talks to the outside world through these seams:
//!
//! - [`LedStrip`]: push one frame of colors to the physical strip
//! - [`FeedSource`]: fetch the raw feed document for one line
//!
//! # Submodules
//!
//! - `strip`: LED strip output
//! - `feed`: Transit feed input
//!
//! Implementations live in [`crate::hal`] (strip, test doubles) and
//! [`crate::services`] (file and HTTP feeds).

pub mod feed;
pub mod strip;

pub use feed::*;
pub use strip::*;
