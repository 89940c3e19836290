//! Hardware Abstraction Layer implementations.
//!
//! This module contains concrete implementations of the traits
//! defined in [`crate::traits`].
//!
//! # Available Implementations
//!
//! - `mock`: Test implementations for desktop development
//! - `console`: Strip that logs per-row occupancy instead of driving LEDs

pub mod console;
pub mod mock;

pub use console::*;
pub use mock::*;
