//! Desktop stand-in for the physical strip.
//!
//! Logs how many LEDs are lit in each row on every push, which is enough to
//! follow the display without hardware attached.

use core::convert::Infallible;
use std::sync::Arc;

use crate::color::Rgb;
use crate::log::Logger;
use crate::log_info;
use crate::topology::StripRow;
use crate::traits::LedStrip;

/// Strip that reports per-row occupancy through a [`Logger`].
pub struct ConsoleStrip {
    led_count: usize,
    rows: Vec<StripRow>,
    logger: Arc<dyn Logger>,
}

impl ConsoleStrip {
    /// Creates a console strip for the given layout.
    pub fn new(led_count: usize, rows: Vec<StripRow>, logger: Arc<dyn Logger>) -> Self {
        Self {
            led_count,
            rows,
            logger,
        }
    }

    /// Lit LEDs per row, in row order.
    pub fn row_counts(&self, colors: &[Rgb]) -> Vec<(&str, usize)> {
        self.rows
            .iter()
            .map(|row| {
                let lit = row
                    .indices()
                    .filter(|&i| colors.get(i).is_some_and(|c| !c.is_off()))
                    .count();
                (row.label.as_str(), lit)
            })
            .collect()
    }
}

impl LedStrip for ConsoleStrip {
    type Error = Infallible;

    fn led_count(&self) -> usize {
        self.led_count
    }

    fn show(&mut self, colors: &[Rgb]) -> Result<(), Infallible> {
        let lit = colors.iter().take(self.led_count).filter(|c| !c.is_off()).count();
        let summary = self
            .row_counts(colors)
            .iter()
            .map(|(label, count)| format!("{}: {}", label, count))
            .collect::<Vec<_>>()
            .join(", ");
        log_info!(self.logger, "Strip: {} lit ({})", lit, summary);
        Ok(())
    }
}
