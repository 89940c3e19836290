//! LED strip output trait.

use crate::color::Rgb;

/// An addressable LED strip.
///
/// The render task calls [`show`](Self::show) once per snapshot with one
/// color per LED, index 0 first. Driver bit-timing is the implementation's
/// concern.
///
/// # Example
///
/// ```rust
/// use linklight::traits::LedStrip;
/// use linklight::Rgb;
///
/// struct Recorder(Vec<Rgb>);
///
/// impl LedStrip for Recorder {
///     type Error = ();
///
///     fn led_count(&self) -> usize {
///         3
///     }
///
///     fn show(&mut self, colors: &[Rgb]) -> Result<(), ()> {
///         self.0 = colors.to_vec();
///         Ok(())
///     }
/// }
///
/// let mut strip = Recorder(Vec::new());
/// strip.clear().unwrap();
/// assert_eq!(strip.0, vec![Rgb::OFF; 3]);
/// ```
pub trait LedStrip {
    /// Error type for strip operations.
    type Error: core::fmt::Debug;

    /// Number of LEDs on the strip.
    fn led_count(&self) -> usize;

    /// Push a full frame.
    ///
    /// `colors` normally has exactly [`led_count`](Self::led_count) entries;
    /// implementations ignore extras and leave missing LEDs off.
    fn show(&mut self, colors: &[Rgb]) -> Result<(), Self::Error>;

    /// Turn every LED off.
    fn clear(&mut self) -> Result<(), Self::Error> {
        let off = vec![Rgb::OFF; self.led_count()];
        self.show(&off)
    }
}
