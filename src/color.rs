//! RGB color values for the LED strip.
//!
//! Colors travel through configuration and the web API as `#RRGGBB` hex
//! strings, and reach the strip as [`Rgb`] triples.
//!
//! # Example
//!
//! ```rust
//! use linklight::Rgb;
//!
//! let green = Rgb::from_hex("#002000").unwrap();
//! assert_eq!(green, Rgb::new(0, 32, 0));
//! assert_eq!(green.to_hex().as_str(), "#002000");
//! ```

use core::fmt::Write as _;

use heapless::String as HString;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A single LED color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct Rgb {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
}

impl Rgb {
    /// LED off.
    pub const OFF: Rgb = Rgb::new(0, 0, 0);

    /// Creates a color from its channels.
    #[inline]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Returns true if every channel is zero.
    #[inline]
    pub const fn is_off(&self) -> bool {
        self.r == 0 && self.g == 0 && self.b == 0
    }

    /// Parse a `#RRGGBB` string.
    ///
    /// The leading `#` is required and exactly six hex digits must follow.
    ///
    /// ```
    /// use linklight::Rgb;
    ///
    /// assert_eq!(Rgb::from_hex("#ff8000"), Some(Rgb::new(255, 128, 0)));
    /// assert_eq!(Rgb::from_hex("ff8000"), None);
    /// assert_eq!(Rgb::from_hex("#ff80"), None);
    /// assert_eq!(Rgb::from_hex("#gg0000"), None);
    /// ```
    pub fn from_hex(s: &str) -> Option<Self> {
        let hex = s.trim().strip_prefix('#')?;
        if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        let value = u32::from_str_radix(hex, 16).ok()?;
        Some(Self::new(
            ((value >> 16) & 0xFF) as u8,
            ((value >> 8) & 0xFF) as u8,
            (value & 0xFF) as u8,
        ))
    }

    /// Format as lowercase `#rrggbb`.
    pub fn to_hex(&self) -> HString<7> {
        let mut out = HString::new();
        // 7 bytes always fit
        let _ = write!(out, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b);
        out
    }
}

impl Serialize for Rgb {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.to_hex().as_str())
    }
}

impl<'de> Deserialize<'de> for Rgb {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = std::string::String::deserialize(deserializer)?;
        Rgb::from_hex(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid color '{}', expected #RRGGBB", s)))
    }
}
