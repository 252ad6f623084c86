//! Green → yellow → red colour scale for normalized magnitudes.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Colour {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl Colour {
    pub const fn new(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    /// `#rrggbb`, lower case.
    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.red, self.green, self.blue)
    }

    pub fn from_hex(hex: &str) -> Option<Self> {
        let digits = hex.strip_prefix('#').unwrap_or(hex);
        if digits.len() != 6 || !digits.is_ascii() {
            return None;
        }
        let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&digits[range], 16).ok();
        Some(Self::new(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }
}

impl fmt::Display for Colour {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for Colour {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Colour {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let hex = String::deserialize(deserializer)?;
        Colour::from_hex(&hex)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid colour `{}`", hex)))
    }
}

/// Banded colour scale.
///
/// Values below `yellow_from` render a fixed green. From there the colour
/// turns yellow and then red at `red_from`, with channel intensity
/// `floor(intensity_floor + intensity_span * v) + 1` capped at 255.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColourScale {
    pub intensity_floor: f64,
    pub intensity_span: f64,
    pub green_intensity: u8,
    pub yellow_from: f64,
    pub red_from: f64,
}

impl Default for ColourScale {
    fn default() -> Self {
        Self {
            intensity_floor: 55.0,
            intensity_span: 200.0,
            green_intensity: 165,
            yellow_from: 0.5,
            red_from: 0.9,
        }
    }
}

impl ColourScale {
    /// Colour for a value in `[0, 1]`. Out of range input is clamped and NaN
    /// is treated as 0.
    pub fn to_colour(&self, normalized: f64) -> Colour {
        let v = if normalized.is_nan() {
            0.0
        } else {
            normalized.clamp(0.0, 1.0)
        };

        if v < self.yellow_from {
            return Colour::new(0, self.green_intensity, 0);
        }

        let intensity = self.intensity(v);
        if v < self.red_from {
            Colour::new(intensity, intensity, 0)
        } else {
            Colour::new(intensity, 0, 0)
        }
    }

    fn intensity(&self, v: f64) -> u8 {
        let raw = (self.intensity_floor + self.intensity_span * v).floor() + 1.0;
        raw.clamp(0.0, 255.0) as u8
    }
}

pub fn to_colour(normalized: f64) -> Colour {
    ColourScale::default().to_colour(normalized)
}
