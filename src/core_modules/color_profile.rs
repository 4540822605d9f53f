// THEORY:
// The color profile registry is the static lookup table behind the color mask stage.
// It maps a color identifier to one or more inclusive HSV intervals. Several intervals
// are needed whenever a color straddles the hue wrap point: red sits at both ends of
// the 0..180 hue circle used by 8-bit HSV, so it needs one interval near 0 and one
// near 180.
//
// The registry is built once at startup and never mutated afterwards. Lookups by an
// unregistered name fail with `UnknownColor`; the interactive command set can only
// select the three built-in colors, so in practice that failure indicates a custom
// registry that is missing one of them.

use crate::error::{DetectionError, Result};
use std::fmt;
use std::str::FromStr;

/// One channel triple in 8-bit HSV: hue 0..=179, saturation and value 0..=255.
pub type Hsv = [u8; 3];

/// An inclusive lower/upper bound pair in HSV space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HsvRange {
    pub lower: Hsv,
    pub upper: Hsv,
}

impl HsvRange {
    pub const fn new(lower: Hsv, upper: Hsv) -> Self {
        Self { lower, upper }
    }

    /// True when every channel lies inside its bounds (bounds included).
    #[inline]
    pub fn contains(&self, hsv: Hsv) -> bool {
        hsv.iter()
            .zip(self.lower.iter().zip(self.upper.iter()))
            .all(|(value, (low, high))| value >= low && value <= high)
    }
}

/// The selectable colors of the interactive command surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorId {
    Red,
    Green,
    Blue,
}

impl ColorId {
    pub const ALL: [ColorId; 3] = [ColorId::Red, ColorId::Green, ColorId::Blue];

    /// The registry key of this color.
    pub fn as_str(&self) -> &'static str {
        match self {
            ColorId::Red => "red",
            ColorId::Green => "green",
            ColorId::Blue => "blue",
        }
    }
}

impl fmt::Display for ColorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ColorId {
    type Err = DetectionError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "red" => Ok(ColorId::Red),
            "green" => Ok(ColorId::Green),
            "blue" => Ok(ColorId::Blue),
            other => Err(DetectionError::UnknownColor(other.to_string())),
        }
    }
}

/// A named, ordered set of HSV intervals that together describe one color.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorProfile {
    pub name: String,
    pub ranges: Vec<HsvRange>,
}

impl ColorProfile {
    pub fn new(name: impl Into<String>, ranges: Vec<HsvRange>) -> Self {
        Self {
            name: name.into(),
            ranges,
        }
    }

    /// True when the pixel falls inside at least one of the intervals.
    pub fn matches(&self, hsv: Hsv) -> bool {
        self.ranges.iter().any(|range| range.contains(hsv))
    }
}

/// Read-only table of color profiles keyed by name.
#[derive(Debug, Clone)]
pub struct ColorRegistry {
    profiles: Vec<ColorProfile>,
}

impl ColorRegistry {
    pub fn new(profiles: Vec<ColorProfile>) -> Self {
        Self { profiles }
    }

    /// Returns the profile registered under `name`.
    pub fn get(&self, name: &str) -> Result<&ColorProfile> {
        self.profiles
            .iter()
            .find(|profile| profile.name == name)
            .ok_or_else(|| DetectionError::UnknownColor(name.to_string()))
    }

    pub fn profile(&self, color: ColorId) -> Result<&ColorProfile> {
        self.get(color.as_str())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.profiles.iter().map(|profile| profile.name.as_str())
    }
}

impl Default for ColorRegistry {
    fn default() -> Self {
        Self::new(vec![
            ColorProfile::new(
                ColorId::Red.as_str(),
                vec![
                    HsvRange::new([0, 40, 40], [10, 255, 255]),
                    HsvRange::new([170, 40, 40], [180, 255, 255]),
                ],
            ),
            ColorProfile::new(
                ColorId::Green.as_str(),
                vec![HsvRange::new([35, 50, 50], [85, 255, 255])],
            ),
            ColorProfile::new(
                ColorId::Blue.as_str(),
                vec![HsvRange::new([85, 30, 30], [130, 255, 255])],
            ),
        ])
    }
}
