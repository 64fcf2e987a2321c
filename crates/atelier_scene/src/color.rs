//! 24-bit RGB colors with a `"#rrggbb"` wire form

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// An sRGB color packed as `0xRRGGBB`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Color(pub u32);

impl Color {
    /// Display color for objects that do not carry their own
    pub const DEFAULT_OBJECT: Color = Color(0x44aa88);
    pub const WHITE: Color = Color(0xffffff);
    pub const BLACK: Color = Color(0x000000);

    pub const fn from_hex(hex: u32) -> Self {
        Color(hex & 0xffffff)
    }

    pub const fn hex(&self) -> u32 {
        self.0
    }

    /// Build from linear `[0, 1]` float channels, clamping out-of-range values
    pub fn from_rgb_f32(rgb: [f32; 3]) -> Self {
        let channel = |v: f32| -> u32 { (v.clamp(0.0, 1.0) * 255.0).round() as u32 };
        Color((channel(rgb[0]) << 16) | (channel(rgb[1]) << 8) | channel(rgb[2]))
    }

    pub fn to_rgb_f32(&self) -> [f32; 3] {
        [
            ((self.0 >> 16) & 0xff) as f32 / 255.0,
            ((self.0 >> 8) & 0xff) as f32 / 255.0,
            (self.0 & 0xff) as f32 / 255.0,
        ]
    }

    /// Parse `#rrggbb`, `rrggbb` or `0xrrggbb`
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        let digits = s
            .strip_prefix('#')
            .or_else(|| s.strip_prefix("0x"))
            .unwrap_or(s);
        if digits.len() != 6 {
            return None;
        }
        u32::from_str_radix(digits, 16).ok().map(Color)
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::DEFAULT_OBJECT
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:06x}", self.0)
    }
}

impl FromStr for Color {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Color::parse(s).ok_or_else(|| format!("Invalid color: {}", s))
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

/// Colors arrive either as hex strings or as packed integers
#[derive(Deserialize)]
#[serde(untagged)]
enum ColorRepr {
    Hex(String),
    Packed(u32),
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match ColorRepr::deserialize(deserializer)? {
            ColorRepr::Hex(s) => s.parse().map_err(serde::de::Error::custom),
            ColorRepr::Packed(v) => Ok(Color::from_hex(v)),
        }
    }
}
