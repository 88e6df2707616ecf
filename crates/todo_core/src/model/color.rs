//! Display colors shared by themes and priority badges.

use serde::{Deserialize, Serialize};

/// Named accent color understood by every display layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccentColor {
    Pink,
    Red,
    Green,
    Blue,
    Gray,
}

impl AccentColor {
    /// Lowercase name, stable for logs and serialized payloads.
    pub fn name(self) -> &'static str {
        match self {
            Self::Pink => "pink",
            Self::Red => "red",
            Self::Green => "green",
            Self::Blue => "blue",
            Self::Gray => "gray",
        }
    }

    /// sRGB value as `#rrggbb`.
    pub fn hex(self) -> &'static str {
        match self {
            Self::Pink => "#ff2d55",
            Self::Red => "#ff3b30",
            Self::Green => "#34c759",
            Self::Blue => "#007aff",
            Self::Gray => "#8e8e93",
        }
    }
}

/// Maps a priority label to its badge color.
///
/// Total over all strings: unknown labels (including legacy or corrupted
/// values) render as `Gray`.
pub fn colorize(priority_label: &str) -> AccentColor {
    match priority_label {
        "High" => AccentColor::Red,
        "Normal" => AccentColor::Green,
        "Low" => AccentColor::Blue,
        _ => AccentColor::Gray,
    }
}
