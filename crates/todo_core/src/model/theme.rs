//! Built-in theme table.
//!
//! Themes are compiled in and never change at runtime; the preference store
//! persists only the selected theme id.

use crate::model::color::AccentColor;
use serde::Serialize;

/// Named color scheme with a stable numeric id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Theme {
    pub id: u32,
    pub name: &'static str,
    pub color: AccentColor,
}

const THEMES: [Theme; 3] = [
    Theme {
        id: 0,
        name: "Pink theme",
        color: AccentColor::Pink,
    },
    Theme {
        id: 1,
        name: "Blue theme",
        color: AccentColor::Blue,
    },
    Theme {
        id: 2,
        name: "Green theme",
        color: AccentColor::Green,
    },
];

/// Returns every available theme, ordered by id.
pub fn list_themes() -> &'static [Theme] {
    &THEMES
}

/// Looks up a theme by id.
pub fn find_theme(id: i64) -> Option<&'static Theme> {
    THEMES.iter().find(|theme| i64::from(theme.id) == id)
}

/// Theme used on first run and whenever the stored id is unusable.
pub fn default_theme() -> &'static Theme {
    &THEMES[0]
}
