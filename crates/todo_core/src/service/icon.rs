//! Boundary to the platform's app-icon switching facility.
//!
//! The core never owns the icon catalogue; it only remembers which entry the
//! user picked and asks the provider to apply it.

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Platform refused or failed to switch the icon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IconApplyError(pub String);

impl Display for IconApplyError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "icon could not be applied: {}", self.0)
    }
}

impl Error for IconApplyError {}

/// Supplies the icon catalogue and applies a selection.
pub trait IconProvider {
    /// Ordered icon identifiers. Must contain at least one entry.
    fn icon_names(&self) -> Vec<String>;
    /// Identifier currently shown by the platform; `None` is the default icon.
    fn active_icon(&self) -> Option<String>;
    /// Switches the platform icon; `None` restores the default icon.
    fn apply_icon(&self, name: Option<&str>) -> Result<(), IconApplyError>;
}

/// Result of pushing a new icon selection to the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IconApplyOutcome {
    Applied,
    /// The platform already shows this icon; nothing was requested.
    AlreadyActive,
    /// The selection is stored but the platform did not switch.
    Failed(IconApplyError),
}

/// Provider for hosts without icon switching: one fixed icon, every apply succeeds.
#[derive(Debug, Clone)]
pub struct StaticIconProvider {
    names: Vec<String>,
}

impl StaticIconProvider {
    pub fn new(names: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }
}

impl Default for StaticIconProvider {
    fn default() -> Self {
        Self::new(["Default"])
    }
}

impl IconProvider for StaticIconProvider {
    fn icon_names(&self) -> Vec<String> {
        self.names.clone()
    }

    fn active_icon(&self) -> Option<String> {
        None
    }

    fn apply_icon(&self, _name: Option<&str>) -> Result<(), IconApplyError> {
        Ok(())
    }
}
