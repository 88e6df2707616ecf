//! Task domain model.
//!
//! # Responsibility
//! - Define the task record owned by the task store.
//! - Define priority levels and their display mapping.
//!
//! # Invariants
//! - `id` is stable and never reused for another task.
//! - `name` is non-empty after trimming.
//! - Tasks are never mutated in place once persisted.

use crate::model::color::{colorize, AccentColor};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use uuid::Uuid;

/// Stable identifier of a task.
pub type TaskId = Uuid;

/// Urgency attached to a task at creation time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Priority {
    High,
    #[default]
    Normal,
    Low,
}

impl Priority {
    /// All priorities in picker order.
    pub const ALL: [Priority; 3] = [Priority::High, Priority::Normal, Priority::Low];

    /// Persisted and displayed label.
    pub fn label(self) -> &'static str {
        match self {
            Self::High => "High",
            Self::Normal => "Normal",
            Self::Low => "Low",
        }
    }

    /// Badge color for this priority.
    pub fn accent(self) -> AccentColor {
        colorize(self.label())
    }
}

impl Display for Priority {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Priority {
    type Err = UnknownPriority;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Priority::ALL
            .into_iter()
            .find(|priority| priority.label() == value)
            .ok_or_else(|| UnknownPriority(value.to_string()))
    }
}

/// Label that does not name a `Priority`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownPriority(pub String);

impl Display for UnknownPriority {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown priority `{}`; expected High|Normal|Low", self.0)
    }
}

impl Error for UnknownPriority {}

/// Validation failures for task records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskValidationError {
    /// Name is empty or whitespace only.
    EmptyName,
}

impl Display for TaskValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyName => write!(f, "task name must not be empty"),
        }
    }
}

impl Error for TaskValidationError {}

/// A to-do record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub name: String,
    pub priority: Priority,
    /// Unix epoch milliseconds assigned at creation.
    pub created_at_ms: i64,
}

impl Task {
    /// Builds a new task with a fresh id, trimming `name`.
    ///
    /// # Errors
    /// - `TaskValidationError::EmptyName` when `name` is blank.
    pub fn new(
        name: &str,
        priority: Priority,
        created_at_ms: i64,
    ) -> Result<Self, TaskValidationError> {
        let task = Self {
            id: Uuid::new_v4(),
            name: name.trim().to_string(),
            priority,
            created_at_ms,
        };
        task.validate()?;
        Ok(task)
    }

    /// Re-checks record invariants; used on both write and read paths.
    pub fn validate(&self) -> Result<(), TaskValidationError> {
        validate_name(&self.name)
    }
}

/// Rejects empty and whitespace-only names.
pub fn validate_name(name: &str) -> Result<(), TaskValidationError> {
    if name.trim().is_empty() {
        return Err(TaskValidationError::EmptyName);
    }
    Ok(())
}
