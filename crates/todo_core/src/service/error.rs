//! Typed failures returned by the task and preference stores.

use crate::db::DbError;
use crate::model::task::{TaskId, TaskValidationError};
use crate::repo::task_repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type StoreResult<T> = Result<T, StoreError>;

/// Caller input that was rejected before any state changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    EmptyTaskName,
    UnknownTheme(i64),
    IconOutOfRange { index: usize, count: usize },
    PositionOutOfRange { position: usize, len: usize },
    /// The caller's view no longer matches the stored sorted view.
    StaleView,
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTaskName => write!(f, "task name must not be empty"),
            Self::UnknownTheme(id) => write!(f, "unknown theme id {id}"),
            Self::IconOutOfRange { index, count } => {
                write!(f, "icon index {index} out of range for {count} icon(s)")
            }
            Self::PositionOutOfRange { position, len } => {
                write!(f, "position {position} out of range for {len} task(s)")
            }
            Self::StaleView => write!(f, "task view is stale; reload and retry"),
        }
    }
}

impl Error for ValidationError {}

impl From<TaskValidationError> for ValidationError {
    fn from(value: TaskValidationError) -> Self {
        match value {
            TaskValidationError::EmptyName => Self::EmptyTaskName,
        }
    }
}

#[derive(Debug)]
pub enum StoreError {
    Validation(ValidationError),
    /// Durable storage failed; nothing from this call is visible to readers.
    Persistence(RepoError),
    /// A change handler tried to write back into the store that is notifying it.
    ReentrantWrite,
    /// A batch delete stopped part-way; `removed` stay removed.
    PartialDelete {
        removed: Vec<TaskId>,
        remaining: Vec<usize>,
        source: Box<StoreError>,
    },
}

impl StoreError {
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    pub fn is_persistence(&self) -> bool {
        matches!(self, Self::Persistence(_))
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "validation failed: {err}"),
            Self::Persistence(err) => write!(f, "persistence failed: {err}"),
            Self::ReentrantWrite => {
                write!(f, "write rejected: store is dispatching change notifications")
            }
            Self::PartialDelete {
                removed,
                remaining,
                source,
            } => write!(
                f,
                "deleted {} task(s), {} left undeleted: {source}",
                removed.len(),
                remaining.len()
            ),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Persistence(err) => Some(err),
            Self::ReentrantWrite => None,
            Self::PartialDelete { source, .. } => Some(source.as_ref()),
        }
    }
}

impl From<ValidationError> for StoreError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RepoError> for StoreError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Validation(err) => Self::Validation(err.into()),
            other => Self::Persistence(other),
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Persistence(RepoError::Db(value))
    }
}
