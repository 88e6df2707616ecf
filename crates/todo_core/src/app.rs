//! Process bootstrap: wires configuration, storage and stores together.
//!
//! Load-on-init happens here; every later write flushes through the stores.

use crate::config::CoreConfig;
use crate::db::{open_db, open_db_in_memory, DbError};
use crate::logging::init_logging;
use crate::repo::preference_repo::SqlitePreferenceRepository;
use crate::repo::task_repo::SqliteTaskRepository;
use crate::service::error::StoreError;
use crate::service::icon::IconProvider;
use crate::service::preference_store::PreferenceStore;
use crate::service::task_store::TaskStore;
use log::info;
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type SqliteTaskStore = TaskStore<SqliteTaskRepository>;
pub type SqlitePreferenceStore<P> = PreferenceStore<SqlitePreferenceRepository, P>;

/// Failure while bringing the core up.
#[derive(Debug)]
pub enum AppError {
    Logging(String),
    Db(DbError),
    Store(StoreError),
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Logging(message) => write!(f, "logging init failed: {message}"),
            Self::Db(err) => write!(f, "database open failed: {err}"),
            Self::Store(err) => write!(f, "store init failed: {err}"),
        }
    }
}

impl Error for AppError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Logging(_) => None,
            Self::Db(err) => Some(err),
            Self::Store(err) => Some(err),
        }
    }
}

impl From<DbError> for AppError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<StoreError> for AppError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

/// Both stores, constructed once and shared by reference with display code.
pub struct App<P: IconProvider> {
    pub tasks: SqliteTaskStore,
    pub preferences: SqlitePreferenceStore<P>,
}

/// Opens storage per `config` and loads persisted preferences.
///
/// # Side effects
/// - Starts file logging when `config.log_dir` is set.
/// - Creates and migrates the database file when `config.db_path` is set.
pub fn open_app<P: IconProvider>(config: &CoreConfig, icons: P) -> Result<App<P>, AppError> {
    if let Some(log_dir) = &config.log_dir {
        let log_dir = log_dir
            .to_str()
            .ok_or_else(|| format!("log_dir `{}` is not valid UTF-8", log_dir.display()))
            .map_err(AppError::Logging)?;
        init_logging(&config.log_level, log_dir).map_err(AppError::Logging)?;
    }

    let tasks = TaskStore::new(SqliteTaskRepository::new(open_connection(config)?));
    let preferences = PreferenceStore::load(
        SqlitePreferenceRepository::new(open_connection(config)?),
        icons,
    )?;

    info!(
        "event=app_open module=app status=ok persistent={}",
        config.db_path.is_some()
    );
    Ok(App { tasks, preferences })
}

fn open_connection(config: &CoreConfig) -> Result<Connection, DbError> {
    match &config.db_path {
        Some(path) => open_db(path),
        None => open_db_in_memory(),
    }
}
