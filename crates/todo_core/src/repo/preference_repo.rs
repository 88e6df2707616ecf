//! Key/value preference storage.
//!
//! # Invariants
//! - One row per key; writes are single-statement upserts.
//! - A `NULL` value reads back as absent.
//! - Failures are storage transport errors only (`DbError`).

use crate::db::DbResult;
use rusqlite::{params, Connection, OptionalExtension};

/// Key holding the selected theme id.
pub const SELECTED_THEME_KEY: &str = "selected_theme";
/// Key holding the selected icon index; absent means the default icon.
pub const SELECTED_ICON_KEY: &str = "selected_icon";

/// Storage contract for small integer preferences.
pub trait PreferenceRepository {
    fn read_int(&self, key: &str) -> DbResult<Option<i64>>;
    fn write_int(&self, key: &str, value: Option<i64>) -> DbResult<()>;
}

/// SQLite-backed preference repository.
pub struct SqlitePreferenceRepository {
    conn: Connection,
}

impl SqlitePreferenceRepository {
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }
}

impl PreferenceRepository for SqlitePreferenceRepository {
    fn read_int(&self, key: &str) -> DbResult<Option<i64>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM preferences WHERE key = ?1;",
                [key],
                |row| row.get::<_, Option<i64>>(0),
            )
            .optional()?;
        Ok(value.flatten())
    }

    fn write_int(&self, key: &str, value: Option<i64>) -> DbResult<()> {
        self.conn.execute(
            "INSERT INTO preferences (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = (strftime('%s', 'now') * 1000);",
            params![key, value],
        )?;
        Ok(())
    }
}
