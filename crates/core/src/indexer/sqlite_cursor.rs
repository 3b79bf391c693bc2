//! SQLite-backed RSS cursor store.

use std::path::Path;
use std::sync::Mutex;

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};

use super::cursor::{CursorError, RssCursorStore};

/// Persists RSS cursors between runs.
pub struct SqliteRssCursorStore {
    conn: Mutex<Connection>,
}

impl SqliteRssCursorStore {
    /// Open (or create) the database file and its table.
    pub fn new(path: &Path) -> Result<Self, CursorError> {
        let conn = Connection::open(path).map_err(|e| CursorError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// In-memory store (useful for testing).
    pub fn in_memory() -> Result<Self, CursorError> {
        let conn =
            Connection::open_in_memory().map_err(|e| CursorError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), CursorError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS rss_cursors (
                profile TEXT NOT NULL,
                indexer TEXT NOT NULL,
                last_item_id TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                PRIMARY KEY (profile, indexer)
            );
            "#,
        )
        .map_err(|e| CursorError::Database(e.to_string()))?;

        Ok(())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, CursorError> {
        self.conn
            .lock()
            .map_err(|e| CursorError::Database(e.to_string()))
    }
}

impl RssCursorStore for SqliteRssCursorStore {
    fn get_cursor(&self, profile: &str, indexer: &str) -> Result<Option<String>, CursorError> {
        let conn = self.lock()?;
        conn.query_row(
            "SELECT last_item_id FROM rss_cursors WHERE profile = ? AND indexer = ?",
            params![profile.to_lowercase(), indexer.to_lowercase()],
            |row| row.get(0),
        )
        .optional()
        .map_err(|e| CursorError::Database(e.to_string()))
    }

    fn set_cursor(&self, profile: &str, indexer: &str, item_id: &str) -> Result<(), CursorError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO rss_cursors (profile, indexer, last_item_id, updated_at)
             VALUES (?, ?, ?, ?)
             ON CONFLICT(profile, indexer) DO UPDATE SET
                last_item_id = excluded.last_item_id,
                updated_at = excluded.updated_at",
            params![
                profile.to_lowercase(),
                indexer.to_lowercase(),
                item_id,
                Utc::now().to_rfc3339(),
            ],
        )
        .map_err(|e| CursorError::Database(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_roundtrip_in_memory() {
        let store = SqliteRssCursorStore::in_memory().unwrap();
        assert!(store.get_cursor("hd", "geek").unwrap().is_none());

        store.set_cursor("hd", "geek", "guid-1").unwrap();
        store.set_cursor("hd", "geek", "guid-2").unwrap();

        assert_eq!(
            store.get_cursor("hd", "geek").unwrap().as_deref(),
            Some("guid-2")
        );
    }

    #[test]
    fn test_cursor_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cursors.db");

        {
            let store = SqliteRssCursorStore::new(&path).unwrap();
            store.set_cursor("hd", "geek", "guid-9").unwrap();
        }

        let store = SqliteRssCursorStore::new(&path).unwrap();
        assert_eq!(
            store.get_cursor("HD", "GEEK").unwrap().as_deref(),
            Some("guid-9")
        );
    }

    #[test]
    fn test_cursors_are_per_profile_and_indexer() {
        let store = SqliteRssCursorStore::in_memory().unwrap();
        store.set_cursor("hd", "geek", "a").unwrap();
        store.set_cursor("uhd", "geek", "b").unwrap();
        store.set_cursor("hd", "drunk", "c").unwrap();

        assert_eq!(store.get_cursor("hd", "geek").unwrap().as_deref(), Some("a"));
        assert_eq!(store.get_cursor("uhd", "geek").unwrap().as_deref(), Some("b"));
        assert_eq!(store.get_cursor("hd", "drunk").unwrap().as_deref(), Some("c"));
    }
}
