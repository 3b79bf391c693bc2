//! RSS cursors: the newest feed item already processed per
//! (quality profile, indexer).

use std::collections::HashMap;
use std::sync::RwLock;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CursorError {
    #[error("Cursor storage error: {0}")]
    Database(String),
}

/// Storage for RSS cursors. Writes are last-write-wins.
pub trait RssCursorStore: Send + Sync {
    fn get_cursor(&self, profile: &str, indexer: &str) -> Result<Option<String>, CursorError>;

    fn set_cursor(&self, profile: &str, indexer: &str, item_id: &str) -> Result<(), CursorError>;
}

/// Cursor store that lives for the lifetime of the process.
#[derive(Default)]
pub struct InMemoryRssCursorStore {
    cursors: RwLock<HashMap<(String, String), String>>,
}

impl InMemoryRssCursorStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn key(profile: &str, indexer: &str) -> (String, String) {
    (profile.to_lowercase(), indexer.to_lowercase())
}

impl RssCursorStore for InMemoryRssCursorStore {
    fn get_cursor(&self, profile: &str, indexer: &str) -> Result<Option<String>, CursorError> {
        let cursors = self
            .cursors
            .read()
            .map_err(|e| CursorError::Database(e.to_string()))?;
        Ok(cursors.get(&key(profile, indexer)).cloned())
    }

    fn set_cursor(&self, profile: &str, indexer: &str, item_id: &str) -> Result<(), CursorError> {
        let mut cursors = self
            .cursors
            .write()
            .map_err(|e| CursorError::Database(e.to_string()))?;
        cursors.insert(key(profile, indexer), item_id.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_cursor() {
        let store = InMemoryRssCursorStore::new();
        assert!(store.get_cursor("hd", "geek").unwrap().is_none());
    }

    #[test]
    fn test_last_write_wins() {
        let store = InMemoryRssCursorStore::new();
        store.set_cursor("hd", "geek", "item-1").unwrap();
        store.set_cursor("hd", "geek", "item-2").unwrap();
        store.set_cursor("hd", "geek", "item-2").unwrap();

        assert_eq!(
            store.get_cursor("HD", "Geek").unwrap().as_deref(),
            Some("item-2")
        );
        assert!(store.get_cursor("hd", "other").unwrap().is_none());
    }
}
