//! SQLite `properties` table as a key-value store.

use crate::engine::config_store::KeyValueStore;
use crate::error::Result;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;

/// Key/value pairs in the `properties` table.
pub struct SqliteKeyValueStore {
    conn: Connection,
}

impl SqliteKeyValueStore {
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }
}

impl KeyValueStore for SqliteKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self
            .conn
            .query_row(
                "SELECT value FROM properties WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?)
    }

    fn set_many(&self, values: &HashMap<String, String>) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        for (key, value) in values {
            tx.execute(
                "INSERT INTO properties (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                params![key, value],
            )?;
        }
        tx.commit()?;
        Ok(())
    }
}
