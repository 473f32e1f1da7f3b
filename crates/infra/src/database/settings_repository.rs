//! SQLite-backed implementation of the SettingsStore port.

use std::sync::Arc;

use async_trait::async_trait;
use meetbridge_core::SettingsStore;
use meetbridge_domain::Result;
use rusqlite::{params, OptionalExtension};

use super::manager::DbManager;
use crate::errors::InfraError;

/// Key/value settings persisted in the `settings` table.
pub struct SqliteSettingsStore {
    db: Arc<DbManager>,
}

impl SqliteSettingsStore {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SettingsStore for SqliteSettingsStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let conn = self.db.get_connection()?;
        conn.query_row("SELECT value FROM settings WHERE key = ?1", params![key], |row| {
            row.get(0)
        })
        .optional()
        .map_err(|e| InfraError::from(e).into())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.db.get_connection()?;
        conn.execute(
            "INSERT INTO settings (key, value) VALUES (?1, ?2)
             ON CONFLICT (key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )
        .map_err(InfraError::from)?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let conn = self.db.get_connection()?;
        conn.execute("DELETE FROM settings WHERE key = ?1", params![key])
            .map_err(InfraError::from)?;
        Ok(())
    }
}
