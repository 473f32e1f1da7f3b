//! SQLite-backed implementation of the UserLinkRepository port.

use std::sync::Arc;

use async_trait::async_trait;
use meetbridge_core::UserLinkRepository;
use meetbridge_domain::Result;
use rusqlite::{params, OptionalExtension};

use super::manager::DbManager;
use crate::errors::InfraError;

/// Email-to-directory-object mapping in the `user_links` table. Lookups are
/// case-insensitive on email.
pub struct SqliteUserLinkRepository {
    db: Arc<DbManager>,
}

impl SqliteUserLinkRepository {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserLinkRepository for SqliteUserLinkRepository {
    async fn azure_object_id(&self, email: &str) -> Result<Option<String>> {
        let conn = self.db.get_connection()?;
        conn.query_row(
            "SELECT azure_object_id FROM user_links WHERE email = ?1 COLLATE NOCASE",
            params![email],
            |row| row.get(0),
        )
        .optional()
        .map_err(|e| InfraError::from(e).into())
    }

    async fn set_azure_object_id(&self, email: &str, azure_id: &str) -> Result<()> {
        let conn = self.db.get_connection()?;
        conn.execute(
            "INSERT INTO user_links (email, azure_object_id) VALUES (?1, ?2)
             ON CONFLICT (email) DO UPDATE SET azure_object_id = excluded.azure_object_id",
            params![email.to_lowercase(), azure_id],
        )
        .map_err(InfraError::from)?;
        Ok(())
    }
}
