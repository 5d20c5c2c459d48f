use super::{DbResult, RenameJournal};
use serde::{Deserialize, Serialize};

/// Rename session status (string-based storage)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum RenameStatus {
    #[serde(rename = "copying")]
    Copying,
    #[serde(rename = "deleting")]
    Deleting,
    #[serde(rename = "success")]
    Success,
    #[serde(rename = "error")]
    Error,
}

impl std::fmt::Display for RenameStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RenameStatus::Copying => write!(f, "copying"),
            RenameStatus::Deleting => write!(f, "deleting"),
            RenameStatus::Success => write!(f, "success"),
            RenameStatus::Error => write!(f, "error"),
        }
    }
}

impl From<String> for RenameStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "copying" => RenameStatus::Copying,
            "deleting" => RenameStatus::Deleting,
            "success" => RenameStatus::Success,
            "error" => RenameStatus::Error,
            _ => RenameStatus::Copying,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenameSession {
    pub id: String,
    pub old_prefix: String,
    pub new_prefix: String,
    pub status: String,
    pub error: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// One object of a rename: where it comes from, where it goes, how far it got
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenameItem {
    pub source_key: String,
    pub dest_key: String,
    pub copied: bool,
    pub deleted: bool,
}

/// Get SQL for creating rename journal tables
pub fn get_table_sql() -> &'static str {
    "
    CREATE TABLE IF NOT EXISTS rename_sessions (
        id TEXT PRIMARY KEY,
        old_prefix TEXT NOT NULL,
        new_prefix TEXT NOT NULL,
        status TEXT NOT NULL DEFAULT 'copying',
        error TEXT,
        created_at INTEGER NOT NULL,
        updated_at INTEGER NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_rename_sessions_status ON rename_sessions(status);

    CREATE TABLE IF NOT EXISTS rename_items (
        session_id TEXT NOT NULL,
        source_key TEXT NOT NULL,
        dest_key TEXT NOT NULL,
        copied INTEGER NOT NULL DEFAULT 0,
        deleted INTEGER NOT NULL DEFAULT 0,
        PRIMARY KEY (session_id, source_key)
    );

    CREATE INDEX IF NOT EXISTS idx_rename_items_session ON rename_items(session_id);
    "
}

impl RenameJournal {
    /// Record a session and all of its planned moves in one transaction
    pub async fn create_session(
        &self,
        session: &RenameSession,
        items: &[RenameItem],
    ) -> DbResult<()> {
        let conn = self.conn.lock().await;

        conn.execute("BEGIN TRANSACTION", ()).await?;

        let inserted = async {
            conn.execute(
                "INSERT INTO rename_sessions
                 (id, old_prefix, new_prefix, status, error, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                turso::params![
                    session.id.clone(),
                    session.old_prefix.clone(),
                    session.new_prefix.clone(),
                    session.status.clone(),
                    session.error.clone(),
                    session.created_at,
                    session.updated_at,
                ],
            )
            .await?;

            for item in items {
                conn.execute(
                    "INSERT INTO rename_items (session_id, source_key, dest_key, copied, deleted)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    turso::params![
                        session.id.clone(),
                        item.source_key.clone(),
                        item.dest_key.clone(),
                        if item.copied { 1 } else { 0 },
                        if item.deleted { 1 } else { 0 },
                    ],
                )
                .await?;
            }
            Ok::<(), turso::Error>(())
        }
        .await;

        if let Err(e) = inserted {
            // Rollback on error
            let _ = conn.execute("ROLLBACK", ()).await;
            return Err(e.into());
        }

        conn.execute("COMMIT", ()).await?;
        Ok(())
    }

    pub async fn mark_copied(&self, session_id: &str, source_key: &str) -> DbResult<()> {
        let conn = self.conn.lock().await;
        conn.execute(
            "UPDATE rename_items SET copied = 1 WHERE session_id = ?1 AND source_key = ?2",
            turso::params![session_id, source_key],
        )
        .await?;
        Ok(())
    }

    pub async fn mark_deleted(&self, session_id: &str, source_key: &str) -> DbResult<()> {
        let conn = self.conn.lock().await;
        conn.execute(
            "UPDATE rename_items SET deleted = 1 WHERE session_id = ?1 AND source_key = ?2",
            turso::params![session_id, source_key],
        )
        .await?;
        Ok(())
    }

    /// Update rename session status
    pub async fn update_status(
        &self,
        session_id: &str,
        status: &str,
        error: Option<&str>,
    ) -> DbResult<()> {
        let conn = self.conn.lock().await;
        let now = chrono::Utc::now().timestamp();
        conn.execute(
            "UPDATE rename_sessions SET status = ?1, error = ?2, updated_at = ?3 WHERE id = ?4",
            turso::params![status, error, now, session_id],
        )
        .await?;
        Ok(())
    }

    /// Get rename session by ID
    pub async fn get_session(&self, session_id: &str) -> DbResult<Option<RenameSession>> {
        let conn = self.conn.lock().await;
        let mut rows = conn
            .query(
                "SELECT id, old_prefix, new_prefix, status, error, created_at, updated_at
                 FROM rename_sessions WHERE id = ?1",
                turso::params![session_id],
            )
            .await?;

        if let Some(row) = rows.next().await? {
            Ok(Some(RenameSession {
                id: row.get(0)?,
                old_prefix: row.get(1)?,
                new_prefix: row.get(2)?,
                status: row.get(3)?,
                error: row.get(4)?,
                created_at: row.get(5)?,
                updated_at: row.get(6)?,
            }))
        } else {
            Ok(None)
        }
    }

    pub async fn get_items(&self, session_id: &str) -> DbResult<Vec<RenameItem>> {
        let conn = self.conn.lock().await;
        let mut rows = conn
            .query(
                "SELECT source_key, dest_key, copied, deleted
                 FROM rename_items WHERE session_id = ?1
                 ORDER BY source_key",
                turso::params![session_id],
            )
            .await?;

        let mut items = Vec::new();
        while let Some(row) = rows.next().await? {
            items.push(RenameItem {
                source_key: row.get(0)?,
                dest_key: row.get(1)?,
                copied: row.get::<i64>(2)? != 0,
                deleted: row.get::<i64>(3)? != 0,
            });
        }
        Ok(items)
    }

    /// Sessions that never reached `success`, newest first
    pub async fn unfinished_sessions(&self) -> DbResult<Vec<RenameSession>> {
        let conn = self.conn.lock().await;
        let mut rows = conn
            .query(
                "SELECT id, old_prefix, new_prefix, status, error, created_at, updated_at
                 FROM rename_sessions
                 WHERE status != 'success'
                 ORDER BY updated_at DESC",
                (),
            )
            .await?;

        let mut sessions = Vec::new();
        while let Some(row) = rows.next().await? {
            sessions.push(RenameSession {
                id: row.get(0)?,
                old_prefix: row.get(1)?,
                new_prefix: row.get(2)?,
                status: row.get(3)?,
                error: row.get(4)?,
                created_at: row.get(5)?,
                updated_at: row.get(6)?,
            });
        }
        Ok(sessions)
    }

    pub async fn delete_session(&self, session_id: &str) -> DbResult<()> {
        let conn = self.conn.lock().await;
        conn.execute(
            "DELETE FROM rename_items WHERE session_id = ?1",
            turso::params![session_id],
        )
        .await?;
        conn.execute(
            "DELETE FROM rename_sessions WHERE id = ?1",
            turso::params![session_id],
        )
        .await?;
        Ok(())
    }
}
