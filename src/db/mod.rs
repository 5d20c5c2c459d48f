use std::path::Path;
use tokio::sync::Mutex;
use turso::{Builder, Connection};

// Custom error type for database operations
pub(crate) type DbResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

pub mod rename_sessions;

pub use rename_sessions::{RenameItem, RenameSession, RenameStatus};

/// Durable record of folder renames, so an interrupted rename can be finished.
pub struct RenameJournal {
    // Serialize access; turso connections are not safe to share concurrently
    conn: Mutex<Connection>,
}

impl RenameJournal {
    /// Open (or create) a journal database at `db_path`
    pub async fn open(db_path: &Path) -> DbResult<Self> {
        let path = db_path
            .to_str()
            .ok_or("Journal path is not valid UTF-8")?;
        Self::open_with(path).await
    }

    /// Journal that lives only as long as the process
    pub async fn open_in_memory() -> DbResult<Self> {
        Self::open_with(":memory:").await
    }

    async fn open_with(path: &str) -> DbResult<Self> {
        let db = Builder::new_local(path).build().await?;
        let conn = db.connect()?;

        conn.execute_batch(rename_sessions::get_table_sql()).await?;

        Ok(RenameJournal {
            conn: Mutex::new(conn),
        })
    }
}
