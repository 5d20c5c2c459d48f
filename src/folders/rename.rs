//! Folder rename emulated with per-object copy + delete
//!
//! Not atomic. A failed copy leaves objects under both prefixes; a failed
//! delete leaves duplicates. Nothing is rolled back or retried. With a
//! [`RenameJournal`] every step is recorded so `resume_rename` can finish the
//! job later.

use crate::db::{RenameItem, RenameJournal, RenameSession, RenameStatus};
use crate::error::{DriveError, DriveResult};
use crate::prefix::{normalize_folder_prefix, rebase_key};
use crate::storage::ObjectStore;
use chrono::Utc;
use log::{error, info, warn};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenameOutcome {
    pub session_id: Option<String>,
    pub old_prefix: String,
    pub new_prefix: String,
    pub objects: usize,
}

/// Normalize both prefixes and reject renames that cannot work.
/// Runs before any store call.
pub(crate) fn validate_rename(old_prefix: &str, new_prefix: &str) -> DriveResult<(String, String)> {
    let old = normalize_folder_prefix(old_prefix);
    let new = normalize_folder_prefix(new_prefix);

    if old.is_empty() {
        return Err(DriveError::InvalidPrefix(old_prefix.to_string()));
    }
    if new.is_empty() {
        return Err(DriveError::InvalidPrefix(new_prefix.to_string()));
    }
    if old == new {
        return Err(DriveError::SamePrefix(old));
    }
    // Copies would land inside the folder being renamed
    if new.starts_with(&old) {
        return Err(DriveError::InvalidPrefix(new));
    }
    Ok((old, new))
}

async fn plan_rename<S: ObjectStore + ?Sized>(
    store: &S,
    old: &str,
    new: &str,
) -> DriveResult<Vec<RenameItem>> {
    let listed = store.list_objects(old, None).await?;
    if listed.items.is_empty() {
        return Err(DriveError::FolderNotFound(old.to_string()));
    }

    Ok(listed
        .items
        .into_iter()
        .filter_map(|entry| {
            let dest_key = rebase_key(&entry.key, old, new)?;
            Some(RenameItem {
                source_key: entry.key,
                dest_key,
                copied: false,
                deleted: false,
            })
        })
        .collect())
}

fn journal_err(e: Box<dyn std::error::Error + Send + Sync>) -> DriveError {
    DriveError::Journal(e)
}

/// Copy everything not yet copied, then delete everything not yet deleted.
async fn apply_moves<S: ObjectStore + ?Sized>(
    store: &S,
    items: &[RenameItem],
    journal: Option<(&RenameJournal, &str)>,
) -> DriveResult<()> {
    for item in items.iter().filter(|i| !i.copied) {
        store.copy_object(&item.source_key, &item.dest_key).await?;
        if let Some((journal, id)) = journal {
            journal
                .mark_copied(id, &item.source_key)
                .await
                .map_err(journal_err)?;
        }
    }

    if let Some((journal, id)) = journal {
        journal
            .update_status(id, &RenameStatus::Deleting.to_string(), None)
            .await
            .map_err(journal_err)?;
    }

    for item in items.iter().filter(|i| !i.deleted) {
        store.delete_object(&item.source_key).await?;
        if let Some((journal, id)) = journal {
            journal
                .mark_deleted(id, &item.source_key)
                .await
                .map_err(journal_err)?;
        }
    }

    Ok(())
}

/// Rename `old_prefix` to `new_prefix` without a journal (best effort).
pub async fn rename_folder<S: ObjectStore + ?Sized>(
    store: &S,
    old_prefix: &str,
    new_prefix: &str,
) -> DriveResult<RenameOutcome> {
    let (old, new) = validate_rename(old_prefix, new_prefix)?;
    info!("rename_start: {} -> {}", old, new);

    let items = plan_rename(store, &old, &new).await?;
    if let Err(e) = apply_moves(store, &items, None).await {
        error!("rename_failed: {} -> {} error={}", old, new, e);
        return Err(e);
    }

    info!("rename_done: {} -> {} objects={}", old, new, items.len());
    Ok(RenameOutcome {
        session_id: None,
        old_prefix: old,
        new_prefix: new,
        objects: items.len(),
    })
}

async fn run_journaled<S: ObjectStore + ?Sized>(
    store: &S,
    journal: &RenameJournal,
    session_id: &str,
    items: &[RenameItem],
) -> DriveResult<()> {
    match apply_moves(store, items, Some((journal, session_id))).await {
        Ok(()) => {
            journal
                .update_status(session_id, &RenameStatus::Success.to_string(), None)
                .await
                .map_err(journal_err)?;
            Ok(())
        }
        Err(e) => {
            error!("rename_failed: session={} error={}", session_id, e);
            let message = e.to_string();
            if let Err(db_err) = journal
                .update_status(session_id, &RenameStatus::Error.to_string(), Some(&message))
                .await
            {
                warn!("rename_status_not_saved: {} {}", session_id, db_err);
            }
            Err(e)
        }
    }
}

/// Rename with every planned move recorded in `journal` before the first copy.
pub async fn rename_folder_journaled<S: ObjectStore + ?Sized>(
    store: &S,
    journal: &RenameJournal,
    old_prefix: &str,
    new_prefix: &str,
) -> DriveResult<RenameOutcome> {
    let (old, new) = validate_rename(old_prefix, new_prefix)?;
    let items = plan_rename(store, &old, &new).await?;

    let now = Utc::now().timestamp();
    let session = RenameSession {
        id: uuid::Uuid::new_v4().to_string(),
        old_prefix: old.clone(),
        new_prefix: new.clone(),
        status: RenameStatus::Copying.to_string(),
        error: None,
        created_at: now,
        updated_at: now,
    };
    journal
        .create_session(&session, &items)
        .await
        .map_err(journal_err)?;
    info!(
        "rename_start: {} -> {} session={} objects={}",
        old,
        new,
        session.id,
        items.len()
    );

    run_journaled(store, journal, &session.id, &items).await?;

    info!("rename_done: session={}", session.id);
    Ok(RenameOutcome {
        session_id: Some(session.id),
        old_prefix: old,
        new_prefix: new,
        objects: items.len(),
    })
}

/// Finish an interrupted journaled rename, skipping steps already done.
pub async fn resume_rename<S: ObjectStore + ?Sized>(
    store: &S,
    journal: &RenameJournal,
    session_id: &str,
) -> DriveResult<RenameOutcome> {
    let session = journal
        .get_session(session_id)
        .await
        .map_err(journal_err)?
        .ok_or_else(|| DriveError::SessionNotFound(session_id.to_string()))?;
    let items = journal.get_items(session_id).await.map_err(journal_err)?;

    let outcome = RenameOutcome {
        session_id: Some(session.id.clone()),
        old_prefix: session.old_prefix.clone(),
        new_prefix: session.new_prefix.clone(),
        objects: items.len(),
    };

    if RenameStatus::from(session.status.clone()) == RenameStatus::Success {
        return Ok(outcome);
    }

    let pending = items.iter().filter(|i| !i.deleted).count();
    info!(
        "rename_resume: session={} {} -> {} pending={}",
        session.id, session.old_prefix, session.new_prefix, pending
    );
    journal
        .update_status(session_id, &RenameStatus::Copying.to_string(), None)
        .await
        .map_err(journal_err)?;

    run_journaled(store, journal, session_id, &items).await?;

    info!("rename_done: session={}", session.id);
    Ok(outcome)
}
