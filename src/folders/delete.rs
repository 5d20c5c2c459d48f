//! File, folder and multi-item delete

use crate::error::{DriveError, DriveResult};
use crate::prefix::normalize_folder_prefix;
use crate::storage::ObjectStore;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteTarget {
    pub key: String,
    pub is_folder: bool,
}

impl DeleteTarget {
    pub fn file(key: impl Into<String>) -> Self {
        DeleteTarget {
            key: key.into(),
            is_folder: false,
        }
    }

    pub fn folder(prefix: impl Into<String>) -> Self {
        DeleteTarget {
            key: prefix.into(),
            is_folder: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeleteReport {
    /// Objects removed, not counting the folder placeholder
    pub deleted: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BulkDeleteReport {
    pub removed: usize,
    /// `(key, error message)` of every item that could not be deleted
    pub failed: Vec<(String, String)>,
}

impl BulkDeleteReport {
    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }

    /// `PartialFailure` when any item failed
    pub fn into_result(self) -> DriveResult<usize> {
        if self.failed.is_empty() {
            Ok(self.removed)
        } else {
            Err(DriveError::PartialFailure {
                failed: self.failed,
                removed: self.removed,
            })
        }
    }
}

/// Delete one file, or every object under a folder prefix.
///
/// For a folder, objects are deleted one by one and the first failure aborts.
/// The placeholder object at the prefix itself is removed on a best-effort
/// basis afterwards.
pub async fn delete_entry<S: ObjectStore + ?Sized>(
    store: &S,
    key: &str,
    is_folder: bool,
) -> DriveResult<DeleteReport> {
    let mut deleted = 0;
    delete_counted(store, key, is_folder, &mut deleted).await?;
    Ok(DeleteReport { deleted })
}

/// Same as `delete_entry`, but `deleted` keeps counting up to the failure so
/// a partly deleted folder is still accounted for.
async fn delete_counted<S: ObjectStore + ?Sized>(
    store: &S,
    key: &str,
    is_folder: bool,
    deleted: &mut usize,
) -> DriveResult<()> {
    if key.trim().is_empty() {
        return Err(DriveError::InvalidPrefix(key.to_string()));
    }

    if !is_folder {
        store.delete_object(key).await?;
        *deleted += 1;
        info!("delete_file: {}", key);
        return Ok(());
    }

    let folder = normalize_folder_prefix(key);
    if folder.is_empty() {
        // Refuse to wipe the whole bucket through a "/" key
        return Err(DriveError::InvalidPrefix(key.to_string()));
    }

    let listed = store.list_objects(&folder, None).await?;
    let before = *deleted;
    for entry in listed.items.iter().filter(|e| e.key != folder) {
        if let Err(e) = store.delete_object(&entry.key).await {
            warn!(
                "delete_folder_partial: {} objects={} failed_at={}",
                folder,
                *deleted - before,
                entry.key
            );
            return Err(e.into());
        }
        *deleted += 1;
    }

    match store.delete_object(&folder).await {
        Ok(()) => {}
        Err(e) if e.is_not_found() => debug!("delete_folder_marker_missing: {}", folder),
        Err(e) => warn!("delete_folder_marker_failed: {} {}", folder, e),
    }

    info!("delete_folder: {} objects={}", folder, *deleted - before);
    Ok(())
}

/// Delete several selected items, continuing past failures. `removed`
/// includes objects deleted from a folder that failed partway.
pub async fn delete_entries<S: ObjectStore + ?Sized>(
    store: &S,
    targets: &[DeleteTarget],
) -> BulkDeleteReport {
    let mut report = BulkDeleteReport::default();

    for target in targets {
        if let Err(e) =
            delete_counted(store, &target.key, target.is_folder, &mut report.removed).await
        {
            warn!(
                "delete_item_failed: {} folder={} error={}",
                target.key, target.is_folder, e
            );
            report.failed.push((target.key.clone(), e.to_string()));
        }
    }

    info!(
        "delete_batch: items={} removed={} failed={}",
        targets.len(),
        report.removed,
        report.failed.len()
    );
    report
}
