//! Recursive directory upload

use super::tree::{DirectoryHandle, FileHandle, TreeEntry};
use crate::config::UploadOptions;
use crate::error::{DriveError, DriveResult};
use crate::prefix::{child_folder_prefix, file_key, normalize_folder_prefix};
use crate::progress::{ProgressCallback, ProgressTracker};
use crate::storage::ObjectStore;
use futures_util::stream::{self, StreamExt};
use log::{debug, info, warn};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// A file with the key it will be written to
pub(crate) struct PlannedUpload {
    pub(crate) file: Box<dyn FileHandle>,
    pub(crate) key: String,
}

enum Work {
    File(Box<dyn FileHandle>, String),
    Directory(Box<dyn DirectoryHandle>, String),
}

/// Read-ahead pass: walk the whole tree depth-first and compute every key.
/// The length of the plan is the progress denominator.
///
/// Fails with `DuplicateKey` when two files collapse onto the same key
/// (`a/x.txt` and `a/a/x.txt` under a directory named `a`), before anything
/// is uploaded.
pub(crate) async fn plan_directory(
    root: &dyn DirectoryHandle,
    target_prefix: &str,
) -> DriveResult<Vec<PlannedUpload>> {
    let base = child_folder_prefix(&normalize_folder_prefix(target_prefix), root.name());
    debug!("upload_plan: {} -> {}", root.name(), base);

    let mut plan = Vec::new();
    let mut seen = HashSet::new();
    let mut stack: Vec<Work> = Vec::new();
    push_children(&mut stack, root.entries().await?, &base);

    // Children are pushed in reverse so popping yields pre-order
    while let Some(work) = stack.pop() {
        match work {
            Work::File(file, prefix) => {
                let key = file_key(&prefix, file.name());
                if !seen.insert(key.clone()) {
                    warn!("upload_plan_duplicate_key: {} in {}", key, root.name());
                    return Err(DriveError::DuplicateKey(key));
                }
                plan.push(PlannedUpload { file, key });
            }
            Work::Directory(dir, prefix) => {
                let entries = dir.entries().await?;
                push_children(&mut stack, entries, &prefix);
            }
        }
    }

    Ok(plan)
}

fn push_children(stack: &mut Vec<Work>, entries: Vec<TreeEntry>, prefix: &str) {
    for entry in entries.into_iter().rev() {
        match entry {
            TreeEntry::File(file) => stack.push(Work::File(file, prefix.to_string())),
            TreeEntry::Directory(dir) => {
                let child = child_folder_prefix(prefix, dir.name());
                stack.push(Work::Directory(dir, child));
            }
        }
    }
}

/// A callback that panicked leaves the counter intact, so keep reporting.
fn lock_tracker(tracker: &Mutex<ProgressTracker>) -> MutexGuard<'_, ProgressTracker> {
    tracker.lock().unwrap_or_else(PoisonError::into_inner)
}

async fn put_file<S: ObjectStore + ?Sized>(
    store: &S,
    file: &dyn FileHandle,
    key: &str,
) -> DriveResult<u64> {
    let body = file.body().await?;
    let size = body.size();
    store.put_object(key, body, &file.content_type()).await?;
    Ok(size)
}

/// `Ok(None)` when the walk was aborted before this file started.
async fn upload_planned<S: ObjectStore + ?Sized>(
    store: &S,
    index: usize,
    item: PlannedUpload,
    tracker: &Mutex<ProgressTracker>,
    aborted: &AtomicBool,
) -> DriveResult<Option<(usize, String)>> {
    if aborted.load(Ordering::SeqCst) {
        debug!("upload_file_skipped: {}", item.key);
        return Ok(None);
    }

    match put_file(store, item.file.as_ref(), &item.key).await {
        Ok(size) => {
            debug!("upload_file_done: {} size={}", item.key, size);
            lock_tracker(tracker).file_done(item.file.name());
            Ok(Some((index, item.key)))
        }
        Err(e) => {
            aborted.store(true, Ordering::SeqCst);
            Err(e)
        }
    }
}

/// Upload every file under `root` and return the keys written, in
/// traversal order. The first failed upload aborts the walk: no further
/// uploads start, the ones already in flight are allowed to finish, and
/// files already uploaded stay in the bucket.
pub async fn upload_directory<S: ObjectStore + ?Sized>(
    store: &S,
    root: &dyn DirectoryHandle,
    target_prefix: &str,
    options: &UploadOptions,
    on_progress: Option<ProgressCallback>,
) -> DriveResult<Vec<String>> {
    let plan = plan_directory(root, target_prefix).await?;
    let total = plan.len();
    let concurrency = options.concurrency.max(1);
    info!(
        "upload_dir_start: {} -> '{}' files={} concurrency={}",
        root.name(),
        target_prefix,
        total,
        concurrency
    );

    let tracker = Mutex::new(ProgressTracker::new(total, on_progress));
    lock_tracker(&tracker).start();
    let aborted = AtomicBool::new(false);

    let mut uploads = stream::iter(plan.into_iter().enumerate())
        .map(|(index, item)| upload_planned(store, index, item, &tracker, &aborted))
        .buffer_unordered(concurrency);

    let mut done = Vec::with_capacity(total);
    let mut first_error = None;
    while let Some(result) = uploads.next().await {
        match result {
            Ok(Some(uploaded)) => done.push(uploaded),
            Ok(None) => {}
            Err(e) => {
                first_error.get_or_insert(e);
            }
        }
    }

    if let Some(e) = first_error {
        warn!(
            "upload_dir_failed: {} after {} of {} files: {}",
            root.name(),
            done.len(),
            total,
            e
        );
        return Err(e);
    }

    done.sort_by_key(|(index, _)| *index);
    let keys: Vec<String> = done.into_iter().map(|(_, key)| key).collect();
    info!("upload_dir_done: {} files={}", root.name(), keys.len());
    Ok(keys)
}

/// Upload a single file into `prefix`, returning its key.
pub async fn upload_file<S: ObjectStore + ?Sized>(
    store: &S,
    file: &dyn FileHandle,
    prefix: &str,
) -> DriveResult<String> {
    let key = file_key(prefix, file.name());
    let size = put_file(store, file, &key).await?;
    info!("upload_file: {} size={}", key, size);
    Ok(key)
}
