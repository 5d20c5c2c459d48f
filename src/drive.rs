//! `Drive`: the folder-level API handed to a UI or HTTP layer

use crate::config::{R2Config, UploadOptions};
use crate::db::{RenameJournal, RenameSession};
use crate::error::{DriveError, DriveResult};
use crate::folders::{
    self, BulkDeleteReport, DeleteReport, DeleteTarget, FolderListing, RenameOutcome,
};
use crate::progress::ProgressCallback;
use crate::r2::R2Store;
use crate::storage::ObjectStore;
use crate::upload::{self, DirectoryHandle, FileHandle};

pub struct Drive<S = R2Store> {
    store: S,
    journal: Option<RenameJournal>,
    upload_options: UploadOptions,
}

impl Drive<R2Store> {
    /// Build from `R2_*` environment variables. Missing credentials fail here,
    /// before any request is sent.
    pub fn from_env() -> DriveResult<Self> {
        Self::connect(&R2Config::from_env()?)
    }

    pub fn connect(config: &R2Config) -> DriveResult<Self> {
        Ok(Drive::new(R2Store::from_config(config)?))
    }
}

impl<S: ObjectStore> Drive<S> {
    pub fn new(store: S) -> Self {
        Drive {
            store,
            journal: None,
            upload_options: UploadOptions::default(),
        }
    }

    /// Record renames so an interrupted one can be finished with `resume_rename`.
    pub fn with_journal(mut self, journal: RenameJournal) -> Self {
        self.journal = Some(journal);
        self
    }

    pub fn with_upload_options(mut self, options: UploadOptions) -> Self {
        self.upload_options = options;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub async fn upload_directory(
        &self,
        root: &dyn DirectoryHandle,
        target_prefix: &str,
        on_progress: Option<ProgressCallback>,
    ) -> DriveResult<Vec<String>> {
        upload::upload_directory(
            &self.store,
            root,
            target_prefix,
            &self.upload_options,
            on_progress,
        )
        .await
    }

    pub async fn upload_file(&self, file: &dyn FileHandle, prefix: &str) -> DriveResult<String> {
        upload::upload_file(&self.store, file, prefix).await
    }

    pub async fn rename_folder(
        &self,
        old_prefix: &str,
        new_prefix: &str,
    ) -> DriveResult<RenameOutcome> {
        match &self.journal {
            Some(journal) => {
                folders::rename_folder_journaled(&self.store, journal, old_prefix, new_prefix).await
            }
            None => folders::rename_folder(&self.store, old_prefix, new_prefix).await,
        }
    }

    pub async fn resume_rename(&self, session_id: &str) -> DriveResult<RenameOutcome> {
        let journal = self.journal()?;
        folders::resume_rename(&self.store, journal, session_id).await
    }

    /// Journaled renames that have not completed
    pub async fn pending_renames(&self) -> DriveResult<Vec<RenameSession>> {
        self.journal()?
            .unfinished_sessions()
            .await
            .map_err(DriveError::Journal)
    }

    pub async fn delete_entry(&self, key: &str, is_folder: bool) -> DriveResult<DeleteReport> {
        folders::delete_entry(&self.store, key, is_folder).await
    }

    pub async fn delete_entries(&self, targets: &[DeleteTarget]) -> BulkDeleteReport {
        folders::delete_entries(&self.store, targets).await
    }

    pub async fn create_folder(&self, name: &str, prefix: &str) -> DriveResult<String> {
        folders::create_folder(&self.store, name, prefix).await
    }

    pub async fn list_folder(&self, prefix: &str) -> DriveResult<FolderListing> {
        folders::list_folder(&self.store, prefix).await
    }

    pub async fn verify_connection(&self) -> DriveResult<bool> {
        folders::verify_connection(&self.store).await
    }

    fn journal(&self) -> DriveResult<&RenameJournal> {
        self.journal
            .as_ref()
            .ok_or_else(|| DriveError::Journal("no rename journal configured".into()))
    }
}
