//! Folder-style file management for Cloudflare R2 and other S3-compatible
//! buckets: recursive directory upload with progress, folder creation,
//! rename (copy + delete) and bulk delete.
//!
//! The crate only logs through the `log` facade; installing a logger is up to
//! the embedding application.

pub mod config;
pub mod db;
mod drive;
pub mod error;
pub mod folders;
pub mod prefix;
pub mod progress;
pub mod r2;
pub mod storage;
pub mod upload;

pub use config::{R2Config, UploadOptions};
pub use db::{RenameJournal, RenameSession};
pub use drive::Drive;
pub use error::{DriveError, DriveResult, StoreError};
pub use folders::{BulkDeleteReport, DeleteReport, DeleteTarget, FolderListing, RenameOutcome};
pub use progress::{ProgressCallback, UploadProgress};
pub use r2::{MultipartSettings, R2Store};
pub use storage::{ListObjectsResult, MemoryStore, ObjectBody, ObjectStore, StorageEntry};
pub use upload::{DirectoryHandle, FileHandle, LocalDirectory, LocalFile};
