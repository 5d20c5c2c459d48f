//! Folder operations over a flat key space
//!
//! - `list`: one-level listing and connection check
//! - `create`: placeholder-backed folder creation
//! - `rename`: copy + delete emulation, optionally journaled
//! - `delete`: file, folder and multi-item delete

mod create;
mod delete;
mod list;
mod rename;

pub use create::{create_folder, sanitize_folder_name, FOLDER_PLACEHOLDER};
pub use delete::{delete_entries, delete_entry, BulkDeleteReport, DeleteReport, DeleteTarget};
pub use list::{list_folder, verify_connection, FolderEntry, FolderListing};
pub use rename::{rename_folder, rename_folder_journaled, resume_rename, RenameOutcome};
