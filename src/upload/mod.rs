//! Directory upload
//!
//! - `tree`: directory/file handles (local filesystem implementation)
//! - `walker`: key planning and the upload loop

mod tree;
mod walker;

pub use tree::{DirectoryHandle, FileHandle, LocalDirectory, LocalFile, TreeEntry};
pub use walker::{upload_directory, upload_file};
