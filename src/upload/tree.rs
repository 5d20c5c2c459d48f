//! Directory and file handles the upload walker enumerates

use crate::error::{DriveError, DriveResult};
use crate::storage::ObjectBody;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

pub enum TreeEntry {
    File(Box<dyn FileHandle>),
    Directory(Box<dyn DirectoryHandle>),
}

#[async_trait]
pub trait DirectoryHandle: Send + Sync {
    fn name(&self) -> &str;

    /// Direct children, in the order they should be uploaded.
    async fn entries(&self) -> DriveResult<Vec<TreeEntry>>;
}

#[async_trait]
pub trait FileHandle: Send + Sync {
    fn name(&self) -> &str;

    fn content_type(&self) -> String {
        mime_guess::from_path(self.name())
            .first_or_octet_stream()
            .essence_str()
            .to_string()
    }

    /// The payload to upload. Implementations backed by a local file should
    /// return `ObjectBody::File` so the store can stream it.
    async fn body(&self) -> DriveResult<ObjectBody>;
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("unknown")
        .to_string()
}

/// A directory on the local filesystem
#[derive(Debug, Clone)]
pub struct LocalDirectory {
    path: PathBuf,
    name: String,
}

impl LocalDirectory {
    pub fn open(path: impl Into<PathBuf>) -> DriveResult<Self> {
        let path = path.into();
        if !path.is_dir() {
            return Err(DriveError::io(
                &path,
                std::io::Error::new(std::io::ErrorKind::NotFound, "not a directory"),
            ));
        }
        let name = file_name_of(&path);
        Ok(LocalDirectory { path, name })
    }
}

#[async_trait]
impl DirectoryHandle for LocalDirectory {
    fn name(&self) -> &str {
        &self.name
    }

    async fn entries(&self) -> DriveResult<Vec<TreeEntry>> {
        let mut entries = tokio::fs::read_dir(&self.path)
            .await
            .map_err(|e| DriveError::io(&self.path, e))?;

        let mut paths = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| DriveError::io(&self.path, e))?
        {
            paths.push(entry.path());
        }
        // read_dir order is platform dependent
        paths.sort();

        let mut children = Vec::with_capacity(paths.len());
        for path in paths {
            let metadata = tokio::fs::metadata(&path)
                .await
                .map_err(|e| DriveError::io(&path, e))?;
            let name = file_name_of(&path);

            if metadata.is_file() {
                children.push(TreeEntry::File(Box::new(LocalFile { path, name })));
            } else if metadata.is_dir() {
                children.push(TreeEntry::Directory(Box::new(LocalDirectory { path, name })));
            }
        }

        Ok(children)
    }
}

/// A file on the local filesystem
#[derive(Debug, Clone)]
pub struct LocalFile {
    path: PathBuf,
    name: String,
}

impl LocalFile {
    pub fn open(path: impl Into<PathBuf>) -> DriveResult<Self> {
        let path = path.into();
        if !path.is_file() {
            return Err(DriveError::io(
                &path,
                std::io::Error::new(std::io::ErrorKind::NotFound, "not a file"),
            ));
        }
        let name = file_name_of(&path);
        Ok(LocalFile { path, name })
    }
}

#[async_trait]
impl FileHandle for LocalFile {
    fn name(&self) -> &str {
        &self.name
    }

    async fn body(&self) -> DriveResult<ObjectBody> {
        let metadata = tokio::fs::metadata(&self.path)
            .await
            .map_err(|e| DriveError::io(&self.path, e))?;
        Ok(ObjectBody::File {
            path: self.path.clone(),
            size: metadata.len(),
        })
    }
}
