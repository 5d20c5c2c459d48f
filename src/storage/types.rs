use crate::prefix::{entry_name, DELIMITER};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageEntry {
    pub key: String,
    pub name: String,
    pub size: i64,
    pub last_modified: String,
    pub is_folder: bool,
}

impl StorageEntry {
    pub fn object(key: impl Into<String>, size: i64, last_modified: impl Into<String>) -> Self {
        let key = key.into();
        StorageEntry {
            name: entry_name(&key),
            is_folder: key.ends_with(DELIMITER),
            key,
            size,
            last_modified: last_modified.into(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListObjectsResult {
    pub items: Vec<StorageEntry>,
    pub common_prefixes: Vec<String>,
}

impl ListObjectsResult {
    pub fn keys(&self) -> Vec<String> {
        self.items.iter().map(|item| item.key.clone()).collect()
    }
}

/// Payload of a PUT. Local files are streamed from disk by the store
/// instead of being buffered up front.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObjectBody {
    Bytes(Vec<u8>),
    File { path: PathBuf, size: u64 },
}

impl ObjectBody {
    pub fn size(&self) -> u64 {
        match self {
            ObjectBody::Bytes(bytes) => bytes.len() as u64,
            ObjectBody::File { size, .. } => *size,
        }
    }
}

impl From<Vec<u8>> for ObjectBody {
    fn from(bytes: Vec<u8>) -> Self {
        ObjectBody::Bytes(bytes)
    }
}
