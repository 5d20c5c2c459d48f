//! Error types shared by the store, the walker and the folder operations

use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

pub type DriveResult<T> = Result<T, DriveError>;

pub type StoreResult<T> = Result<T, StoreError>;

/// Failure reported by an [`ObjectStore`](crate::storage::ObjectStore) call.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("object not found: {0}")]
    NotFound(String),
    #[error("{op} failed for '{key}': {source}")]
    Transport {
        op: &'static str,
        key: String,
        #[source]
        source: BoxError,
    },
}

impl StoreError {
    pub fn transport(op: &'static str, key: &str, source: impl Into<BoxError>) -> Self {
        StoreError::Transport {
            op,
            key: key.to_string(),
            source: source.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}

#[derive(Debug, Error)]
pub enum DriveError {
    #[error("{0} is required")]
    ConfigMissing(&'static str),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("invalid prefix '{0}'")]
    InvalidPrefix(String),

    #[error("the new name must differ from the current one ('{0}')")]
    SamePrefix(String),

    #[error("invalid folder name '{0}'")]
    InvalidFolderName(String),

    #[error("folder not found or empty: {0}")]
    FolderNotFound(String),

    #[error("two files would be uploaded to the same key '{0}'")]
    DuplicateKey(String),

    #[error("{} of the selected items could not be deleted ({removed} objects removed)", .failed.len())]
    PartialFailure {
        failed: Vec<(String, String)>,
        removed: usize,
    },

    #[error("failed to read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("rename journal error: {0}")]
    Journal(#[source] BoxError),

    #[error("rename session not found: {0}")]
    SessionNotFound(String),
}

impl DriveError {
    pub(crate) fn io(path: impl AsRef<std::path::Path>, source: std::io::Error) -> Self {
        DriveError::Io {
            path: path.as_ref().display().to_string(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_failure_message_counts_failed_items() {
        let err = DriveError::PartialFailure {
            failed: vec![("a.txt".to_string(), "boom".to_string())],
            removed: 3,
        };
        assert_eq!(
            err.to_string(),
            "1 of the selected items could not be deleted (3 objects removed)"
        );
    }

    #[test]
    fn store_error_converts_into_drive_error() {
        let err: DriveError = StoreError::NotFound("docs/x.txt".to_string()).into();
        assert!(matches!(err, DriveError::Store(StoreError::NotFound(_))));
        assert_eq!(err.to_string(), "object not found: docs/x.txt");
    }
}
