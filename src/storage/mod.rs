//! Object store abstraction
//!
//! - `types`: listing data types
//! - `memory`: in-process store used by tests and offline callers
//!
//! The R2/S3 implementation lives in [`crate::r2`].

mod memory;
mod types;

pub use memory::{MemoryStore, StoreCall};
pub use types::{ListObjectsResult, ObjectBody, StorageEntry};

use crate::error::StoreResult;
use async_trait::async_trait;

/// Page size used for every listing request
pub const MAX_KEYS: i32 = 1000;

/// The flat key/value operations the folder logic is built on.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// List every object under `prefix`, following continuation tokens.
    /// With a delimiter, keys below the next delimiter are folded into
    /// `common_prefixes`.
    async fn list_objects(
        &self,
        prefix: &str,
        delimiter: Option<&str>,
    ) -> StoreResult<ListObjectsResult>;

    /// Single listing request returning at most `max_keys` objects.
    async fn list_page(&self, prefix: &str, max_keys: i32) -> StoreResult<ListObjectsResult>;

    async fn put_object(&self, key: &str, body: ObjectBody, content_type: &str) -> StoreResult<()>;

    async fn copy_object(&self, source_key: &str, dest_key: &str) -> StoreResult<()>;

    async fn delete_object(&self, key: &str) -> StoreResult<()>;
}
