//! In-process object store with a call log and failure injection

use super::types::{ListObjectsResult, ObjectBody, StorageEntry};
use super::ObjectStore;
use crate::error::{StoreError, StoreResult};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// One call made against a [`MemoryStore`]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StoreCall {
    List { prefix: String },
    Put { key: String },
    Copy { source: String, dest: String },
    Delete { key: String },
}

/// Every critical section is a single map operation, so a poisoned lock is
/// still consistent and gets recovered.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug, Clone)]
struct StoredObject {
    body: Vec<u8>,
    content_type: String,
    last_modified: String,
}

#[derive(Default)]
pub struct MemoryStore {
    objects: Mutex<BTreeMap<String, StoredObject>>,
    calls: Mutex<Vec<StoreCall>>,
    failures: Mutex<HashSet<StoreCall>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an object without recording a call.
    pub fn insert(&self, key: &str, body: impl Into<Vec<u8>>) {
        lock(&self.objects).insert(
            key.to_string(),
            StoredObject {
                body: body.into(),
                content_type: "application/octet-stream".to_string(),
                last_modified: Utc::now().to_rfc3339(),
            },
        );
    }

    pub fn keys(&self) -> Vec<String> {
        lock(&self.objects).keys().cloned().collect()
    }

    pub fn contains(&self, key: &str) -> bool {
        lock(&self.objects).contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        lock(&self.objects).get(key).map(|o| o.body.clone())
    }

    pub fn content_type(&self, key: &str) -> Option<String> {
        lock(&self.objects)
            .get(key)
            .map(|o| o.content_type.clone())
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        lock(&self.calls).clone()
    }

    /// Make every future call equal to `call` fail with a transport error.
    pub fn inject_failure(&self, call: StoreCall) {
        lock(&self.failures).insert(call);
    }

    fn record(&self, call: StoreCall) -> StoreResult<()> {
        lock(&self.calls).push(call.clone());
        if lock(&self.failures).contains(&call) {
            let (op, key) = match &call {
                StoreCall::List { prefix } => ("list_objects", prefix.clone()),
                StoreCall::Put { key } => ("put_object", key.clone()),
                StoreCall::Copy { source, .. } => ("copy_object", source.clone()),
                StoreCall::Delete { key } => ("delete_object", key.clone()),
            };
            return Err(StoreError::transport(op, &key, "injected failure"));
        }
        Ok(())
    }

    fn collect(&self, prefix: &str, delimiter: Option<&str>, limit: usize) -> ListObjectsResult {
        let objects = lock(&self.objects);
        let mut result = ListObjectsResult::default();

        for (key, obj) in objects.range(prefix.to_string()..) {
            if !key.starts_with(prefix) {
                break;
            }
            if result.items.len() >= limit {
                break;
            }
            let rest = &key[prefix.len()..];
            if let Some(d) = delimiter.filter(|d| !d.is_empty()) {
                if let Some(idx) = rest.find(d) {
                    let common = format!("{}{}", prefix, &rest[..idx + d.len()]);
                    if !result.common_prefixes.contains(&common) {
                        result.common_prefixes.push(common);
                    }
                    continue;
                }
            }
            result.items.push(StorageEntry::object(
                key.clone(),
                obj.body.len() as i64,
                obj.last_modified.clone(),
            ));
        }

        result
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn list_objects(
        &self,
        prefix: &str,
        delimiter: Option<&str>,
    ) -> StoreResult<ListObjectsResult> {
        self.record(StoreCall::List {
            prefix: prefix.to_string(),
        })?;
        Ok(self.collect(prefix, delimiter, usize::MAX))
    }

    async fn list_page(&self, prefix: &str, max_keys: i32) -> StoreResult<ListObjectsResult> {
        self.record(StoreCall::List {
            prefix: prefix.to_string(),
        })?;
        Ok(self.collect(prefix, None, max_keys.max(0) as usize))
    }

    async fn put_object(&self, key: &str, body: ObjectBody, content_type: &str) -> StoreResult<()> {
        self.record(StoreCall::Put {
            key: key.to_string(),
        })?;
        let body = match body {
            ObjectBody::Bytes(bytes) => bytes,
            ObjectBody::File { path, .. } => tokio::fs::read(&path)
                .await
                .map_err(|e| StoreError::transport("put_object", key, e))?,
        };
        lock(&self.objects).insert(
            key.to_string(),
            StoredObject {
                body,
                content_type: content_type.to_string(),
                last_modified: Utc::now().to_rfc3339(),
            },
        );
        Ok(())
    }

    async fn copy_object(&self, source_key: &str, dest_key: &str) -> StoreResult<()> {
        self.record(StoreCall::Copy {
            source: source_key.to_string(),
            dest: dest_key.to_string(),
        })?;
        let mut objects = lock(&self.objects);
        let mut copy = objects
            .get(source_key)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(source_key.to_string()))?;
        copy.last_modified = Utc::now().to_rfc3339();
        objects.insert(dest_key.to_string(), copy);
        Ok(())
    }

    async fn delete_object(&self, key: &str) -> StoreResult<()> {
        self.record(StoreCall::Delete {
            key: key.to_string(),
        })?;
        // S3 semantics: deleting a missing key succeeds
        lock(&self.objects).remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn delimiter_listing_folds_nested_keys() {
        let store = MemoryStore::new();
        store.insert("docs/a.txt", "a");
        store.insert("docs/sub/b.txt", "b");
        store.insert("docs/sub/c.txt", "c");
        store.insert("other.txt", "o");

        let flat = store.list_objects("docs/", None).await.unwrap();
        assert_eq!(flat.keys(), vec!["docs/a.txt", "docs/sub/b.txt", "docs/sub/c.txt"]);

        let level = store.list_objects("docs/", Some("/")).await.unwrap();
        assert_eq!(level.keys(), vec!["docs/a.txt"]);
        assert_eq!(level.common_prefixes, vec!["docs/sub/"]);
    }

    #[tokio::test]
    async fn injected_failure_is_recorded_and_returned() {
        let store = MemoryStore::new();
        store.inject_failure(StoreCall::Put {
            key: "x".to_string(),
        });

        let err = store.put_object("x", vec![1].into(), "text/plain").await.unwrap_err();
        assert!(!err.is_not_found());
        assert!(!store.contains("x"));
        assert_eq!(store.calls().len(), 1);
    }

    #[tokio::test]
    async fn file_body_is_read_from_disk() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("report.pdf");
        std::fs::write(&path, "pdf").unwrap();

        let store = MemoryStore::new();
        let body = ObjectBody::File { path, size: 3 };
        store.put_object("docs/report.pdf", body, "application/pdf").await.unwrap();

        assert_eq!(store.get("docs/report.pdf").unwrap(), b"pdf".to_vec());
        assert_eq!(store.content_type("docs/report.pdf").unwrap(), "application/pdf");
    }

    #[test]
    fn poisoned_lock_is_recovered() {
        let store = MemoryStore::new();
        std::thread::scope(|s| {
            let _ = s
                .spawn(|| {
                    let _guard = store.objects.lock().unwrap();
                    panic!("writer crashed");
                })
                .join();
        });
        assert!(store.objects.is_poisoned());

        store.insert("a", "1");
        assert!(store.contains("a"));
    }

    #[tokio::test]
    async fn copy_of_missing_source_is_not_found() {
        let store = MemoryStore::new();
        let err = store.copy_object("nope", "dest").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn list_page_respects_max_keys() {
        let store = MemoryStore::new();
        store.insert("a", "1");
        store.insert("b", "2");
        let page = store.list_page("", 1).await.unwrap();
        assert_eq!(page.keys(), vec!["a"]);
    }
}
