//! R2 list operations

use super::types::{sdk_error, R2Store};
use crate::error::StoreResult;
use crate::storage::{ListObjectsResult, StorageEntry, MAX_KEYS};
use aws_sdk_s3::operation::list_objects_v2::ListObjectsV2Output;
use log::debug;

fn page_entries(response: &ListObjectsV2Output) -> Vec<StorageEntry> {
    response
        .contents()
        .iter()
        .filter_map(|obj| {
            let key = obj.key()?.to_string();
            Some(StorageEntry::object(
                key,
                obj.size().unwrap_or(0),
                obj.last_modified()
                    .map(|dt| dt.to_string())
                    .unwrap_or_default(),
            ))
        })
        .collect()
}

impl R2Store {
    /// List all objects under a prefix, following continuation tokens.
    pub(super) async fn list_all(
        &self,
        prefix: &str,
        delimiter: Option<&str>,
    ) -> StoreResult<ListObjectsResult> {
        let mut all_objects = Vec::new();
        let mut all_folders: Vec<String> = Vec::new();
        let mut continuation_token: Option<String> = None;
        let mut page_count = 0;

        loop {
            let mut request = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .max_keys(MAX_KEYS);

            if !prefix.is_empty() {
                request = request.prefix(prefix);
            }
            if let Some(d) = delimiter {
                request = request.delimiter(d);
            }
            if let Some(token) = &continuation_token {
                request = request.continuation_token(token);
            }

            let response = request
                .send()
                .await
                .map_err(|e| sdk_error("list_objects", prefix, e))?;
            page_count += 1;

            all_objects.extend(page_entries(&response));

            let folders = response
                .common_prefixes()
                .iter()
                .filter_map(|p| p.prefix().map(|s| s.to_string()));
            for folder in folders {
                if !all_folders.contains(&folder) {
                    all_folders.push(folder);
                }
            }

            if !response.is_truncated().unwrap_or(false) {
                break;
            }

            continuation_token = response.next_continuation_token().map(|s| s.to_string());
            if continuation_token.is_none() {
                break;
            }
        }

        debug!(
            "list_all: prefix={} pages={} objects={} folders={}",
            prefix,
            page_count,
            all_objects.len(),
            all_folders.len()
        );

        Ok(ListObjectsResult {
            items: all_objects,
            common_prefixes: all_folders,
        })
    }

    /// One listing request, no continuation.
    pub(super) async fn list_single_page(
        &self,
        prefix: &str,
        max_keys: i32,
    ) -> StoreResult<ListObjectsResult> {
        let mut request = self
            .client
            .list_objects_v2()
            .bucket(&self.bucket)
            .max_keys(max_keys);

        if !prefix.is_empty() {
            request = request.prefix(prefix);
        }

        let response = request
            .send()
            .await
            .map_err(|e| sdk_error("list_objects", prefix, e))?;

        Ok(ListObjectsResult {
            items: page_entries(&response),
            common_prefixes: Vec::new(),
        })
    }
}
