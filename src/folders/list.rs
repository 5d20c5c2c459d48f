use super::create::FOLDER_PLACEHOLDER;
use crate::error::DriveResult;
use crate::prefix::{entry_name, normalize_folder_prefix, parent_folder, DELIMITER};
use crate::storage::{ObjectStore, StorageEntry};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FolderEntry {
    pub prefix: String,
    pub name: String,
}

/// One level of the bucket, as shown by a file browser
#[derive(Debug, Clone, Serialize)]
pub struct FolderListing {
    pub prefix: String,
    pub files: Vec<StorageEntry>,
    pub folders: Vec<FolderEntry>,
    pub parent_folder: String,
}

pub async fn list_folder<S: ObjectStore + ?Sized>(
    store: &S,
    prefix: &str,
) -> DriveResult<FolderListing> {
    let prefix = normalize_folder_prefix(prefix);
    let delimiter = DELIMITER.to_string();
    let listed = store.list_objects(&prefix, Some(&delimiter)).await?;

    let files = listed
        .items
        .into_iter()
        .filter(|item| item.key != prefix)
        .filter(|item| {
            let rest = &item.key[prefix.len().min(item.key.len())..];
            !rest.contains(DELIMITER) && rest != FOLDER_PLACEHOLDER
        })
        .collect();

    let folders = listed
        .common_prefixes
        .into_iter()
        .map(|p| FolderEntry {
            name: entry_name(&p),
            prefix: p,
        })
        .collect();

    Ok(FolderListing {
        parent_folder: parent_folder(&prefix),
        prefix,
        files,
        folders,
    })
}

/// Cheap credentials/bucket check: list at most one key.
pub async fn verify_connection<S: ObjectStore + ?Sized>(store: &S) -> DriveResult<bool> {
    store.list_page("", 1).await?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::folders::create_folder;
    use crate::storage::{MemoryStore, StoreCall};

    #[tokio::test]
    async fn lists_direct_children_only() {
        let store = MemoryStore::new();
        store.insert("docs/", "");
        store.insert("docs/readme.md", "r");
        store.insert("docs/guides/intro.md", "i");
        store.insert("docs/api/ref.md", "a");
        create_folder(&store, "empty", "docs/").await.unwrap();

        let listing = list_folder(&store, "docs").await.unwrap();

        assert_eq!(listing.prefix, "docs/");
        assert_eq!(listing.parent_folder, "");
        let names: Vec<&str> = listing.files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["readme.md"]);
        assert_eq!(
            listing.folders,
            vec![
                FolderEntry {
                    prefix: "docs/api/".to_string(),
                    name: "api".to_string()
                },
                FolderEntry {
                    prefix: "docs/empty/".to_string(),
                    name: "empty".to_string()
                },
                FolderEntry {
                    prefix: "docs/guides/".to_string(),
                    name: "guides".to_string()
                },
            ]
        );
    }

    #[tokio::test]
    async fn placeholder_is_hidden_inside_its_folder() {
        let store = MemoryStore::new();
        create_folder(&store, "empty", "").await.unwrap();

        let listing = list_folder(&store, "empty/").await.unwrap();
        assert!(listing.files.is_empty());
        assert!(listing.folders.is_empty());
    }

    #[tokio::test]
    async fn listing_serializes_for_the_browser() {
        let store = MemoryStore::new();
        store.insert("docs/guides/intro.md", "i");

        let listing = list_folder(&store, "docs/guides/").await.unwrap();
        let value = serde_json::to_value(&listing).unwrap();

        assert_eq!(value["prefix"], "docs/guides/");
        assert_eq!(value["parent_folder"], "docs/");
        assert_eq!(value["files"][0]["key"], "docs/guides/intro.md");
        assert_eq!(value["files"][0]["is_folder"], false);
        assert_eq!(value["folders"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn verify_reports_store_errors() {
        let store = MemoryStore::new();
        assert!(verify_connection(&store).await.unwrap());

        store.inject_failure(StoreCall::List {
            prefix: String::new(),
        });
        assert!(verify_connection(&store).await.is_err());
    }
}
