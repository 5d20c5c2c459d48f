use crate::error::{DriveError, DriveResult};
use crate::prefix::normalize_folder_prefix;
use crate::storage::ObjectStore;
use log::info;

/// Empty object that keeps an otherwise empty folder visible
pub const FOLDER_PLACEHOLDER: &str = ".folder_placeholder";

/// Trim and replace every character outside `[A-Za-z0-9-_.]` with `_`.
pub fn sanitize_folder_name(name: &str) -> String {
    name.trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Create `name` inside `prefix` and return the new folder prefix.
pub async fn create_folder<S: ObjectStore + ?Sized>(
    store: &S,
    name: &str,
    prefix: &str,
) -> DriveResult<String> {
    let sanitized = sanitize_folder_name(name);
    // "." and ".." would produce unreachable or confusing keys
    if sanitized.is_empty() || sanitized.chars().all(|c| c == '.') {
        return Err(DriveError::InvalidFolderName(name.to_string()));
    }

    let folder = format!("{}{}/", normalize_folder_prefix(prefix), sanitized);
    let placeholder = format!("{}{}", folder, FOLDER_PLACEHOLDER);
    store
        .put_object(&placeholder, Vec::new().into(), "text/plain")
        .await?;

    info!("create_folder: {}", folder);
    Ok(folder)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    #[test]
    fn sanitizes_unsupported_characters() {
        assert_eq!(sanitize_folder_name("  My Photos "), "My_Photos");
        assert_eq!(sanitize_folder_name("a/b"), "a_b");
        assert_eq!(sanitize_folder_name("año-2024_v1.0"), "a_o-2024_v1.0");
    }

    #[tokio::test]
    async fn writes_placeholder_object() {
        let store = MemoryStore::new();
        let folder = create_folder(&store, "Summer 2024", "photos").await.unwrap();

        assert_eq!(folder, "photos/Summer_2024/");
        assert_eq!(
            store.keys(),
            vec!["photos/Summer_2024/.folder_placeholder"]
        );
        assert_eq!(
            store.content_type("photos/Summer_2024/.folder_placeholder").unwrap(),
            "text/plain"
        );
    }

    #[tokio::test]
    async fn blank_name_is_rejected() {
        let store = MemoryStore::new();
        assert!(matches!(
            create_folder(&store, "   ", "").await.unwrap_err(),
            DriveError::InvalidFolderName(_)
        ));
        assert!(create_folder(&store, "..", "").await.is_err());
        assert!(store.calls().is_empty());
    }
}
