//! Folder prefix helpers
//!
//! Folders are a naming convention over a flat key space: a folder is any
//! prefix ending with `/`. Everything here is pure string handling.

pub const DELIMITER: char = '/';

/// Strip leading slashes and make a non-empty prefix end with `/`.
/// The empty prefix (bucket root) stays empty.
pub fn normalize_folder_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim_start_matches(DELIMITER);
    if trimmed.is_empty() {
        return String::new();
    }
    if trimmed.ends_with(DELIMITER) {
        trimmed.to_string()
    } else {
        format!("{}{}", trimmed, DELIMITER)
    }
}

/// Last non-empty segment of a key or prefix.
pub fn last_segment(path: &str) -> Option<&str> {
    path.split(DELIMITER).filter(|s| !s.is_empty()).next_back()
}

/// Display name of a key: `a/b/c.txt` -> `c.txt`, `a/b/` -> `b`.
pub fn entry_name(key: &str) -> String {
    last_segment(key).unwrap_or_default().to_string()
}

/// Prefix a directory's contents go under when it is placed inside `parent`.
///
/// When `parent` already ends with a segment equal to `dir_name` the name is
/// not appended again, so dropping `photos` while browsing `photos/` yields
/// `photos/` rather than `photos/photos/`.
pub fn child_folder_prefix(parent: &str, dir_name: &str) -> String {
    let parent = normalize_folder_prefix(parent);
    if last_segment(&parent) == Some(dir_name) {
        return parent;
    }
    normalize_folder_prefix(&format!("{}{}", parent, dir_name))
}

/// Key a file named `file_name` gets inside `prefix`.
pub fn file_key(prefix: &str, file_name: &str) -> String {
    format!("{}{}", normalize_folder_prefix(prefix), file_name)
}

/// Enclosing folder of a prefix: `a/b/` -> `a/`, `a/` -> `""`.
pub fn parent_folder(prefix: &str) -> String {
    let trimmed = prefix.trim_end_matches(DELIMITER);
    match trimmed.rfind(DELIMITER) {
        Some(idx) => trimmed[..=idx].to_string(),
        None => String::new(),
    }
}

/// Destination key of `key` when the folder `old_prefix` becomes `new_prefix`.
/// Only a leading occurrence of the old prefix is replaced.
pub fn rebase_key(key: &str, old_prefix: &str, new_prefix: &str) -> Option<String> {
    key.strip_prefix(old_prefix)
        .map(|rest| format!("{}{}", new_prefix, rest))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_adds_trailing_and_strips_leading_slash() {
        assert_eq!(normalize_folder_prefix(""), "");
        assert_eq!(normalize_folder_prefix("/"), "");
        assert_eq!(normalize_folder_prefix("docs"), "docs/");
        assert_eq!(normalize_folder_prefix("/docs/2024"), "docs/2024/");
        assert_eq!(normalize_folder_prefix("docs/"), "docs/");
    }

    #[test]
    fn child_prefix_avoids_duplicate_segment() {
        assert_eq!(child_folder_prefix("", "photos"), "photos/");
        assert_eq!(child_folder_prefix("photos/", "photos"), "photos/");
        assert_eq!(child_folder_prefix("photos", "photos"), "photos/");
        assert_eq!(child_folder_prefix("media/photos/", "photos"), "media/photos/");
        assert_eq!(child_folder_prefix("media/", "photos"), "media/photos/");
        // Only the last segment counts
        assert_eq!(child_folder_prefix("photos/raw/", "photos"), "photos/raw/photos/");
    }

    #[test]
    fn names_and_parents() {
        assert_eq!(entry_name("a/b/c.txt"), "c.txt");
        assert_eq!(entry_name("a/b/"), "b");
        assert_eq!(entry_name(""), "");
        assert_eq!(parent_folder("a/b/"), "a/");
        assert_eq!(parent_folder("a/"), "");
        assert_eq!(parent_folder(""), "");
    }

    #[test]
    fn rebase_only_replaces_leading_prefix() {
        assert_eq!(
            rebase_key("docs/x/docs/y.txt", "docs/", "archive/").as_deref(),
            Some("archive/x/docs/y.txt")
        );
        assert_eq!(rebase_key("other/docs/y.txt", "docs/", "archive/"), None);
        assert_eq!(file_key("", "a.jpg"), "a.jpg");
        assert_eq!(file_key("/photos", "a.jpg"), "photos/a.jpg");
    }
}
