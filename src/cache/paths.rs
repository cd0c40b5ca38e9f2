// Cache path utilities.
// Maps dataset keys onto files inside the cache directory.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;

/// Cache directory used when nothing else is configured, relative to the working directory.
pub const DEFAULT_CACHE_DIR: &str = "cache";

/// Extension of every cache entry file.
pub const ENTRY_EXTENSION: &str = "json";

/// Per-user platform cache directory (~/.cache/slackstat on Linux).
pub fn user_cache_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "slackstat").map(|dirs| dirs.cache_dir().to_path_buf())
}

/// Path of the file holding the entry for `key`.
pub fn entry_path(root: &Path, key: &str) -> PathBuf {
    root.join(format!("{}.{}", encode_key(key), ENTRY_EXTENSION))
}

/// Encode a key for use as a file name.
/// Characters that are unsafe in paths, and `%` itself, become `%XX`, so distinct keys
/// always map to distinct names.
fn encode_key(key: &str) -> String {
    let mut encoded = String::with_capacity(key.len());
    for c in key.chars() {
        match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '%' => {
                encoded.push_str(&format!("%{:02X}", c as u32));
            }
            c if c.is_ascii_control() => encoded.push_str(&format!("%{:02X}", c as u32)),
            c => encoded.push(c),
        }
    }
    encoded
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_key() {
        assert_eq!(encode_key("channels"), "channels");
        assert_eq!(encode_key("user_Ada Lovelace"), "user_Ada Lovelace");
        assert_eq!(encode_key("user_a/b:c"), "user_a%2Fb%3Ac");
        assert_eq!(encode_key("user_100%"), "user_100%25");
    }

    #[test]
    fn test_similar_keys_get_distinct_paths() {
        let root = Path::new("cache");
        let keys = ["user_Ops/Team", "user_Ops_Team", "user_Ops%2FTeam", "user_Ops:Team"];
        let paths: std::collections::HashSet<PathBuf> =
            keys.iter().map(|key| entry_path(root, key)).collect();
        assert_eq!(paths.len(), keys.len());
    }

    #[test]
    fn test_entry_path() {
        let root = Path::new("cache");
        assert_eq!(
            entry_path(root, "conversation_C123_history"),
            PathBuf::from("cache/conversation_C123_history.json")
        );
        assert!(entry_path(root, "user_../etc").ends_with("user_..%2Fetc.json"));
    }
}
