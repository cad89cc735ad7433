//! Directory adapter backed by a static YAML map of username to corporate id.

use std::collections::HashMap;
use std::path::Path;

use crate::ports::directory::{Directory, DirectoryError, DirectoryFuture};

/// Directory that answers lookups from a fixed table.
///
/// The file is a flat YAML mapping:
///
/// ```text
/// alice@corp.example: 0e6b7c2a-...
/// bob@corp.example: 5d1f0a99-...
/// ```
#[derive(Debug, Default)]
pub struct FileDirectory {
    entries: HashMap<String, String>,
}

impl FileDirectory {
    /// Loads the table from `path`.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError::Unavailable`] if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, DirectoryError> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            DirectoryError::Unavailable(format!("failed to read {}: {e}", path.display()))
        })?;
        let entries: HashMap<String, String> = if contents.trim().is_empty() {
            HashMap::new()
        } else {
            serde_yaml::from_str(&contents).map_err(|e| {
                DirectoryError::Unavailable(format!("failed to parse {}: {e}", path.display()))
            })?
        };
        Ok(Self { entries })
    }

    /// Builds a directory from in-memory entries.
    #[must_use]
    pub fn from_entries<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self { entries: entries.into_iter().map(|(k, v)| (k.into(), v.into())).collect() }
    }
}

impl Directory for FileDirectory {
    fn resolve_corporate_id<'a>(&'a self, username: &'a str) -> DirectoryFuture<'a> {
        let found = self.entries.get(username).filter(|id| !id.trim().is_empty()).cloned();
        Box::pin(async move { Ok(found) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn loads_mapping_and_resolves() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("directory.yaml");
        std::fs::write(&path, "alice@corp: C100\nghost@corp: ''\n").unwrap();

        let directory = FileDirectory::load(&path).unwrap();
        assert_eq!(directory.resolve_corporate_id("alice@corp").await.unwrap().as_deref(), Some("C100"));
        assert_eq!(directory.resolve_corporate_id("ghost@corp").await.unwrap(), None);
        assert_eq!(directory.resolve_corporate_id("nobody@corp").await.unwrap(), None);
    }

    #[test]
    fn missing_file_is_unavailable() {
        let err = FileDirectory::load(Path::new("/nonexistent/corplink/dir.yaml")).unwrap_err();
        assert!(err.to_string().contains("failed to read"));
    }
}
