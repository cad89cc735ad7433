//! Link store backed by a single YAML document on disk.
//!
//! Layout:
//!
//! ```text
//! links:
//!   - id: 5f0c...
//!     thirdPartyId: "1234"
//!     thirdPartyUsername: octocat
//!     corporateId: 0e6b...
//!     corporateUsername: octo@corp.example
//!     isServiceAccount: false
//! ```
//!
//! Every operation re-reads the file; writes replace it via a temp file and
//! rename. Operations are serialized so concurrent callers never lose updates.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::link::{CorporateLink, StoredLink};
use crate::ports::link_store::{LinkStore, StoreError, StoreFuture};

/// On-disk shape of the store.
#[derive(Debug, Default, Serialize, Deserialize)]
struct LinkDocument {
    #[serde(default)]
    links: Vec<StoredLink>,
}

/// YAML file link store.
pub struct YamlLinkStore {
    path: PathBuf,
    guard: Mutex<()>,
}

impl YamlLinkStore {
    /// Opens a store at `path`. A missing file is an empty store and is
    /// created on the first write.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the file exists but cannot be
    /// read or parsed.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .map_err(|e| unavailable(path, &format!("failed to read: {e}")))?;
            parse_document(path, &contents)?;
        }
        Ok(Self { path: path.to_path_buf(), guard: Mutex::new(()) })
    }

    /// Opens a store that must already exist on disk.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the file is missing or unreadable.
    pub fn open_existing(path: &Path) -> Result<Self, StoreError> {
        if !path.exists() {
            return Err(unavailable(path, "file does not exist"));
        }
        Self::open(path)
    }

    async fn read(&self) -> Result<LinkDocument, StoreError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => parse_document(&self.path, &contents),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(LinkDocument::default()),
            Err(e) => Err(unavailable(&self.path, &format!("failed to read: {e}"))),
        }
    }

    async fn write(&self, document: &LinkDocument) -> Result<(), StoreError> {
        let yaml = serde_yaml::to_string(document)
            .map_err(|e| StoreError::Backend(format!("failed to serialize links: {e}")))?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| unavailable(parent, &format!("failed to create directory: {e}")))?;
        }
        let tmp = self.path.with_extension("yaml.tmp");
        tokio::fs::write(&tmp, yaml)
            .await
            .map_err(|e| unavailable(&tmp, &format!("failed to write: {e}")))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| unavailable(&self.path, &format!("failed to replace: {e}")))
    }
}

fn parse_document(path: &Path, contents: &str) -> Result<LinkDocument, StoreError> {
    if contents.trim().is_empty() {
        return Ok(LinkDocument::default());
    }
    serde_yaml::from_str(contents).map_err(|e| unavailable(path, &format!("failed to parse: {e}")))
}

fn unavailable(path: &Path, detail: &str) -> StoreError {
    StoreError::Unavailable(format!("{}: {detail}", path.display()))
}

impl LinkStore for YamlLinkStore {
    fn get_all(&self) -> StoreFuture<'_, Vec<CorporateLink>> {
        Box::pin(async move {
            let _guard = self.guard.lock().await;
            let document = self.read().await?;
            Ok(document.links.into_iter().map(|s| s.link).collect())
        })
    }

    fn get_by_external_id<'a>(
        &'a self,
        third_party_id: &'a str,
    ) -> StoreFuture<'a, Option<StoredLink>> {
        Box::pin(async move {
            let _guard = self.guard.lock().await;
            let document = self.read().await?;
            Ok(document.links.into_iter().find(|s| s.link.third_party_id == third_party_id))
        })
    }

    fn create<'a>(&'a self, link: &'a CorporateLink) -> StoreFuture<'a, String> {
        Box::pin(async move {
            let _guard = self.guard.lock().await;
            let mut document = self.read().await?;
            if document.links.iter().any(|s| s.link.third_party_id == link.third_party_id) {
                return Err(StoreError::DuplicateKey(link.third_party_id.clone()));
            }
            let id = Uuid::new_v4().to_string();
            document.links.push(StoredLink { id: id.clone(), link: link.clone() });
            self.write(&document).await?;
            Ok(id)
        })
    }

    fn delete<'a>(&'a self, link: &'a StoredLink) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            let _guard = self.guard.lock().await;
            let mut document = self.read().await?;
            let before = document.links.len();
            document.links.retain(|s| s.id != link.id);
            if document.links.len() == before {
                return Err(StoreError::NotFound(link.id.clone()));
            }
            self.write(&document).await
        })
    }

    fn update<'a>(&'a self, link: &'a StoredLink) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            let _guard = self.guard.lock().await;
            let mut document = self.read().await?;
            if document
                .links
                .iter()
                .any(|s| s.id != link.id && s.link.third_party_id == link.link.third_party_id)
            {
                return Err(StoreError::DuplicateKey(link.link.third_party_id.clone()));
            }
            let existing = document
                .links
                .iter_mut()
                .find(|s| s.id == link.id)
                .ok_or_else(|| StoreError::NotFound(link.id.clone()))?;
            existing.link = link.link.clone();
            self.write(&document).await
        })
    }
}
