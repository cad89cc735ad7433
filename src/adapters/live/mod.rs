//! Live adapters for real external interactions.

pub mod clock;
pub mod file_directory;
pub mod graph;
pub mod sqlite_store;
pub mod yaml_store;

use std::sync::Arc;

use crate::config::{DirectoryConfig, DirectoryKind, StoreConfig, StoreKind};
use crate::ports::{Directory, DirectoryError, LinkStore, StoreError};

/// Opens the store described by `config`.
///
/// With `must_exist`, a store that is not already on disk is an error
/// instead of an empty store.
///
/// # Errors
///
/// Returns [`StoreError::Unavailable`] if the store cannot be opened.
pub fn open_link_store(
    config: &StoreConfig,
    must_exist: bool,
) -> Result<Arc<dyn LinkStore>, StoreError> {
    let store: Arc<dyn LinkStore> = match (config.kind, must_exist) {
        (StoreKind::Yaml, true) => Arc::new(yaml_store::YamlLinkStore::open_existing(&config.path)?),
        (StoreKind::Yaml, false) => Arc::new(yaml_store::YamlLinkStore::open(&config.path)?),
        (StoreKind::Sqlite, true) => {
            Arc::new(sqlite_store::SqliteLinkStore::open_existing(&config.path)?)
        }
        (StoreKind::Sqlite, false) => Arc::new(sqlite_store::SqliteLinkStore::open(&config.path)?),
    };
    Ok(store)
}

/// Builds the directory client described by `config`.
///
/// # Errors
///
/// Returns [`DirectoryError::Unavailable`] if a required setting is missing
/// or the backend cannot be initialized.
pub fn open_directory(config: &DirectoryConfig) -> Result<Arc<dyn Directory>, DirectoryError> {
    match config.kind {
        DirectoryKind::Graph => {
            let token = config.token.as_deref().ok_or_else(|| {
                DirectoryError::Unavailable("graph directory requires a bearer token".to_string())
            })?;
            Ok(Arc::new(graph::GraphDirectory::new(&config.url, token)?))
        }
        DirectoryKind::File => {
            let path = config.path.as_deref().ok_or_else(|| {
                DirectoryError::Unavailable("file directory requires a path".to_string())
            })?;
            Ok(Arc::new(file_directory::FileDirectory::load(path)?))
        }
    }
}
