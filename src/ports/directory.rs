//! Directory port for resolving corporate identities.

use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Boxed future type alias used by [`Directory`] to keep the trait dyn-compatible.
pub type DirectoryFuture<'a> =
    Pin<Box<dyn Future<Output = Result<Option<String>, DirectoryError>> + Send + 'a>>;

/// Failures reported by a directory lookup.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum DirectoryError {
    /// The directory could not answer (network, auth, malformed response).
    #[error("directory unavailable: {0}")]
    Unavailable(String),
}

/// Looks up corporate identities in an external directory.
pub trait Directory: Send + Sync {
    /// Resolves the corporate id for a corporate username.
    ///
    /// Returns `Ok(None)` when the directory reports the identity as not found.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError::Unavailable`] for any other failure.
    fn resolve_corporate_id<'a>(&'a self, username: &'a str) -> DirectoryFuture<'a>;
}
