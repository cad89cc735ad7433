//! Link store port: uniform CRUD over a collection of corporate links.

use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::link::{CorporateLink, StoredLink};

/// Boxed future type alias used by [`LinkStore`] to keep the trait dyn-compatible.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + Send + 'a>>;

/// Failures reported by a link store.
///
/// Serializable so that recorded runs can reproduce the exact failure kind.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum StoreError {
    /// The backing store could not be reached or read.
    #[error("link store unavailable: {0}")]
    Unavailable(String),
    /// The targeted record does not exist.
    #[error("link not found: {0}")]
    NotFound(String),
    /// A record with the same third-party id already exists.
    #[error("duplicate link for third-party id {0}")]
    DuplicateKey(String),
    /// Any other backend failure.
    #[error("link store error: {0}")]
    Backend(String),
}

impl StoreError {
    /// Returns `true` for [`StoreError::NotFound`].
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// CRUD access to a link collection.
///
/// Implementations have no side effects beyond the backing store and do no
/// caching: every call observes the store's current state.
pub trait LinkStore: Send + Sync {
    /// Enumerates every link in the store.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the backend cannot be reached.
    fn get_all(&self) -> StoreFuture<'_, Vec<CorporateLink>>;

    /// Looks up a link by its third-party id. `Ok(None)` means no such link.
    ///
    /// # Errors
    ///
    /// Returns an error only when the lookup itself fails.
    fn get_by_external_id<'a>(&'a self, third_party_id: &'a str)
        -> StoreFuture<'a, Option<StoredLink>>;

    /// Creates a link and returns its generated id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DuplicateKey`] if the third-party id is taken.
    fn create<'a>(&'a self, link: &'a CorporateLink) -> StoreFuture<'a, String>;

    /// Deletes a stored link.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the link is already absent.
    fn delete<'a>(&'a self, link: &'a StoredLink) -> StoreFuture<'a, ()>;

    /// Replaces the fields of a stored link, keeping its id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the id no longer exists.
    fn update<'a>(&'a self, link: &'a StoredLink) -> StoreFuture<'a, ()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_round_trip_through_json() {
        let err = StoreError::DuplicateKey("42".into());
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["kind"], "duplicate_key");
        let back: StoreError = serde_json::from_value(json).unwrap();
        assert_eq!(back, err);
    }

    #[test]
    fn only_not_found_is_not_found() {
        assert!(StoreError::NotFound("x".into()).is_not_found());
        assert!(!StoreError::Backend("x".into()).is_not_found());
    }
}
