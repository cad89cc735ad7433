//! In-process link store.
//!
//! Keeps links in memory and logs every call so unit tests can exercise the
//! migration engine without a backend. Failures can
//! be injected per operation and third-party id, and an artificial latency
//! lets callers observe how many calls were in flight at once.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use uuid::Uuid;

use crate::link::{CorporateLink, StoredLink};
use crate::ports::link_store::{LinkStore, StoreError, StoreFuture};

/// A store operation, used to target injected failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    /// `get_all`
    GetAll,
    /// `get_by_external_id`
    GetByExternalId,
    /// `create`
    Create,
    /// `delete`
    Delete,
    /// `update`
    Update,
}

/// One logged call against a [`MemoryLinkStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    /// `get_all()`
    GetAll,
    /// `get_by_external_id(id)`
    GetByExternalId(String),
    /// `create(link)`
    Create(CorporateLink),
    /// `delete(link)`
    Delete(StoredLink),
    /// `update(link)`
    Update(StoredLink),
}

/// Link store held entirely in memory.
#[derive(Default)]
pub struct MemoryLinkStore {
    links: Mutex<Vec<StoredLink>>,
    calls: Mutex<Vec<StoreCall>>,
    failures: Mutex<HashMap<(StoreOp, String), StoreError>>,
    latency: Option<Duration>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MemoryLinkStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with the given links.
    #[must_use]
    pub fn with_links(links: impl IntoIterator<Item = CorporateLink>) -> Self {
        let stored =
            links.into_iter().map(|link| StoredLink { id: Uuid::new_v4().to_string(), link });
        Self { links: Mutex::new(stored.collect()), ..Self::default() }
    }

    /// Delays every call by `latency` so concurrent callers overlap.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Makes every `op` call for `third_party_id` fail with `error`.
    ///
    /// For [`StoreOp::GetAll`] the id is ignored; use an empty string.
    pub fn inject_failure(&self, op: StoreOp, third_party_id: &str, error: StoreError) {
        let key = (op, failure_key(op, third_party_id));
        self.failures.lock().expect("failures lock poisoned").insert(key, error);
    }

    /// Returns a snapshot of every call made so far, in call order.
    #[must_use]
    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().expect("calls lock poisoned").clone()
    }

    /// Returns the links currently held.
    #[must_use]
    pub fn links(&self) -> Vec<StoredLink> {
        self.links.lock().expect("links lock poisoned").clone()
    }

    /// Highest number of calls observed in flight at the same time.
    #[must_use]
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    async fn enter(
        &self,
        op: StoreOp,
        third_party_id: &str,
        call: StoreCall,
    ) -> Result<(), StoreError> {
        self.calls.lock().expect("calls lock poisoned").push(call);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let key = (op, failure_key(op, third_party_id));
        let injected = self.failures.lock().expect("failures lock poisoned").get(&key).cloned();
        injected.map_or(Ok(()), Err)
    }
}

fn failure_key(op: StoreOp, third_party_id: &str) -> String {
    if op == StoreOp::GetAll {
        String::new()
    } else {
        third_party_id.to_string()
    }
}

impl LinkStore for MemoryLinkStore {
    fn get_all(&self) -> StoreFuture<'_, Vec<CorporateLink>> {
        Box::pin(async move {
            self.enter(StoreOp::GetAll, "", StoreCall::GetAll).await?;
            let links = self.links.lock().expect("links lock poisoned");
            Ok(links.iter().map(|s| s.link.clone()).collect())
        })
    }

    fn get_by_external_id<'a>(
        &'a self,
        third_party_id: &'a str,
    ) -> StoreFuture<'a, Option<StoredLink>> {
        Box::pin(async move {
            let call = StoreCall::GetByExternalId(third_party_id.to_string());
            self.enter(StoreOp::GetByExternalId, third_party_id, call).await?;
            let links = self.links.lock().expect("links lock poisoned");
            Ok(links.iter().find(|s| s.link.third_party_id == third_party_id).cloned())
        })
    }

    fn create<'a>(&'a self, link: &'a CorporateLink) -> StoreFuture<'a, String> {
        Box::pin(async move {
            self.enter(StoreOp::Create, &link.third_party_id, StoreCall::Create(link.clone()))
                .await?;
            let mut links = self.links.lock().expect("links lock poisoned");
            if links.iter().any(|s| s.link.third_party_id == link.third_party_id) {
                return Err(StoreError::DuplicateKey(link.third_party_id.clone()));
            }
            let id = Uuid::new_v4().to_string();
            links.push(StoredLink { id: id.clone(), link: link.clone() });
            Ok(id)
        })
    }

    fn delete<'a>(&'a self, link: &'a StoredLink) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            self.enter(StoreOp::Delete, &link.link.third_party_id, StoreCall::Delete(link.clone()))
                .await?;
            let mut links = self.links.lock().expect("links lock poisoned");
            let before = links.len();
            links.retain(|s| s.id != link.id);
            if links.len() == before {
                return Err(StoreError::NotFound(link.id.clone()));
            }
            Ok(())
        })
    }

    fn update<'a>(&'a self, link: &'a StoredLink) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            self.enter(StoreOp::Update, &link.link.third_party_id, StoreCall::Update(link.clone()))
                .await?;
            let mut links = self.links.lock().expect("links lock poisoned");
            if links
                .iter()
                .any(|s| s.id != link.id && s.link.third_party_id == link.link.third_party_id)
            {
                return Err(StoreError::DuplicateKey(link.link.third_party_id.clone()));
            }
            let existing = links
                .iter_mut()
                .find(|s| s.id == link.id)
                .ok_or_else(|| StoreError::NotFound(link.id.clone()))?;
            existing.link = link.link.clone();
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link(id: &str) -> CorporateLink {
        CorporateLink {
            third_party_id: id.into(),
            third_party_username: format!("user{id}"),
            corporate_id: format!("C{id}"),
            corporate_username: format!("user{id}@corp"),
            is_service_account: false,
        }
    }

    #[tokio::test]
    async fn create_then_lookup() {
        let store = MemoryLinkStore::new();
        let id = store.create(&link("1")).await.unwrap();
        let found = store.get_by_external_id("1").await.unwrap().unwrap();
        assert_eq!(found.id, id);
        assert_eq!(found.link, link("1"));
        assert!(store.get_by_external_id("2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn create_rejects_duplicate_third_party_id() {
        let store = MemoryLinkStore::with_links([link("1")]);
        let err = store.create(&link("1")).await.unwrap_err();
        assert_eq!(err, StoreError::DuplicateKey("1".into()));
    }

    #[tokio::test]
    async fn delete_twice_reports_not_found() {
        let store = MemoryLinkStore::with_links([link("1")]);
        let stored = store.get_by_external_id("1").await.unwrap().unwrap();
        store.delete(&stored).await.unwrap();
        assert!(store.delete(&stored).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn update_replaces_fields_and_keeps_id() {
        let store = MemoryLinkStore::with_links([link("1")]);
        let mut stored = store.get_by_external_id("1").await.unwrap().unwrap();
        stored.link.third_party_username = "renamed".into();
        store.update(&stored).await.unwrap();

        let reloaded = store.get_by_external_id("1").await.unwrap().unwrap();
        assert_eq!(reloaded.id, stored.id);
        assert_eq!(reloaded.link.third_party_username, "renamed");
    }

    #[tokio::test]
    async fn update_missing_id_is_not_found() {
        let store = MemoryLinkStore::new();
        let ghost = StoredLink { id: "gone".into(), link: link("1") };
        assert!(store.update(&ghost).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn injected_failures_apply_per_operation_and_id() {
        let store = MemoryLinkStore::with_links([link("1"), link("2")]);
        store.inject_failure(StoreOp::GetByExternalId, "2", StoreError::Backend("boom".into()));
        store.inject_failure(StoreOp::GetAll, "", StoreError::Unavailable("down".into()));

        assert!(store.get_by_external_id("1").await.is_ok());
        assert_eq!(
            store.get_by_external_id("2").await.unwrap_err(),
            StoreError::Backend("boom".into())
        );
        assert_eq!(store.get_all().await.unwrap_err(), StoreError::Unavailable("down".into()));
    }

    #[tokio::test]
    async fn logs_calls_in_order() {
        let store = MemoryLinkStore::new();
        let _ = store.get_by_external_id("9").await;
        let _ = store.create(&link("9")).await;
        assert_eq!(
            store.calls(),
            vec![StoreCall::GetByExternalId("9".into()), StoreCall::Create(link("9"))]
        );
    }
}
