//! Recording adapter for the `LinkStore` port.

use std::sync::Arc;

use super::{record_result, SharedRecorder};
use crate::link::{CorporateLink, StoredLink};
use crate::ports::{LinkStore, StoreFuture};

/// Records link store interactions under a port name (`source` or
/// `destination`) while delegating to an inner implementation.
pub struct RecordingLinkStore {
    port: &'static str,
    inner: Arc<dyn LinkStore>,
    recorder: SharedRecorder,
}

impl RecordingLinkStore {
    /// Creates a new recording store wrapping the given implementation.
    pub fn new(port: &'static str, inner: Arc<dyn LinkStore>, recorder: SharedRecorder) -> Self {
        Self { port, inner, recorder }
    }
}

impl LinkStore for RecordingLinkStore {
    fn get_all(&self) -> StoreFuture<'_, Vec<CorporateLink>> {
        Box::pin(async move {
            let result = self.inner.get_all().await;
            record_result(&self.recorder, self.port, "get_all", &(), &result);
            result
        })
    }

    fn get_by_external_id<'a>(
        &'a self,
        third_party_id: &'a str,
    ) -> StoreFuture<'a, Option<StoredLink>> {
        Box::pin(async move {
            let result = self.inner.get_by_external_id(third_party_id).await;
            record_result(&self.recorder, self.port, "get_by_external_id", &third_party_id, &result);
            result
        })
    }

    fn create<'a>(&'a self, link: &'a CorporateLink) -> StoreFuture<'a, String> {
        Box::pin(async move {
            let result = self.inner.create(link).await;
            record_result(&self.recorder, self.port, "create", link, &result);
            result
        })
    }

    fn delete<'a>(&'a self, link: &'a StoredLink) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            let result = self.inner.delete(link).await;
            record_result(&self.recorder, self.port, "delete", link, &result);
            result
        })
    }

    fn update<'a>(&'a self, link: &'a StoredLink) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            let result = self.inner.update(link).await;
            record_result(&self.recorder, self.port, "update", link, &result);
            result
        })
    }
}
