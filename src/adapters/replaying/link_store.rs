//! Replaying adapter for the `LinkStore` port.

use serde::Serialize;

use super::{next_output, replay_result, SharedReplayer};
use crate::link::{CorporateLink, StoredLink};
use crate::ports::{LinkStore, StoreError, StoreFuture};

/// Serves recorded link store calls for one port name from a cassette.
pub struct ReplayingLinkStore {
    port: &'static str,
    replayer: SharedReplayer,
}

impl ReplayingLinkStore {
    /// Create a replaying store answering as `port` (`source` or `destination`).
    #[must_use]
    pub fn new(port: &'static str, replayer: SharedReplayer) -> Self {
        Self { port, replayer }
    }

    fn replay<T, I>(&self, method: &'static str, input: &I) -> StoreFuture<'static, T>
    where
        T: serde::de::DeserializeOwned + Send + 'static,
        I: Serialize,
    {
        let port = self.port;
        let output = next_output(&self.replayer, port, method, input);
        Box::pin(async move { replay_result(port, method, output, StoreError::Backend) })
    }
}

impl LinkStore for ReplayingLinkStore {
    fn get_all(&self) -> StoreFuture<'_, Vec<CorporateLink>> {
        self.replay("get_all", &())
    }

    fn get_by_external_id<'a>(
        &'a self,
        third_party_id: &'a str,
    ) -> StoreFuture<'a, Option<StoredLink>> {
        self.replay("get_by_external_id", &third_party_id)
    }

    fn create<'a>(&'a self, link: &'a CorporateLink) -> StoreFuture<'a, String> {
        self.replay("create", link)
    }

    fn delete<'a>(&'a self, link: &'a StoredLink) -> StoreFuture<'a, ()> {
        self.replay("delete", link)
    }

    fn update<'a>(&'a self, link: &'a StoredLink) -> StoreFuture<'a, ()> {
        self.replay("update", link)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use chrono::Utc;
    use serde_json::json;

    use super::*;
    use crate::cassette::format::{Cassette, Interaction};
    use crate::cassette::replayer::CassetteReplayer;

    fn replayer(interactions: Vec<Interaction>) -> SharedReplayer {
        let cassette = Cassette {
            name: "test".into(),
            recorded_at: Utc::now(),
            metadata: Default::default(),
            interactions,
        };
        Arc::new(Mutex::new(CassetteReplayer::new(&cassette)))
    }

    #[tokio::test]
    async fn replays_lookups_for_its_own_port_only() {
        let shared = replayer(vec![
            Interaction {
                seq: 0,
                port: "destination".into(),
                method: "get_by_external_id".into(),
                input: json!("7"),
                output: json!({"Ok": {
                    "id": "d-7",
                    "thirdPartyId": "7",
                    "thirdPartyUsername": "gh7",
                    "corporateId": "C7",
                    "corporateUsername": "u7@corp",
                    "isServiceAccount": false
                }}),
            },
            Interaction {
                seq: 1,
                port: "destination".into(),
                method: "delete".into(),
                input: json!({"id": "d-7"}),
                output: json!({"Err": {"kind": "not_found", "message": "d-7"}}),
            },
        ]);
        let destination = ReplayingLinkStore::new("destination", Arc::clone(&shared));
        let source = ReplayingLinkStore::new("source", shared);

        let found = destination.get_by_external_id("7").await.unwrap().unwrap();
        assert_eq!(found.id, "d-7");
        assert_eq!(found.link.corporate_id, "C7");

        let err = source.get_by_external_id("7").await.unwrap_err();
        assert!(matches!(err, StoreError::Backend(msg) if msg.contains("cassette exhausted")));
    }

    #[tokio::test]
    async fn replays_recorded_errors_with_their_kind() {
        let shared = replayer(vec![Interaction {
            seq: 0,
            port: "source".into(),
            method: "get_all".into(),
            input: json!(null),
            output: json!({"Err": {"kind": "unavailable", "message": "down"}}),
        }]);
        let source = ReplayingLinkStore::new("source", shared);
        assert_eq!(source.get_all().await, Err(StoreError::Unavailable("down".into())));
    }
}
