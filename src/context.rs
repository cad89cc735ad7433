//! Service context bundling all port trait objects for one run.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{info, warn};

use crate::adapters::live::clock::LiveClock;
use crate::adapters::live::{open_directory, open_link_store};
use crate::adapters::recording::{
    RecordingClock, RecordingDirectory, RecordingLinkStore, SharedRecorder,
};
use crate::adapters::replaying::{ReplayingClock, ReplayingDirectory, ReplayingLinkStore};
use crate::cassette::format::Cassette;
use crate::cassette::recorder::CassetteRecorder;
use crate::cassette::replayer::CassetteReplayer;
use crate::cassette::CassetteError;
use crate::config::MigrationConfig;
use crate::migrate::MigrationError;
use crate::ports::{Clock, Directory, LinkStore};

/// Cassette metadata key holding the conflict policy.
pub const META_ON_CONFLICT: &str = "onConflict";
/// Cassette metadata key holding the concurrency ceiling.
pub const META_CONCURRENCY: &str = "concurrency";
/// Cassette metadata key set when the recorded run was a dry run.
pub const META_DRY_RUN: &str = "dryRun";

/// Bundles all port trait objects into a single context.
///
/// Each field provides access to one external boundary. Constructors
/// wire up different adapter implementations (live, recording, replaying).
pub struct ServiceContext {
    /// Clock for report timestamps.
    pub clock: Arc<dyn Clock>,
    /// Store links are migrated from.
    pub source: Arc<dyn LinkStore>,
    /// Store links are migrated to.
    pub destination: Arc<dyn LinkStore>,
    /// Directory used to resolve missing corporate ids.
    pub directory: Arc<dyn Directory>,
    /// Cassette recorder, until the cassette is written.
    recorder: Option<SharedRecorder>,
}

impl ServiceContext {
    /// Creates a context from already-built ports.
    #[must_use]
    pub fn from_parts(
        clock: Arc<dyn Clock>,
        source: Arc<dyn LinkStore>,
        destination: Arc<dyn LinkStore>,
        directory: Arc<dyn Directory>,
    ) -> Self {
        Self { clock, source, destination, directory, recorder: None }
    }

    /// Opens the stores and directory named by `config`.
    ///
    /// The source must already exist; a missing destination starts empty.
    ///
    /// # Errors
    ///
    /// Returns a [`MigrationError`] naming the port that could not be opened.
    pub fn live(config: &MigrationConfig) -> Result<Self, MigrationError> {
        let source = open_link_store(&config.source, true).map_err(MigrationError::Source)?;
        let destination =
            open_link_store(&config.destination, false).map_err(MigrationError::Destination)?;
        let directory = open_directory(&config.directory)?;
        Ok(Self::from_parts(Arc::new(LiveClock), source, destination, directory))
    }

    /// Creates a live context that records every port call to a cassette at `path`.
    ///
    /// The run's policy and concurrency are stored as cassette metadata so
    /// the run can be replayed with the same parameters. The cassette is
    /// written when the context is dropped.
    ///
    /// # Errors
    ///
    /// Returns a [`MigrationError`] naming the port that could not be opened.
    pub fn recording(config: &MigrationConfig, path: &Path) -> Result<Self, MigrationError> {
        let live = Self::live(config)?;
        let mut recorder = CassetteRecorder::new(path, "corplink-migration");
        recorder.set_metadata(META_ON_CONFLICT, config.on_conflict.to_string());
        recorder.set_metadata(META_CONCURRENCY, config.concurrency.to_string());
        let recorder = Arc::new(Mutex::new(recorder));

        Ok(Self {
            clock: Arc::new(RecordingClock::new(live.clock.clone(), Arc::clone(&recorder))),
            source: Arc::new(RecordingLinkStore::new(
                "source",
                live.source.clone(),
                Arc::clone(&recorder),
            )),
            destination: Arc::new(RecordingLinkStore::new(
                "destination",
                live.destination.clone(),
                Arc::clone(&recorder),
            )),
            directory: Arc::new(RecordingDirectory::new(
                live.directory.clone(),
                Arc::clone(&recorder),
            )),
            recorder: Some(recorder),
        })
    }

    /// Creates a context that serves every port from a recorded cassette.
    ///
    /// All ports share one replayer; calls are matched on port, method and
    /// input so concurrent records replay regardless of completion order.
    #[must_use]
    pub fn replaying(cassette: &Cassette) -> Self {
        let replayer = Arc::new(Mutex::new(CassetteReplayer::new(cassette)));
        Self::from_parts(
            Arc::new(ReplayingClock::new(Arc::clone(&replayer))),
            Arc::new(ReplayingLinkStore::new("source", Arc::clone(&replayer))),
            Arc::new(ReplayingLinkStore::new("destination", Arc::clone(&replayer))),
            Arc::new(ReplayingDirectory::new(replayer)),
        )
    }

    /// Adds a metadata entry to the cassette, if this context is recording.
    pub fn annotate_recording(&self, key: &str, value: &str) {
        if let Some(recorder) = &self.recorder {
            recorder.lock().unwrap_or_else(PoisonError::into_inner).set_metadata(key, value);
        }
    }

    /// Writes the cassette now, if this context is recording, and stops
    /// recording. Returns the cassette path when one was written.
    ///
    /// A context dropped without calling this writes its cassette on drop and
    /// can only log a failure.
    ///
    /// # Errors
    ///
    /// Returns [`CassetteError::Io`] if the cassette cannot be written.
    pub fn flush_recording(&mut self) -> Result<Option<PathBuf>, CassetteError> {
        self.recorder
            .take()
            .map(|recorder| recorder.lock().unwrap_or_else(PoisonError::into_inner).write())
            .transpose()
    }
}

impl Drop for ServiceContext {
    fn drop(&mut self) {
        match self.flush_recording() {
            Ok(Some(path)) => info!(path = %path.display(), "cassette written"),
            Ok(None) => {}
            Err(e) => warn!(error = %e, "failed to write cassette"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::Utc;
    use serde_json::json;

    use super::*;
    use crate::cassette::format::Interaction;
    use crate::config::{DirectoryConfig, DirectoryKind, StoreConfig, StoreKind};
    use crate::migrate::ConflictPolicy;

    fn file_config(dir: &Path) -> MigrationConfig {
        MigrationConfig {
            source: StoreConfig { kind: StoreKind::Yaml, path: dir.join("source.yaml") },
            destination: StoreConfig { kind: StoreKind::Sqlite, path: dir.join("dest.db") },
            directory: DirectoryConfig {
                kind: DirectoryKind::File,
                url: String::new(),
                token: None,
                path: Some(dir.join("directory.yaml")),
            },
            on_conflict: ConflictPolicy::Overwrite,
            concurrency: 2,
        }
    }

    #[test]
    fn live_context_requires_existing_source() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("directory.yaml"), "").unwrap();
        let err = ServiceContext::live(&file_config(dir.path())).err().unwrap();
        assert!(matches!(err, MigrationError::Source(_)));
    }

    #[test]
    fn live_context_reports_missing_directory_table() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("source.yaml"), "links: []\n").unwrap();
        let err = ServiceContext::live(&file_config(dir.path())).err().unwrap();
        assert!(matches!(err, MigrationError::Directory(_)));
    }

    #[tokio::test]
    async fn recording_context_writes_metadata_and_calls_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("source.yaml"), "links: []\n").unwrap();
        std::fs::write(dir.path().join("directory.yaml"), "").unwrap();
        let cassette_path = dir.path().join("run.cassette.yaml");

        {
            let ctx = ServiceContext::recording(&file_config(dir.path()), &cassette_path).unwrap();
            assert!(ctx.source.get_all().await.unwrap().is_empty());
        }

        let cassette = Cassette::load(&cassette_path).unwrap();
        assert_eq!(cassette.metadata.get(META_ON_CONFLICT).map(String::as_str), Some("overwrite"));
        assert_eq!(cassette.metadata.get(META_CONCURRENCY).map(String::as_str), Some("2"));
        assert_eq!(cassette.interactions.len(), 1);
        assert_eq!(cassette.interactions[0].port, "source");
        assert_eq!(cassette.interactions[0].output, json!({"Ok": []}));
    }

    #[test]
    fn flush_reports_unwritable_cassette_and_stops_recording() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("source.yaml"), "links: []\n").unwrap();
        std::fs::write(dir.path().join("directory.yaml"), "").unwrap();
        std::fs::write(dir.path().join("blocker"), "").unwrap();
        let cassette_path = dir.path().join("blocker").join("run.cassette.yaml");

        let mut ctx = ServiceContext::recording(&file_config(dir.path()), &cassette_path).unwrap();
        let err = ctx.flush_recording().unwrap_err();
        assert!(matches!(err, CassetteError::Io { .. }));
        assert!(ctx.flush_recording().unwrap().is_none());
    }

    #[tokio::test]
    async fn replaying_context_serves_every_port() {
        let cassette = Cassette {
            name: "test".into(),
            recorded_at: Utc::now(),
            metadata: BTreeMap::new(),
            interactions: vec![
                Interaction {
                    seq: 0,
                    port: "clock".into(),
                    method: "now".into(),
                    input: json!(null),
                    output: json!("2024-06-15T10:30:00Z"),
                },
                Interaction {
                    seq: 1,
                    port: "directory".into(),
                    method: "resolve_corporate_id".into(),
                    input: json!("alice@corp"),
                    output: json!({"Ok": "C100"}),
                },
            ],
        };

        let mut ctx = ServiceContext::replaying(&cassette);
        assert_eq!(ctx.clock.now().to_rfc3339(), "2024-06-15T10:30:00+00:00");
        assert_eq!(
            ctx.directory.resolve_corporate_id("alice@corp").await.unwrap().as_deref(),
            Some("C100")
        );
        assert!(ctx.flush_recording().unwrap().is_none());
    }
}
