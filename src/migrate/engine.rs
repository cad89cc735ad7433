//! Reconciliation engine: enumerate the source once, then migrate every link
//! with a bounded number of records in flight.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};
use tracing::{error, info};

use super::pipeline::{migrate_record, RecordOutcome};
use super::plan::{plan_record, PlannedAction, PlannedStep};
use super::policy::ConflictPolicy;
use super::report::RunReport;
use crate::cassette::CassetteError;
use crate::config::ConfigError;
use crate::context::ServiceContext;
use crate::ports::{Clock, Directory, DirectoryError, LinkStore, StoreError};

/// Errors that stop a run before a report can be produced.
#[derive(Debug, Error)]
pub enum MigrationError {
    /// The configuration is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The source store could not be opened or enumerated.
    #[error("source store: {0}")]
    Source(#[source] StoreError),
    /// The destination store could not be opened.
    #[error("destination store: {0}")]
    Destination(#[source] StoreError),
    /// The directory could not be initialized.
    #[error("directory: {0}")]
    Directory(#[from] DirectoryError),
    /// A cassette could not be read or written.
    #[error(transparent)]
    Cassette(#[from] CassetteError),
    /// The concurrency gate failed.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Drives a migration from the source store into the destination store.
pub struct Reconciler {
    clock: Arc<dyn Clock>,
    source: Arc<dyn LinkStore>,
    destination: Arc<dyn LinkStore>,
    directory: Arc<dyn Directory>,
    policy: ConflictPolicy,
    concurrency: usize,
}

impl Reconciler {
    /// Creates an engine over the context's ports.
    ///
    /// A `concurrency` of zero is treated as one.
    #[must_use]
    pub fn new(ctx: &ServiceContext, policy: ConflictPolicy, concurrency: usize) -> Self {
        Self {
            clock: Arc::clone(&ctx.clock),
            source: Arc::clone(&ctx.source),
            destination: Arc::clone(&ctx.destination),
            directory: Arc::clone(&ctx.directory),
            policy,
            concurrency: concurrency.max(1),
        }
    }

    /// Migrates every source link and returns the run report.
    ///
    /// Per-record failures are collected in the report; they never fail the run.
    ///
    /// # Errors
    ///
    /// Returns [`MigrationError::Source`] if the source cannot be enumerated.
    pub async fn run(&self) -> Result<RunReport, MigrationError> {
        let mut report = RunReport::new(self.clock.now());
        let links = self.source.get_all().await.map_err(MigrationError::Source)?;
        info!(
            links = links.len(),
            policy = %self.policy,
            concurrency = self.concurrency,
            "starting link migration"
        );

        let gate = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks = JoinSet::new();
        for link in links {
            let permit = Arc::clone(&gate)
                .acquire_owned()
                .await
                .map_err(|e| MigrationError::Internal(e.to_string()))?;
            let destination = Arc::clone(&self.destination);
            let directory = Arc::clone(&self.directory);
            let policy = self.policy;
            tasks.spawn(async move {
                let outcome =
                    migrate_record(link, destination.as_ref(), directory.as_ref(), policy).await;
                drop(permit);
                outcome
            });
        }
        while let Some(joined) = tasks.join_next().await {
            fold(&mut report, joined);
        }

        report.finish(self.clock.now());
        info!(
            created = report.success_count,
            overwritten = report.overwrite_count,
            skipped = report.skip_count,
            failed = report.error_count,
            "link migration finished"
        );
        Ok(report)
    }

    /// Reports what [`Reconciler::run`] would do without writing anything or
    /// consulting the directory. Actions are sorted by third-party id.
    ///
    /// # Errors
    ///
    /// Returns [`MigrationError::Source`] if the source cannot be enumerated.
    pub async fn plan(&self) -> Result<Vec<PlannedAction>, MigrationError> {
        let links = self.source.get_all().await.map_err(MigrationError::Source)?;
        info!(links = links.len(), policy = %self.policy, "planning link migration");

        let gate = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks = JoinSet::new();
        for link in links {
            let permit = Arc::clone(&gate)
                .acquire_owned()
                .await
                .map_err(|e| MigrationError::Internal(e.to_string()))?;
            let destination = Arc::clone(&self.destination);
            let policy = self.policy;
            tasks.spawn(async move {
                let planned = plan_record(&link, destination.as_ref(), policy).await;
                drop(permit);
                planned
            });
        }

        let mut actions = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(action) => actions.push(action),
                Err(e) => {
                    error!(error = %e, "planning task panicked");
                    actions.push(PlannedAction {
                        third_party_id: String::new(),
                        corporate_username: String::new(),
                        step: PlannedStep::Error { cause: format!("planning task panicked: {e}") },
                        needs_resolution: false,
                    });
                }
            }
        }
        actions.sort_by(|a, b| a.third_party_id.cmp(&b.third_party_id));
        Ok(actions)
    }
}

/// Folds a joined pipeline task into the report; a panicked task still counts.
fn fold(report: &mut RunReport, joined: Result<RecordOutcome, JoinError>) {
    match joined {
        Ok(outcome) => report.record(outcome),
        Err(e) => {
            error!(error = %e, "pipeline task panicked");
            report.record_lost(format!("pipeline task panicked: {e}"));
        }
    }
}
