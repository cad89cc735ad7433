//! Run report: counts and itemized failures for one migration run.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::pipeline::{RecordOutcome, Stage};
use crate::link::CorporateLink;

/// One record that could not be migrated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Failure {
    /// The source link, absent when the record's task died before reporting.
    pub link: Option<CorporateLink>,
    /// Stage the record failed in, if known.
    pub stage: Option<Stage>,
    /// Human-readable cause.
    pub cause: String,
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.link {
            Some(link) => write!(f, "{link}")?,
            None => f.write_str("<unknown link>")?,
        }
        if let Some(stage) = self.stage {
            write!(f, " [{stage}]")?;
        }
        write!(f, ": {}", self.cause)
    }
}

/// Aggregate result of a migration run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    /// Links created at the destination.
    pub success_count: usize,
    /// Links left alone because the destination already had them.
    pub skip_count: usize,
    /// Links that failed.
    pub error_count: usize,
    /// Successes that replaced an existing destination record.
    pub overwrite_count: usize,
    /// Failures in the order records completed.
    pub failures: Vec<Failure>,
    /// When the run started.
    pub started_at: DateTime<Utc>,
    /// When the last record completed.
    pub finished_at: Option<DateTime<Utc>>,
}

impl RunReport {
    /// Starts an empty report.
    #[must_use]
    pub fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            success_count: 0,
            skip_count: 0,
            error_count: 0,
            overwrite_count: 0,
            failures: Vec::new(),
            started_at,
            finished_at: None,
        }
    }

    /// Folds one record outcome into the report.
    pub fn record(&mut self, outcome: RecordOutcome) {
        match outcome {
            RecordOutcome::Created { overwritten, .. } => {
                self.success_count += 1;
                if overwritten {
                    self.overwrite_count += 1;
                }
            }
            RecordOutcome::Skipped { .. } => self.skip_count += 1,
            RecordOutcome::Failed { link, stage, cause } => {
                self.push_failure(Failure { link: Some(link), stage: Some(stage), cause });
            }
        }
    }

    /// Records a failure that has no record outcome, such as a task that panicked.
    pub fn record_lost(&mut self, cause: impl Into<String>) {
        self.push_failure(Failure { link: None, stage: None, cause: cause.into() });
    }

    fn push_failure(&mut self, failure: Failure) {
        self.error_count += 1;
        self.failures.push(failure);
    }

    /// Marks the run finished.
    pub fn finish(&mut self, at: DateTime<Utc>) {
        self.finished_at = Some(at);
    }

    /// Number of records accounted for.
    #[must_use]
    pub fn total(&self) -> usize {
        self.success_count + self.skip_count + self.error_count
    }

    /// Whether every record was created or skipped.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.error_count == 0
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "processed {} links: {} created ({} overwritten), {} skipped, {} failed",
            self.total(),
            self.success_count,
            self.overwrite_count,
            self.skip_count,
            self.error_count
        )?;
        if let Some(finished) = self.finished_at {
            let elapsed = finished.signed_duration_since(self.started_at);
            #[allow(clippy::cast_precision_loss)]
            let seconds = elapsed.num_milliseconds() as f64 / 1000.0;
            write!(f, " in {seconds:.2}s")?;
        }
        if !self.failures.is_empty() {
            f.write_str("\nfailures:")?;
            for failure in &self.failures {
                write!(f, "\n  {failure}")?;
            }
        }
        Ok(())
    }
}
