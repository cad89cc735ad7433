//! Per-record migration pipeline.
//!
//! A record moves through `Checking -> (Deleting) -> (Resolving) -> Creating`
//! and always ends in a [`RecordOutcome`]; nothing escapes the pipeline as an
//! error.

use std::fmt;

use serde::Serialize;
use tracing::{debug, warn};

use super::policy::{plan_action, Action, ConflictPolicy};
use crate::link::CorporateLink;
use crate::ports::{Directory, LinkStore};

/// Pipeline stage a record failed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// Looking up the destination for a conflicting record.
    Checking,
    /// Deleting the conflicting record under the overwrite policy.
    Deleting,
    /// Resolving a missing corporate id.
    Resolving,
    /// Creating the record at the destination.
    Creating,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Checking => "checking",
            Self::Deleting => "deleting",
            Self::Resolving => "resolving",
            Self::Creating => "creating",
        })
    }
}

/// Final state of one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordOutcome {
    /// The link was written to the destination.
    Created {
        /// The link as created, with any resolved corporate id filled in.
        link: CorporateLink,
        /// Id the destination assigned.
        id: String,
        /// Whether a conflicting record was deleted first.
        overwritten: bool,
    },
    /// A conflicting record exists and the policy left it in place.
    Skipped {
        /// The source link.
        link: CorporateLink,
        /// Id of the record already at the destination.
        existing_id: String,
    },
    /// The record could not be migrated.
    Failed {
        /// The source link.
        link: CorporateLink,
        /// Stage that failed.
        stage: Stage,
        /// Human-readable cause.
        cause: String,
    },
}

struct StageFailure {
    stage: Stage,
    cause: String,
}

impl StageFailure {
    fn new(stage: Stage, cause: impl fmt::Display) -> Self {
        Self { stage, cause: cause.to_string() }
    }
}

/// Migrates one source link into `destination`.
pub async fn migrate_record(
    link: CorporateLink,
    destination: &dyn LinkStore,
    directory: &dyn Directory,
    policy: ConflictPolicy,
) -> RecordOutcome {
    match drive(&link, destination, directory, policy).await {
        Ok(outcome) => outcome,
        Err(StageFailure { stage, cause }) => {
            warn!(third_party_id = %link.third_party_id, %stage, %cause, "link migration failed");
            RecordOutcome::Failed { link, stage, cause }
        }
    }
}

async fn drive(
    link: &CorporateLink,
    destination: &dyn LinkStore,
    directory: &dyn Directory,
    policy: ConflictPolicy,
) -> Result<RecordOutcome, StageFailure> {
    let existing = destination
        .get_by_external_id(&link.third_party_id)
        .await
        .map_err(|e| StageFailure::new(Stage::Checking, e))?;

    let overwritten = match plan_action(existing, policy) {
        Action::Skip(existing) => {
            debug!(third_party_id = %link.third_party_id, existing_id = %existing.id, "already migrated, skipping");
            return Ok(RecordOutcome::Skipped { link: link.clone(), existing_id: existing.id });
        }
        Action::Create => false,
        Action::Overwrite(existing) => {
            match destination.delete(&existing).await {
                Ok(()) => debug!(existing_id = %existing.id, "deleted conflicting link"),
                Err(e) if e.is_not_found() => {
                    warn!(existing_id = %existing.id, "conflicting link already gone, continuing");
                }
                Err(e) => return Err(StageFailure::new(Stage::Deleting, e)),
            }
            true
        }
    };

    let mut target = link.clone();
    if target.is_incomplete() {
        target.corporate_id = resolve(directory, &target.corporate_username).await?;
    }

    let id = destination
        .create(&target)
        .await
        .map_err(|e| StageFailure::new(Stage::Creating, e))?;
    debug!(third_party_id = %target.third_party_id, %id, overwritten, "link created");
    Ok(RecordOutcome::Created { link: target, id, overwritten })
}

async fn resolve(directory: &dyn Directory, username: &str) -> Result<String, StageFailure> {
    let not_found = || {
        StageFailure::new(Stage::Resolving, format!("identity not found in directory: {username}"))
    };
    if username.trim().is_empty() {
        return Err(not_found());
    }
    match directory.resolve_corporate_id(username).await {
        Ok(Some(id)) => {
            debug!(username, corporate_id = %id, "resolved corporate id");
            Ok(id)
        }
        Ok(None) => Err(not_found()),
        Err(e) => Err(StageFailure::new(Stage::Resolving, e)),
    }
}
