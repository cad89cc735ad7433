//! Conflict policy and the per-record action it selects.

use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::link::StoredLink;

/// What to do when the destination already holds a link with the same
/// third-party id.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum ConflictPolicy {
    /// Delete the destination record and recreate it from the source.
    Overwrite,
    /// Leave the destination record untouched.
    #[default]
    Skip,
}

impl fmt::Display for ConflictPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Overwrite => "overwrite",
            Self::Skip => "skip",
        })
    }
}

impl FromStr for ConflictPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "overwrite" => Ok(Self::Overwrite),
            "skip" => Ok(Self::Skip),
            other => Err(format!("unknown conflict policy {other:?} (expected overwrite or skip)")),
        }
    }
}

impl TryFrom<String> for ConflictPolicy {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Action chosen for one source link after the destination lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// No conflict: create the link.
    Create,
    /// Conflict under [`ConflictPolicy::Overwrite`]: delete this record, then create.
    Overwrite(StoredLink),
    /// Conflict under [`ConflictPolicy::Skip`]: leave this record alone.
    Skip(StoredLink),
}

/// Chooses the action for a source link given the destination's existing record.
#[must_use]
pub fn plan_action(existing: Option<StoredLink>, policy: ConflictPolicy) -> Action {
    match (existing, policy) {
        (None, _) => Action::Create,
        (Some(existing), ConflictPolicy::Overwrite) => Action::Overwrite(existing),
        (Some(existing), ConflictPolicy::Skip) => Action::Skip(existing),
    }
}
