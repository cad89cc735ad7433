//! Dry-run planning: what a migration would do, without doing it.

use std::fmt;

use serde::Serialize;

use super::policy::{plan_action, Action, ConflictPolicy};
use crate::link::CorporateLink;
use crate::ports::LinkStore;

/// Step a migration would take for one link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum PlannedStep {
    /// No conflict; the link would be created.
    Create,
    /// The destination record would be deleted and recreated.
    Overwrite {
        /// Destination record that would be replaced.
        existing_id: String,
    },
    /// The destination record would be left in place.
    Skip {
        /// Destination record that would be kept.
        existing_id: String,
    },
    /// The destination lookup failed.
    Error {
        /// Lookup failure.
        cause: String,
    },
}

/// Planned handling of one source link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannedAction {
    /// Natural key of the link.
    pub third_party_id: String,
    /// Corporate username used for resolution.
    pub corporate_username: String,
    /// What would happen.
    pub step: PlannedStep,
    /// Whether the corporate id would have to be resolved first.
    pub needs_resolution: bool,
}

impl fmt::Display for PlannedAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:<10} {}", step_label(&self.step), self.third_party_id)?;
        match &self.step {
            PlannedStep::Overwrite { existing_id } => write!(f, " (replaces {existing_id})")?,
            PlannedStep::Skip { existing_id } => write!(f, " (kept {existing_id})")?,
            PlannedStep::Error { cause } => write!(f, ": {cause}")?,
            PlannedStep::Create => {}
        }
        let resolves = matches!(self.step, PlannedStep::Create | PlannedStep::Overwrite { .. });
        if self.needs_resolution && resolves {
            write!(f, " [resolve {}]", self.corporate_username)?;
        }
        Ok(())
    }
}

fn step_label(step: &PlannedStep) -> &'static str {
    match step {
        PlannedStep::Create => "create",
        PlannedStep::Overwrite { .. } => "overwrite",
        PlannedStep::Skip { .. } => "skip",
        PlannedStep::Error { .. } => "error",
    }
}

/// Plans one link by checking the destination only.
pub async fn plan_record(
    link: &CorporateLink,
    destination: &dyn LinkStore,
    policy: ConflictPolicy,
) -> PlannedAction {
    let step = match destination.get_by_external_id(&link.third_party_id).await {
        Ok(existing) => match plan_action(existing, policy) {
            Action::Create => PlannedStep::Create,
            Action::Overwrite(existing) => PlannedStep::Overwrite { existing_id: existing.id },
            Action::Skip(existing) => PlannedStep::Skip { existing_id: existing.id },
        },
        Err(e) => PlannedStep::Error { cause: e.to_string() },
    };
    PlannedAction {
        third_party_id: link.third_party_id.clone(),
        corporate_username: link.corporate_username.clone(),
        step,
        needs_resolution: link.is_incomplete(),
    }
}

/// Renders a plan listing with a totals line.
#[must_use]
pub fn format_plan(actions: &[PlannedAction]) -> String {
    let count = |label: &str| actions.iter().filter(|a| step_label(&a.step) == label).count();
    let mut out = String::new();
    for action in actions {
        out.push_str(&action.to_string());
        out.push('\n');
    }
    out.push_str(&format!(
        "plan: {} create, {} overwrite, {} skip, {} error",
        count("create"),
        count("overwrite"),
        count("skip"),
        count("error")
    ));
    out
}
