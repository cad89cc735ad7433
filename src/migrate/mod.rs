//! Link migration: conflict policy, per-record pipeline, fan-out engine and
//! run report.

pub mod engine;
pub mod pipeline;
pub mod plan;
pub mod policy;
pub mod report;

pub use engine::{MigrationError, Reconciler};
pub use pipeline::{RecordOutcome, Stage};
pub use plan::{PlannedAction, PlannedStep};
pub use policy::{plan_action, Action, ConflictPolicy};
pub use report::{Failure, RunReport};
