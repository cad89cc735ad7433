//! Clock port used to timestamp migration runs.

use chrono::{DateTime, Utc};

/// Source of wall-clock time for run reports.
///
/// Replayed runs substitute the recorded timestamps so their reports match.
pub trait Clock: Send + Sync {
    /// Returns the current UTC time.
    fn now(&self) -> DateTime<Utc>;
}
