//! Replaying adapter for the Clock port.

use chrono::{DateTime, Utc};

use super::{next_output, SharedReplayer};
use crate::ports::clock::Clock;

/// Replays recorded clock values from a cassette.
pub struct ReplayingClock {
    replayer: SharedReplayer,
}

impl ReplayingClock {
    /// Creates a new replaying clock from a shared cassette replayer.
    #[must_use]
    pub fn new(replayer: SharedReplayer) -> Self {
        Self { replayer }
    }
}

impl Clock for ReplayingClock {
    /// # Panics
    ///
    /// Panics if the cassette holds no further clock reading, since the
    /// port has no error channel.
    fn now(&self) -> DateTime<Utc> {
        let output = next_output(&self.replayer, "clock", "now", &())
            .unwrap_or_else(|e| panic!("clock::now: {e}"));
        serde_json::from_value(output)
            .unwrap_or_else(|e| panic!("clock::now: failed to deserialize DateTime<Utc>: {e}"))
    }
}
