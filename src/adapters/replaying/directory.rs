//! Replaying adapter for the `Directory` port.

use super::{next_output, replay_result, SharedReplayer};
use crate::ports::{Directory, DirectoryError, DirectoryFuture};

/// Serves recorded directory lookups from a cassette.
pub struct ReplayingDirectory {
    replayer: SharedReplayer,
}

impl ReplayingDirectory {
    /// Create a replaying directory backed by the given replayer.
    #[must_use]
    pub fn new(replayer: SharedReplayer) -> Self {
        Self { replayer }
    }
}

impl Directory for ReplayingDirectory {
    fn resolve_corporate_id<'a>(&'a self, username: &'a str) -> DirectoryFuture<'a> {
        let output = next_output(&self.replayer, "directory", "resolve_corporate_id", &username);
        Box::pin(async move {
            replay_result("directory", "resolve_corporate_id", output, DirectoryError::Unavailable)
        })
    }
}
