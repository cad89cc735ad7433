//! Recording adapter for the `Directory` port.

use std::sync::Arc;

use super::{record_result, SharedRecorder};
use crate::ports::{Directory, DirectoryFuture};

/// Records directory lookups while delegating to an inner implementation.
pub struct RecordingDirectory {
    inner: Arc<dyn Directory>,
    recorder: SharedRecorder,
}

impl RecordingDirectory {
    /// Creates a new recording directory wrapping the given implementation.
    pub fn new(inner: Arc<dyn Directory>, recorder: SharedRecorder) -> Self {
        Self { inner, recorder }
    }
}

impl Directory for RecordingDirectory {
    fn resolve_corporate_id<'a>(&'a self, username: &'a str) -> DirectoryFuture<'a> {
        Box::pin(async move {
            let result = self.inner.resolve_corporate_id(username).await;
            record_result(&self.recorder, "directory", "resolve_corporate_id", &username, &result);
            result
        })
    }
}
