//! Cassettes: recorded port interactions that can be replayed offline.

pub mod format;
pub mod recorder;
pub mod replayer;

use std::path::PathBuf;

use thiserror::Error;

/// Failures reading, writing or replaying a cassette.
#[derive(Debug, Error)]
pub enum CassetteError {
    /// The cassette file could not be read or written.
    #[error("cassette i/o error on {path}: {source}")]
    Io {
        /// Cassette path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
    /// The cassette file is not a valid cassette document.
    #[error("failed to parse cassette {path}: {message}")]
    Parse {
        /// Cassette path.
        path: PathBuf,
        /// Underlying error.
        message: String,
    },
    /// A replayed call has no matching recorded interaction left.
    #[error("cassette exhausted: no interaction recorded for {port}::{method} with input {input}")]
    Exhausted {
        /// Port name.
        port: String,
        /// Method name.
        method: String,
        /// Serialized call input.
        input: String,
    },
    /// A recorded output does not match the shape the caller expects.
    #[error("cassette output for {port}::{method} could not be decoded: {message}")]
    Decode {
        /// Port name.
        port: String,
        /// Method name.
        method: String,
        /// Underlying error.
        message: String,
    },
}
