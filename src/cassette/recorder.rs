//! Records interactions into a cassette file.

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::Utc;

use super::format::{Cassette, Interaction};
use super::CassetteError;

/// Records interactions and writes them as a YAML cassette file.
#[derive(Debug)]
pub struct CassetteRecorder {
    path: PathBuf,
    name: String,
    metadata: BTreeMap<String, String>,
    interactions: Vec<Interaction>,
    next_seq: u64,
}

impl CassetteRecorder {
    /// Create a new recorder that will write to the given path.
    pub fn new(path: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            metadata: BTreeMap::new(),
            interactions: Vec::new(),
            next_seq: 0,
        }
    }

    /// Attach a run parameter to the cassette.
    pub fn set_metadata(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.metadata.insert(key.into(), value.into());
    }

    /// Record an interaction. The `seq` field is assigned automatically.
    pub fn record(
        &mut self,
        port: impl Into<String>,
        method: impl Into<String>,
        input: serde_json::Value,
        output: serde_json::Value,
    ) {
        let interaction = Interaction {
            seq: self.next_seq,
            port: port.into(),
            method: method.into(),
            input,
            output,
        };
        self.next_seq += 1;
        self.interactions.push(interaction);
    }

    /// Number of interactions recorded so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.interactions.len()
    }

    /// Returns `true` if nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.interactions.is_empty()
    }

    /// Write the cassette YAML file to disk, creating parent directories.
    ///
    /// The recorder stays usable; a later call rewrites the file.
    ///
    /// # Errors
    ///
    /// Returns [`CassetteError::Io`] if the file cannot be written.
    pub fn write(&self) -> Result<PathBuf, CassetteError> {
        let io_err = |source| CassetteError::Io { path: self.path.clone(), source };
        let cassette = Cassette {
            name: self.name.clone(),
            recorded_at: Utc::now(),
            metadata: self.metadata.clone(),
            interactions: self.interactions.clone(),
        };
        let yaml = serde_yaml::to_string(&cassette)
            .map_err(|e| io_err(std::io::Error::other(e)))?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        std::fs::write(&self.path, yaml).map_err(io_err)?;
        Ok(self.path.clone())
    }
}
