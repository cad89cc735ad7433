//! Cassette data structures for recording and replaying interactions.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::CassetteError;

/// A single recorded interaction with an external port.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Interaction {
    /// Sequence number in recording order.
    pub seq: u64,
    /// Port name (`source`, `destination`, `directory`, `clock`).
    pub port: String,
    /// Method name invoked on the port.
    pub method: String,
    /// Input data sent to the port.
    pub input: serde_json::Value,
    /// Output data returned from the port.
    pub output: serde_json::Value,
}

/// A recorded migration run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Cassette {
    /// Human-readable name for this cassette.
    pub name: String,
    /// When this cassette was recorded.
    pub recorded_at: DateTime<Utc>,
    /// Run parameters needed to reproduce the run.
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
    /// Interactions in recording order.
    pub interactions: Vec<Interaction>,
}

impl Cassette {
    /// Reads a cassette from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`CassetteError::Io`] or [`CassetteError::Parse`].
    pub fn load(path: &Path) -> Result<Self, CassetteError> {
        let content = std::fs::read_to_string(path)
            .map_err(|source| CassetteError::Io { path: path.to_path_buf(), source })?;
        serde_yaml::from_str(&content).map_err(|e| CassetteError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn loads_written_cassette_with_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.cassette.yaml");
        let cassette = Cassette {
            name: "migration".into(),
            recorded_at: Utc::now(),
            metadata: BTreeMap::from([("concurrency".to_string(), "5".to_string())]),
            interactions: vec![Interaction {
                seq: 0,
                port: "directory".into(),
                method: "resolve_corporate_id".into(),
                input: json!("alice@corp"),
                output: json!({"Ok": "C1"}),
            }],
        };
        std::fs::write(&path, serde_yaml::to_string(&cassette).unwrap()).unwrap();

        let loaded = Cassette::load(&path).unwrap();
        assert_eq!(loaded, cassette);
    }

    #[test]
    fn metadata_is_optional() {
        let yaml = "name: old\nrecordedAt: 2024-06-15T10:30:00Z\ninteractions: []\n";
        let cassette: Cassette = serde_yaml::from_str(yaml).unwrap();
        assert!(cassette.metadata.is_empty());
    }

    #[test]
    fn garbage_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.yaml");
        std::fs::write(&path, "interactions: {").unwrap();
        assert!(matches!(Cassette::load(&path), Err(CassetteError::Parse { .. })));
    }
}
