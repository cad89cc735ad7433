//! Migration run configuration.
//!
//! Values are layered, lowest precedence first: built-in defaults, an
//! optional YAML config file, environment variables, then command-line
//! overrides.

use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;

use clap::ValueEnum;
use serde::Deserialize;
use thiserror::Error;

use crate::adapters::live::graph::DEFAULT_GRAPH_URL;
use crate::migrate::ConflictPolicy;

/// Default number of records migrated concurrently.
pub const DEFAULT_CONCURRENCY: usize = 5;

/// Environment variable names.
pub mod env_keys {
    /// Source store kind.
    pub const SOURCE_TYPE: &str = "LINK_MIGRATION_SOURCE_TYPE";
    /// Source store location.
    pub const SOURCE_PATH: &str = "LINK_MIGRATION_SOURCE_PATH";
    /// Destination store kind.
    pub const DESTINATION_TYPE: &str = "LINK_MIGRATION_DESTINATION_TYPE";
    /// Destination store location.
    pub const DESTINATION_PATH: &str = "LINK_MIGRATION_DESTINATION_PATH";
    /// Conflict policy (`overwrite` or `skip`).
    pub const OVERWRITE: &str = "LINK_MIGRATION_OVERWRITE";
    /// Maximum records in flight.
    pub const CONCURRENCY: &str = "LINK_MIGRATION_CONCURRENCY";
    /// Directory backend kind.
    pub const DIRECTORY_TYPE: &str = "LINK_MIGRATION_DIRECTORY_TYPE";
    /// Directory table path for the `file` backend.
    pub const DIRECTORY_PATH: &str = "LINK_MIGRATION_DIRECTORY_PATH";
    /// Graph endpoint for the `graph` backend.
    pub const GRAPH_URL: &str = "LINK_MIGRATION_GRAPH_URL";
    /// Bearer token for the `graph` backend.
    pub const GRAPH_TOKEN: &str = "LINK_MIGRATION_GRAPH_TOKEN";
}

/// Configuration problems detected before a run starts.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config file {path}: {message}")]
    Read {
        /// Config file path.
        path: PathBuf,
        /// Underlying error.
        message: String,
    },
    /// The config file is not valid YAML for this schema.
    #[error("failed to parse config file {path}: {message}")]
    Parse {
        /// Config file path.
        path: PathBuf,
        /// Underlying error.
        message: String,
    },
    /// A setting has a value outside its domain.
    #[error("invalid value {value:?} for {key}: {reason}")]
    InvalidValue {
        /// Setting name.
        key: String,
        /// Offending value.
        value: String,
        /// What was expected.
        reason: String,
    },
    /// A setting required by the selected backends is absent.
    #[error("missing required setting {0}")]
    Missing(String),
    /// Source and destination point at the same store.
    #[error("source and destination are the same store ({0})")]
    SameStore(String),
}

/// Backing technology of a link store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(try_from = "String")]
pub enum StoreKind {
    /// Single YAML document on disk.
    Yaml,
    /// SQLite database.
    Sqlite,
}

impl fmt::Display for StoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Yaml => "yaml",
            Self::Sqlite => "sqlite",
        })
    }
}

impl FromStr for StoreKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "yaml" | "yml" => Ok(Self::Yaml),
            "sqlite" | "sqlite3" => Ok(Self::Sqlite),
            _ => Err("expected yaml or sqlite".to_string()),
        }
    }
}

/// Backing service of the corporate directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(try_from = "String")]
pub enum DirectoryKind {
    /// Microsoft Graph style HTTP user lookup.
    Graph,
    /// Static YAML table.
    File,
}

impl FromStr for DirectoryKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "graph" => Ok(Self::Graph),
            "file" => Ok(Self::File),
            _ => Err("expected graph or file".to_string()),
        }
    }
}

impl TryFrom<String> for StoreKind {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl TryFrom<String> for DirectoryKind {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Where a link store lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Backing technology.
    pub kind: StoreKind,
    /// File or database path.
    pub path: PathBuf,
}

impl StoreConfig {
    /// Whether `self` and `other` name the same store once relative paths
    /// are resolved against the working directory and `.`/`..` are folded.
    #[must_use]
    pub fn same_store(&self, other: &Self) -> bool {
        self.kind == other.kind && normalize(&self.path) == normalize(&other.path)
    }
}

/// Lexically absolute form of `path`; the file need not exist.
fn normalize(path: &Path) -> PathBuf {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir().map_or_else(|_| path.to_path_buf(), |cwd| cwd.join(path))
    };
    let mut out = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }
    out
}

impl fmt::Display for StoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.path.display())
    }
}

/// How corporate ids are resolved.
#[derive(Clone, PartialEq, Eq)]
pub struct DirectoryConfig {
    /// Backing service.
    pub kind: DirectoryKind,
    /// Graph endpoint (used by [`DirectoryKind::Graph`]).
    pub url: String,
    /// Graph bearer token (used by [`DirectoryKind::Graph`]).
    pub token: Option<String>,
    /// Table path (used by [`DirectoryKind::File`]).
    pub path: Option<PathBuf>,
}

impl fmt::Debug for DirectoryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DirectoryConfig")
            .field("kind", &self.kind)
            .field("url", &self.url)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("path", &self.path)
            .finish()
    }
}

/// Everything one migration run needs to know.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationConfig {
    /// Store links are read from.
    pub source: StoreConfig,
    /// Store links are written to.
    pub destination: StoreConfig,
    /// Identity resolution backend.
    pub directory: DirectoryConfig,
    /// Handling of links already present at the destination.
    pub on_conflict: ConflictPolicy,
    /// Maximum records in flight at once.
    pub concurrency: usize,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            source: StoreConfig { kind: StoreKind::Yaml, path: PathBuf::from("links.yaml") },
            destination: StoreConfig { kind: StoreKind::Sqlite, path: PathBuf::from("links.db") },
            directory: DirectoryConfig {
                kind: DirectoryKind::Graph,
                url: DEFAULT_GRAPH_URL.to_string(),
                token: None,
                path: None,
            },
            on_conflict: ConflictPolicy::default(),
            concurrency: DEFAULT_CONCURRENCY,
        }
    }
}

/// Command-line values that take precedence over every other layer.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    /// Source store kind.
    pub source_kind: Option<StoreKind>,
    /// Source store path.
    pub source_path: Option<PathBuf>,
    /// Destination store kind.
    pub destination_kind: Option<StoreKind>,
    /// Destination store path.
    pub destination_path: Option<PathBuf>,
    /// Directory backend kind.
    pub directory_kind: Option<DirectoryKind>,
    /// Directory table path.
    pub directory_path: Option<PathBuf>,
    /// Conflict policy.
    pub on_conflict: Option<ConflictPolicy>,
    /// Concurrency ceiling.
    pub concurrency: Option<usize>,
}

/// Config file schema; every field is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct FileConfig {
    source: Option<FileStore>,
    destination: Option<FileStore>,
    directory: Option<FileDirectory>,
    on_conflict: Option<ConflictPolicy>,
    concurrency: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileStore {
    kind: Option<StoreKind>,
    path: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileDirectory {
    kind: Option<DirectoryKind>,
    url: Option<String>,
    token: Option<String>,
    path: Option<PathBuf>,
}

impl MigrationConfig {
    /// Builds the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if any layer is unreadable or the result is invalid.
    pub fn from_process_env(
        file: Option<&Path>,
        overrides: &ConfigOverrides,
    ) -> Result<Self, ConfigError> {
        Self::load(file, |key| std::env::var(key).ok(), overrides)
    }

    /// Builds the configuration from defaults, `file`, `env` and `overrides`,
    /// then validates it.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if any layer is unreadable or the result is invalid.
    pub fn load<F>(
        file: Option<&Path>,
        env: F,
        overrides: &ConfigOverrides,
    ) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(path) = file {
            config.apply_file(path)?;
        }
        config.apply_env(&env)?;
        config.apply_overrides(overrides);
        config.validate()?;
        Ok(config)
    }

    fn apply_file(&mut self, path: &Path) -> Result<(), ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let file: FileConfig = if contents.trim().is_empty() {
            FileConfig::default()
        } else {
            serde_yaml::from_str(&contents).map_err(|e| ConfigError::Parse {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?
        };

        if let Some(store) = file.source {
            merge_store(&mut self.source, store);
        }
        if let Some(store) = file.destination {
            merge_store(&mut self.destination, store);
        }
        if let Some(directory) = file.directory {
            if let Some(kind) = directory.kind {
                self.directory.kind = kind;
            }
            if let Some(url) = directory.url {
                self.directory.url = url;
            }
            self.directory.token = directory.token.or(self.directory.token.take());
            self.directory.path = directory.path.or(self.directory.path.take());
        }
        if let Some(policy) = file.on_conflict {
            self.on_conflict = policy;
        }
        if let Some(concurrency) = file.concurrency {
            self.concurrency = concurrency;
        }
        Ok(())
    }

    fn apply_env<F>(&mut self, env: &F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| env(key).filter(|v| !v.trim().is_empty());

        if let Some(kind) = get(env_keys::SOURCE_TYPE) {
            self.source.kind = parse_value(env_keys::SOURCE_TYPE, &kind)?;
        }
        if let Some(path) = get(env_keys::SOURCE_PATH) {
            self.source.path = PathBuf::from(path);
        }
        if let Some(kind) = get(env_keys::DESTINATION_TYPE) {
            self.destination.kind = parse_value(env_keys::DESTINATION_TYPE, &kind)?;
        }
        if let Some(path) = get(env_keys::DESTINATION_PATH) {
            self.destination.path = PathBuf::from(path);
        }
        if let Some(policy) = get(env_keys::OVERWRITE) {
            self.on_conflict = parse_value(env_keys::OVERWRITE, &policy)?;
        }
        if let Some(concurrency) = get(env_keys::CONCURRENCY) {
            self.concurrency = concurrency.trim().parse().map_err(|_| ConfigError::InvalidValue {
                key: env_keys::CONCURRENCY.to_string(),
                value: concurrency.clone(),
                reason: "expected a positive integer".to_string(),
            })?;
        }
        if let Some(kind) = get(env_keys::DIRECTORY_TYPE) {
            self.directory.kind = parse_value(env_keys::DIRECTORY_TYPE, &kind)?;
        }
        if let Some(path) = get(env_keys::DIRECTORY_PATH) {
            self.directory.path = Some(PathBuf::from(path));
        }
        if let Some(url) = get(env_keys::GRAPH_URL) {
            self.directory.url = url;
        }
        if let Some(token) = get(env_keys::GRAPH_TOKEN) {
            self.directory.token = Some(token);
        }
        Ok(())
    }

    fn apply_overrides(&mut self, overrides: &ConfigOverrides) {
        if let Some(kind) = overrides.source_kind {
            self.source.kind = kind;
        }
        if let Some(path) = &overrides.source_path {
            self.source.path.clone_from(path);
        }
        if let Some(kind) = overrides.destination_kind {
            self.destination.kind = kind;
        }
        if let Some(path) = &overrides.destination_path {
            self.destination.path.clone_from(path);
        }
        if let Some(kind) = overrides.directory_kind {
            self.directory.kind = kind;
        }
        if let Some(path) = &overrides.directory_path {
            self.directory.path = Some(path.clone());
        }
        if let Some(policy) = overrides.on_conflict {
            self.on_conflict = policy;
        }
        if let Some(concurrency) = overrides.concurrency {
            self.concurrency = concurrency;
        }
    }

    /// Checks cross-field constraints.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] describing the first violated constraint.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.concurrency == 0 {
            return Err(ConfigError::InvalidValue {
                key: "concurrency".to_string(),
                value: "0".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if self.source.same_store(&self.destination) {
            return Err(ConfigError::SameStore(self.source.to_string()));
        }
        match self.directory.kind {
            DirectoryKind::Graph if self.directory.token.is_none() => {
                Err(ConfigError::Missing(env_keys::GRAPH_TOKEN.to_string()))
            }
            DirectoryKind::File if self.directory.path.is_none() => {
                Err(ConfigError::Missing(env_keys::DIRECTORY_PATH.to_string()))
            }
            _ => Ok(()),
        }
    }
}

fn merge_store(target: &mut StoreConfig, layer: FileStore) {
    if let Some(kind) = layer.kind {
        target.kind = kind;
    }
    if let Some(path) = layer.path {
        target.path = path;
    }
}

fn parse_value<T>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr<Err = String>,
{
    value.parse().map_err(|reason| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
        reason,
    })
}
