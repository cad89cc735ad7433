//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::{ConfigOverrides, DirectoryKind, StoreKind};
use crate::migrate::ConflictPolicy;

/// Top-level CLI parser for `corplink`.
#[derive(Debug, Parser)]
#[command(name = "corplink", version, about = "Migrate corporate identity links between stores")]
pub struct Cli {
    /// Log at debug level (`RUST_LOG` overrides).
    #[arg(short, long, global = true)]
    pub verbose: bool,
    /// The command to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Supported top-level subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Copy every link from the source store into the destination store.
    Migrate(MigrateArgs),
    /// Re-run a recorded migration from its cassette.
    Replay {
        /// Cassette written by `migrate --record`.
        cassette: PathBuf,
    },
}

/// Options for `migrate`. Flags override the config file and environment.
#[derive(Debug, Args, Default)]
pub struct MigrateArgs {
    /// YAML config file.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
    /// Source store kind.
    #[arg(long, value_enum, ignore_case = true)]
    pub source_kind: Option<StoreKind>,
    /// Source store path.
    #[arg(long, value_name = "PATH")]
    pub source: Option<PathBuf>,
    /// Destination store kind.
    #[arg(long, value_enum, ignore_case = true)]
    pub destination_kind: Option<StoreKind>,
    /// Destination store path.
    #[arg(long, value_name = "PATH")]
    pub destination: Option<PathBuf>,
    /// Directory backend.
    #[arg(long, value_enum, ignore_case = true)]
    pub directory_kind: Option<DirectoryKind>,
    /// Directory table for the `file` backend.
    #[arg(long, value_name = "PATH")]
    pub directory: Option<PathBuf>,
    /// What to do with links the destination already has.
    #[arg(long, value_enum, ignore_case = true)]
    pub on_conflict: Option<ConflictPolicy>,
    /// Maximum links migrated at once.
    #[arg(long, value_name = "N")]
    pub concurrency: Option<usize>,
    /// Print the planned actions without writing anything.
    #[arg(long)]
    pub dry_run: bool,
    /// Record every store and directory call to this cassette.
    #[arg(long, value_name = "FILE")]
    pub record: Option<PathBuf>,
}

impl MigrateArgs {
    /// The configuration layer these flags contribute.
    #[must_use]
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            source_kind: self.source_kind,
            source_path: self.source.clone(),
            destination_kind: self.destination_kind,
            destination_path: self.destination.clone(),
            directory_kind: self.directory_kind,
            directory_path: self.directory.clone(),
            on_conflict: self.on_conflict,
            concurrency: self.concurrency,
        }
    }
}
