//! `corplink migrate`: copy links from the source store to the destination.

use std::env;
use std::path::PathBuf;

use tracing::{debug, info};

use super::{execute, RECORD_ENV};
use crate::cli::MigrateArgs;
use crate::config::MigrationConfig;
use crate::context::{ServiceContext, META_DRY_RUN};

/// Resolve configuration, open the ports and run the migration.
///
/// A `.env` file in the working directory is loaded first; variables already
/// set in the environment take precedence over it.
///
/// # Errors
///
/// Returns an error string if configuration is invalid, a port cannot be
/// opened, the source cannot be enumerated, or a requested cassette cannot
/// be written.
pub fn run(args: &MigrateArgs) -> Result<(), String> {
    if let Ok(path) = dotenvy::dotenv() {
        debug!(path = %path.display(), "loaded environment file");
    }
    let config = MigrationConfig::from_process_env(args.config.as_deref(), &args.overrides())
        .map_err(|e| e.to_string())?;
    info!(
        source = %config.source,
        destination = %config.destination,
        on_conflict = %config.on_conflict,
        concurrency = config.concurrency,
        "configuration resolved"
    );

    let record = args.record.clone().or_else(|| env::var_os(RECORD_ENV).map(PathBuf::from));
    let mut ctx = match &record {
        Some(path) => ServiceContext::recording(&config, path),
        None => ServiceContext::live(&config),
    }
    .map_err(|e| e.to_string())?;
    if args.dry_run {
        ctx.annotate_recording(META_DRY_RUN, "true");
    }

    execute(&ctx, config.on_conflict, config.concurrency, args.dry_run)?;
    if let Some(path) = ctx.flush_recording().map_err(|e| e.to_string())? {
        info!(path = %path.display(), "cassette written");
    }
    Ok(())
}
