//! Command dispatch and handlers.

pub mod migrate;
pub mod replay;

use crate::cli::Command;
use crate::context::ServiceContext;
use crate::migrate::plan::format_plan;
use crate::migrate::{ConflictPolicy, Reconciler};

/// Environment variable naming a cassette to record `migrate` into.
pub const RECORD_ENV: &str = "CORPLINK_RECORD";

/// Dispatch a parsed command to its handler.
///
/// # Errors
///
/// Returns an error string if the selected command handler fails.
pub fn dispatch(command: &Command) -> Result<(), String> {
    match command {
        Command::Migrate(args) => migrate::run(args),
        Command::Replay { cassette } => replay::run(cassette),
    }
}

/// Runs (or plans) a migration over `ctx` and prints the result to stdout.
///
/// Per-record failures are part of the printed report and do not make this
/// fail; only errors that prevent a report do.
fn execute(
    ctx: &ServiceContext,
    policy: ConflictPolicy,
    concurrency: usize,
    dry_run: bool,
) -> Result<(), String> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("failed to start async runtime: {e}"))?;
    let engine = Reconciler::new(ctx, policy, concurrency);

    if dry_run {
        let plan = runtime.block_on(engine.plan()).map_err(|e| e.to_string())?;
        println!("{}", format_plan(&plan));
    } else {
        let report = runtime.block_on(engine.run()).map_err(|e| e.to_string())?;
        println!("{report}");
    }
    Ok(())
}
