//! Binary entrypoint for the `corplink` CLI.

use std::process::ExitCode;

fn main() -> ExitCode {
    // Recording is handled by `migrate --record` or CORPLINK_RECORD=<file>.
    match corplink::run(std::env::args()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}
