//! `corplink replay`: re-run a recorded migration offline.

use std::path::Path;

use crate::cassette::format::Cassette;
use crate::config::DEFAULT_CONCURRENCY;
use crate::context::{ServiceContext, META_CONCURRENCY, META_DRY_RUN, META_ON_CONFLICT};
use crate::migrate::ConflictPolicy;

use super::execute;

/// Replay the run recorded in `cassette_path` with its recorded parameters.
///
/// # Errors
///
/// Returns an error string if the cassette cannot be loaded or its metadata
/// is invalid.
pub fn run(cassette_path: &Path) -> Result<(), String> {
    let cassette = Cassette::load(cassette_path).map_err(|e| e.to_string())?;
    let (policy, concurrency, dry_run) = parameters(&cassette)?;
    let ctx = ServiceContext::replaying(&cassette);
    execute(&ctx, policy, concurrency, dry_run)
}

fn parameters(cassette: &Cassette) -> Result<(ConflictPolicy, usize, bool), String> {
    let meta = |key: &str| cassette.metadata.get(key).map(String::as_str);
    let policy = meta(META_ON_CONFLICT)
        .map(str::parse::<ConflictPolicy>)
        .transpose()
        .map_err(|e| format!("invalid cassette metadata {META_ON_CONFLICT}: {e}"))?
        .unwrap_or_default();
    let concurrency = meta(META_CONCURRENCY)
        .map(str::parse::<usize>)
        .transpose()
        .map_err(|e| format!("invalid cassette metadata {META_CONCURRENCY}: {e}"))?
        .unwrap_or(DEFAULT_CONCURRENCY);
    let dry_run = meta(META_DRY_RUN) == Some("true");
    Ok((policy, concurrency, dry_run))
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::Utc;

    use super::*;

    fn cassette(metadata: &[(&str, &str)]) -> Cassette {
        Cassette {
            name: "test".into(),
            recorded_at: Utc::now(),
            metadata: metadata.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect::<BTreeMap<_, _>>(),
            interactions: Vec::new(),
        }
    }

    #[test]
    fn reads_recorded_parameters() {
        let recorded = cassette(&[
            (META_ON_CONFLICT, "overwrite"),
            (META_CONCURRENCY, "3"),
            (META_DRY_RUN, "true"),
        ]);
        assert_eq!(parameters(&recorded), Ok((ConflictPolicy::Overwrite, 3, true)));
    }

    #[test]
    fn missing_metadata_falls_back_to_defaults() {
        assert_eq!(
            parameters(&cassette(&[])),
            Ok((ConflictPolicy::Skip, DEFAULT_CONCURRENCY, false))
        );
    }

    #[test]
    fn invalid_metadata_is_an_error() {
        let err = parameters(&cassette(&[(META_CONCURRENCY, "lots")])).unwrap_err();
        assert!(err.contains(META_CONCURRENCY));
    }

    #[test]
    fn missing_cassette_is_an_error() {
        let err = run(Path::new("/nonexistent/corplink/run.cassette.yaml")).unwrap_err();
        assert!(err.contains("cassette"));
    }
}
