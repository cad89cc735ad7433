//! Replaying adapters that serve recorded interactions instead of calling out.

pub mod clock;
pub mod directory;
pub mod link_store;

pub use clock::ReplayingClock;
pub use directory::ReplayingDirectory;
pub use link_store::ReplayingLinkStore;

use std::sync::{Arc, Mutex, PoisonError};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::cassette::replayer::CassetteReplayer;
use crate::cassette::CassetteError;

/// Replayer handle shared by every replaying adapter of one run.
pub type SharedReplayer = Arc<Mutex<CassetteReplayer>>;

/// Take the recorded output for a call.
///
/// Mirror of `recording::record_interaction`.
pub(crate) fn next_output<I: Serialize>(
    replayer: &SharedReplayer,
    port: &str,
    method: &str,
    input: &I,
) -> Result<Value, CassetteError> {
    let input = serde_json::to_value(input).map_err(|e| CassetteError::Decode {
        port: port.to_string(),
        method: method.to_string(),
        message: e.to_string(),
    })?;
    let mut guard = replayer.lock().unwrap_or_else(PoisonError::into_inner);
    guard.next_interaction(port, method, &input).map(|interaction| interaction.output)
}

/// Turn a recorded `{"Ok": v}` / `{"Err": e}` output back into a `Result`.
///
/// Mirror of `recording::record_result`. Cassette problems are reported
/// through `cassette_err` in the port's own error type.
pub(crate) fn replay_result<T, E>(
    port: &str,
    method: &str,
    output: Result<Value, CassetteError>,
    cassette_err: impl FnOnce(String) -> E,
) -> Result<T, E>
where
    T: DeserializeOwned,
    E: DeserializeOwned,
{
    let decode = |message: String| CassetteError::Decode {
        port: port.to_string(),
        method: method.to_string(),
        message,
    };
    let decoded = output.and_then(|output| match output {
        Value::Object(mut map) => {
            if let Some(ok) = map.remove("Ok") {
                serde_json::from_value::<T>(ok).map(Ok).map_err(|e| decode(e.to_string()))
            } else if let Some(err) = map.remove("Err") {
                serde_json::from_value::<E>(err).map(Err).map_err(|e| decode(e.to_string()))
            } else {
                Err(decode("expected an Ok or Err entry".to_string()))
            }
        }
        other => Err(decode(format!("expected an Ok or Err entry, found {other}"))),
    });
    match decoded {
        Ok(result) => result,
        Err(e) => Err(cassette_err(e.to_string())),
    }
}
