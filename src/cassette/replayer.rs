//! Replays recorded interactions from a cassette.

use std::collections::{HashMap, VecDeque};

use super::format::{Cassette, Interaction};
use super::CassetteError;

/// Key for matching a call against the recording.
///
/// Calls from concurrent records interleave differently on every run, so
/// interactions are matched on their input as well as port and method.
#[derive(Debug, Clone, Hash, Eq, PartialEq)]
struct CallKey {
    port: String,
    method: String,
    input: String,
}

impl CallKey {
    fn new(port: &str, method: &str, input: &serde_json::Value) -> Self {
        Self { port: port.to_string(), method: method.to_string(), input: input.to_string() }
    }
}

/// Serves recorded interactions, in recording order per identical call.
pub struct CassetteReplayer {
    queues: HashMap<CallKey, VecDeque<Interaction>>,
}

impl CassetteReplayer {
    /// Create a new replayer from a loaded cassette.
    #[must_use]
    pub fn new(cassette: &Cassette) -> Self {
        let mut queues: HashMap<CallKey, VecDeque<Interaction>> = HashMap::new();
        for interaction in &cassette.interactions {
            let key = CallKey::new(&interaction.port, &interaction.method, &interaction.input);
            queues.entry(key).or_default().push_back(interaction.clone());
        }
        Self { queues }
    }

    /// Take the next recorded interaction for this exact call.
    ///
    /// # Errors
    ///
    /// Returns [`CassetteError::Exhausted`] if no matching interaction remains.
    pub fn next_interaction(
        &mut self,
        port: &str,
        method: &str,
        input: &serde_json::Value,
    ) -> Result<Interaction, CassetteError> {
        let key = CallKey::new(port, method, input);
        self.queues.get_mut(&key).and_then(VecDeque::pop_front).ok_or_else(|| {
            CassetteError::Exhausted {
                port: port.to_string(),
                method: method.to_string(),
                input: key.input,
            }
        })
    }

    /// Number of recorded interactions not yet served.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.queues.values().map(VecDeque::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    fn interaction(seq: u64, port: &str, input: serde_json::Value, output: &str) -> Interaction {
        Interaction {
            seq,
            port: port.into(),
            method: "get_by_external_id".into(),
            input,
            output: json!(output),
        }
    }

    fn make_cassette(interactions: Vec<Interaction>) -> Cassette {
        Cassette {
            name: "test".into(),
            recorded_at: Utc::now(),
            metadata: Default::default(),
            interactions,
        }
    }

    #[test]
    fn matches_calls_by_input_regardless_of_order() {
        let cassette = make_cassette(vec![
            interaction(0, "destination", json!("1"), "first"),
            interaction(1, "destination", json!("2"), "second"),
        ]);
        let mut replayer = CassetteReplayer::new(&cassette);

        let b = replayer.next_interaction("destination", "get_by_external_id", &json!("2")).unwrap();
        assert_eq!(b.seq, 1);
        let a = replayer.next_interaction("destination", "get_by_external_id", &json!("1")).unwrap();
        assert_eq!(a.seq, 0);
        assert_eq!(replayer.remaining(), 0);
    }

    #[test]
    fn repeated_calls_are_served_in_recording_order() {
        let cassette = make_cassette(vec![
            interaction(0, "source", json!("1"), "a"),
            interaction(1, "source", json!("1"), "b"),
        ]);
        let mut replayer = CassetteReplayer::new(&cassette);
        let input = json!("1");
        assert_eq!(replayer.next_interaction("source", "get_by_external_id", &input).unwrap().output, json!("a"));
        assert_eq!(replayer.next_interaction("source", "get_by_external_id", &input).unwrap().output, json!("b"));
    }

    #[test]
    fn exhausted_or_unknown_calls_are_errors() {
        let cassette = make_cassette(vec![interaction(0, "source", json!("1"), "a")]);
        let mut replayer = CassetteReplayer::new(&cassette);
        let input = json!("1");
        replayer.next_interaction("source", "get_by_external_id", &input).unwrap();

        let err = replayer.next_interaction("source", "get_by_external_id", &input).unwrap_err();
        assert!(err.to_string().contains("cassette exhausted"));
        let err = replayer.next_interaction("destination", "get_by_external_id", &json!("9")).unwrap_err();
        assert!(matches!(err, CassetteError::Exhausted { ref port, .. } if port == "destination"));
    }
}
