//! Port implementations.
//!
//! `live` talks to real stores and services, `recording` wraps live adapters
//! and captures every call to a cassette, `replaying` serves calls back from a
//! cassette, and `memory` is an in-process store for unit tests.

pub mod live;
#[cfg(test)]
pub mod memory;
pub mod recording;
pub mod replaying;
