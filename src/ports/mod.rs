//! Port traits defining external boundaries.
//!
//! Each trait represents a boundary between the migration core and an
//! external system (time, link stores, the corporate directory).
//! Implementations live in `src/adapters/`.

pub mod clock;
pub mod directory;
pub mod link_store;

pub use clock::Clock;
pub use directory::{Directory, DirectoryError, DirectoryFuture};
pub use link_store::{LinkStore, StoreError, StoreFuture};
