//! Local todo cache for fast startup and offline reads.
//!
//! Todos are persisted keyed by id, with a secondary index on the owning
//! user. The cache is best-effort: every failure is reported and degraded
//! to a miss, never surfaced as an application error.

mod storage;

pub use storage::{CacheStorage, NoopStorage, SqliteStorage};
