//! Indexer access.
//!
//! The wire protocol lives behind the `IndexerGateway` trait. This module
//! adds the shared per-indexer state the engine keeps around it: a circuit
//! breaker for failing indexers, request throttling, and RSS cursors.

mod circuit_breaker;
mod cursor;
mod query;
mod sqlite_cursor;
mod throttle;
mod types;

pub use circuit_breaker::{CircuitBreaker, InMemoryCircuitBreaker};
pub use cursor::{CursorError, InMemoryRssCursorStore, RssCursorStore};
pub use query::{build_query, categories_for};
pub use sqlite_cursor::SqliteRssCursorStore;
pub use throttle::{IndexerThrottle, TokenBucket};
pub use types::*;
