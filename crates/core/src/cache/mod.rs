//! Generation-keyed response cache.
//!
//! Cached responses live in named generations. The agent only ever writes to
//! the current generation, but lookups span every generation present in the
//! store, oldest first. Two [`CacheStore`] implementations are provided:
//!
//! - [`CacheDb`]: persistent SQLite store via tokio-rusqlite (WAL mode,
//!   versioned migrations, cascade delete of a generation's entries)
//! - [`MemoryStore`]: in-process store used by tests and ephemeral hosts

pub mod connection;
pub mod entries;
pub mod key;
pub mod memory;
pub mod migrations;
pub mod store;

pub use crate::Error;

pub use connection::CacheDb;
pub use key::{CacheKey, resolve_asset};
pub use memory::MemoryStore;
pub use store::CacheStore;
