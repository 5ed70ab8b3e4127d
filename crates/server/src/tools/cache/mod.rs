//! Cache inspection MCP tools.
//!
//! Read-only views of the cache store; neither tool touches the network.

pub mod keys;
pub mod matching;

pub use keys::keys_impl;
pub use matching::{CacheMatchParams, match_impl};
