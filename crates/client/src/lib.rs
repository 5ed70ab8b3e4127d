//! Network client for precache.
//!
//! Provides the reqwest-backed [`HttpNetwork`] that the agent uses for
//! pre-caching and cache misses, and that hosts use for pass-through requests.

pub mod fetch;

pub use fetch::{FetchConfig, HttpNetwork};
