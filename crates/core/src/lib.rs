//! Core types and shared functionality for precache.
//!
//! This crate provides:
//! - The cache agent with its install, activate, and fetch entry points
//! - Cache store implementations (SQLite and in-memory)
//! - Unified error types
//! - Configuration structures

pub mod agent;
pub mod cache;
pub mod config;
pub mod error;
pub mod http;

pub use agent::{ActivateReport, CacheAgent, FetchOutcome, InstallReport, Network, WorkerHost, WorkerState, WriteBack};
pub use cache::{CacheDb, CacheKey, CacheStore, MemoryStore};
pub use config::AgentConfig;
pub use error::Error;
pub use http::{Request, Response};
