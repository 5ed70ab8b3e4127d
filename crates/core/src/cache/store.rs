//! The cache store capability consumed by the agent.

use async_trait::async_trait;

use super::CacheKey;
use crate::{Error, Response};

/// Persistent key-value store of cached responses grouped into named generations.
///
/// Every operation is atomic on its own. Writes to the same key are
/// last-write-wins; deleting a generation removes all of its entries at once.
#[async_trait]
pub trait CacheStore: Send + Sync + 'static {
    /// Create the generation if it does not exist yet.
    async fn open(&self, generation: &str) -> Result<(), Error>;

    /// Find a response for `key` in any generation, oldest generation first.
    async fn match_request(&self, key: &CacheKey) -> Result<Option<Response>, Error>;

    /// Store one entry in `generation`, creating the generation if needed.
    async fn put(&self, generation: &str, key: CacheKey, response: Response) -> Result<(), Error>;

    /// Store a batch of entries atomically: either all of them land or none do.
    async fn put_all(&self, generation: &str, entries: Vec<(CacheKey, Response)>) -> Result<(), Error>;

    /// Delete a generation and all of its entries. Returns false if it did not exist.
    async fn delete(&self, generation: &str) -> Result<bool, Error>;

    /// Generation names in creation order.
    async fn keys(&self) -> Result<Vec<String>, Error>;

    /// Keys stored in `generation`, in insertion order. Empty if the generation is absent.
    async fn entries(&self, generation: &str) -> Result<Vec<CacheKey>, Error>;
}
