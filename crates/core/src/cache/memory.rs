//! In-memory cache store.
//!
//! Mirrors the SQLite store's semantics (creation-ordered generations,
//! last-write-wins per key, atomic batch puts) without touching disk, and
//! counts lookups and writes so tests can assert which paths touched the store.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{CacheKey, CacheStore};
use crate::{Error, Response};

struct Generation {
    name: String,
    entries: Vec<(CacheKey, Response)>,
}

impl Generation {
    fn insert(&mut self, key: CacheKey, response: Response) {
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = response,
            None => self.entries.push((key, response)),
        }
    }
}

/// Cache store held entirely in process memory.
///
/// Cloning shares the underlying generations.
#[derive(Clone, Default)]
pub struct MemoryStore {
    generations: Arc<RwLock<Vec<Generation>>>,
    lookups: Arc<AtomicUsize>,
    writes: Arc<AtomicUsize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `match_request` calls served so far.
    pub fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    /// Number of `put`/`put_all` calls served so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn position(generations: &[Generation], name: &str) -> Option<usize> {
        generations.iter().position(|g| g.name == name)
    }

    fn ensure<'a>(generations: &'a mut Vec<Generation>, name: &str) -> &'a mut Generation {
        let idx = match Self::position(generations, name) {
            Some(idx) => idx,
            None => {
                generations.push(Generation { name: name.to_string(), entries: Vec::new() });
                generations.len() - 1
            }
        };
        &mut generations[idx]
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn open(&self, generation: &str) -> Result<(), Error> {
        let mut generations = self.generations.write().await;
        Self::ensure(&mut generations, generation);
        Ok(())
    }

    async fn match_request(&self, key: &CacheKey) -> Result<Option<Response>, Error> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        let generations = self.generations.read().await;
        Ok(generations
            .iter()
            .flat_map(|g| g.entries.iter())
            .find(|(k, _)| k == key)
            .map(|(_, response)| response.clone()))
    }

    async fn put(&self, generation: &str, key: CacheKey, response: Response) -> Result<(), Error> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        let mut generations = self.generations.write().await;
        Self::ensure(&mut generations, generation).insert(key, response);
        Ok(())
    }

    async fn put_all(&self, generation: &str, entries: Vec<(CacheKey, Response)>) -> Result<(), Error> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        let mut generations = self.generations.write().await;
        let target = Self::ensure(&mut generations, generation);
        for (key, response) in entries {
            target.insert(key, response);
        }
        Ok(())
    }

    async fn delete(&self, generation: &str) -> Result<bool, Error> {
        let mut generations = self.generations.write().await;
        match Self::position(&generations, generation) {
            Some(idx) => {
                generations.remove(idx);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn keys(&self) -> Result<Vec<String>, Error> {
        let generations = self.generations.read().await;
        Ok(generations.iter().map(|g| g.name.clone()).collect())
    }

    async fn entries(&self, generation: &str) -> Result<Vec<CacheKey>, Error> {
        let generations = self.generations.read().await;
        Ok(generations
            .iter()
            .find(|g| g.name == generation)
            .map(|g| g.entries.iter().map(|(k, _)| k.clone()).collect())
            .unwrap_or_default())
    }
}
