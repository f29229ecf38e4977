//! Short-lived memoization of assembled pages.
//!
//! Challenge detail pages and forecast plots need several upstream calls
//! each. Successful results are kept for a fixed TTL so repeated views do not
//! hit the benchmark API again. Failures are never stored.

use std::collections::HashMap;
use std::future::Future;
use std::time::{Duration, Instant};

use serde_json::Value;
use tokio::sync::RwLock;

use crate::config::CacheConfig;

struct CachedPage {
    value: Value,
    stored_at: Instant,
}

pub struct PageCache {
    ttl: Duration,
    max_entries: usize,
    entries: RwLock<HashMap<String, CachedPage>>,
}

impl PageCache {
    /// A zero TTL or capacity disables caching.
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        Self {
            ttl,
            max_entries,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(Duration::from_secs(config.ttl_seconds), config.max_entries)
    }

    fn enabled(&self) -> bool {
        !self.ttl.is_zero() && self.max_entries > 0
    }

    pub async fn get(&self, key: &str) -> Option<Value> {
        if !self.enabled() {
            return None;
        }
        let entries = self.entries.read().await;
        entries
            .get(key)
            .filter(|page| page.stored_at.elapsed() < self.ttl)
            .map(|page| page.value.clone())
    }

    pub async fn insert(&self, key: String, value: Value) {
        if !self.enabled() {
            return;
        }
        let mut entries = self.entries.write().await;
        if entries.len() >= self.max_entries && !entries.contains_key(&key) {
            let ttl = self.ttl;
            entries.retain(|_, page| page.stored_at.elapsed() < ttl);
        }
        if entries.len() >= self.max_entries && !entries.contains_key(&key) {
            let oldest = entries
                .iter()
                .min_by_key(|(_, page)| page.stored_at)
                .map(|(k, _)| k.clone());
            if let Some(oldest) = oldest {
                entries.remove(&oldest);
            }
        }
        entries.insert(
            key,
            CachedPage {
                value,
                stored_at: Instant::now(),
            },
        );
    }

    /// Return the cached page for `key`, or build it with `build` and store it
    /// when it succeeds.
    pub async fn get_or_try_insert_with<F, Fut, E>(&self, key: &str, build: F) -> Result<Value, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Value, E>>,
    {
        if let Some(value) = self.get(key).await {
            tracing::debug!("Page cache hit: {}", key);
            return Ok(value);
        }
        let value = build().await?;
        self.insert(key.to_string(), value.clone()).await;
        Ok(value)
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
