use std::sync::Arc;

use crate::api::cache::PageCache;
use crate::client::BenchmarkSource;
use crate::config::CacheConfig;

#[derive(Clone)]
pub struct AppState {
    pub source: Arc<dyn BenchmarkSource>,
    pub cache: Arc<PageCache>,
}

impl AppState {
    pub fn new(source: Arc<dyn BenchmarkSource>, cache: &CacheConfig) -> Self {
        Self {
            source,
            cache: Arc::new(PageCache::from_config(cache)),
        }
    }
}
