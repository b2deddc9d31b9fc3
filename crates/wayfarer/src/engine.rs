//! The per-process routing engine: table + chain cache + module registry.

use std::sync::Arc;

use axum::http::Method;
use tracing::debug;
use wayfarer_router::{resolve, ResolvedChain, RouteTable};

use crate::cache::RouteCache;
use crate::execute::{execute_chain, ExecuteError, ExecutionOutcome};
use crate::module::ModuleRegistry;

/// Everything needed to take a request from path to render payload.
///
/// One engine per process. The route table is fixed at construction;
/// resolution results accumulate in the cache for the engine's lifetime.
pub struct Engine {
    table: RouteTable,
    cache: RouteCache,
    registry: ModuleRegistry,
}

impl Engine {
    pub fn new(table: RouteTable, registry: ModuleRegistry) -> Self {
        Engine {
            table,
            cache: RouteCache::default(),
            registry,
        }
    }

    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache = RouteCache::new(capacity);
        self
    }

    pub fn table(&self) -> &RouteTable {
        &self.table
    }

    pub fn cache(&self) -> &RouteCache {
        &self.cache
    }

    pub fn registry(&self) -> &ModuleRegistry {
        &self.registry
    }

    /// Resolves the chain for a request path, consulting the cache first.
    pub fn resolve(&self, path: &str) -> Arc<ResolvedChain> {
        self.cache
            .get_or_compute_with(path, || resolve(&self.table, path))
    }

    /// Full round trip for one request: resolve the chain, then run its
    /// data protocol.
    pub async fn handle(
        &self,
        method: Method,
        path: &str,
    ) -> Result<ExecutionOutcome, ExecuteError> {
        let chain = self.resolve(path);
        debug!(
            %method,
            path,
            depth = chain.matched_paths.len(),
            not_found = chain.is_not_found(),
            "handling request"
        );
        execute_chain(&self.registry, &chain, method, path).await
    }
}
