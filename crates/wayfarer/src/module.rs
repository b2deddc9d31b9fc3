//! Route modules and the module-loading service.
//!
//! A route's `source_ref` names a unit of code exporting up to five
//! capabilities: a component, an error boundary, a head function, a loader,
//! and an action. The shape is checked once at the load boundary and held
//! as an explicit optional-field record, so the executor never probes a
//! dynamic value.
//!
//! The [`ModuleRegistry`] is the process-wide cache over a caller-supplied
//! [`ModuleLoader`]. Under [`ImportStrategy::AlwaysLazy`] caching is
//! disabled and every resolution re-loads.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error};

use crate::request::{DataError, DataFunctionArgs};

/// Props handed to a component render. Rendering itself belongs to the
/// UI-binding layer; this crate only carries the data through.
#[derive(Debug, Clone, Default)]
pub struct ComponentProps {
    pub loader_data: Option<Value>,
    pub action_data: Option<Value>,
    pub params: HashMap<String, String>,
    pub splat_segments: Vec<String>,
}

/// A renderable route component (or error boundary).
pub trait Component: Send + Sync {
    fn render(&self, props: &ComponentProps) -> String;
}

/// One block destined for the document head.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeadBlock {
    pub tag: String,
    #[serde(default)]
    pub attributes: HashMap<String, String>,
    #[serde(default)]
    pub safe_content: Option<String>,
}

/// A route's head function: produces head blocks from the request data.
pub trait HeadFn: Send + Sync {
    fn head_blocks(&self, args: &DataFunctionArgs) -> Vec<HeadBlock>;
}

/// A route's data loader, run for every chain entry on every request.
#[async_trait]
pub trait Loader: Send + Sync {
    async fn call(&self, args: &DataFunctionArgs) -> Result<Value, DataError>;
}

/// A route's action, run only at the leaf and only for mutating methods.
#[async_trait]
pub trait Action: Send + Sync {
    async fn call(&self, args: &DataFunctionArgs) -> Result<Value, DataError>;
}

/// The capability record for one loaded route module. Any field may be
/// absent; absence simply means the route does not participate in that
/// part of the protocol.
#[derive(Clone, Default)]
pub struct RouteModule {
    pub component: Option<Arc<dyn Component>>,
    pub error_boundary: Option<Arc<dyn Component>>,
    pub head: Option<Arc<dyn HeadFn>>,
    pub loader: Option<Arc<dyn Loader>>,
    pub action: Option<Arc<dyn Action>>,
}

impl RouteModule {
    pub fn new() -> Self {
        RouteModule::default()
    }

    pub fn with_component(mut self, component: Arc<dyn Component>) -> Self {
        self.component = Some(component);
        self
    }

    pub fn with_error_boundary(mut self, boundary: Arc<dyn Component>) -> Self {
        self.error_boundary = Some(boundary);
        self
    }

    pub fn with_head(mut self, head: Arc<dyn HeadFn>) -> Self {
        self.head = Some(head);
        self
    }

    pub fn with_loader(mut self, loader: Arc<dyn Loader>) -> Self {
        self.loader = Some(loader);
        self
    }

    pub fn with_action(mut self, action: Arc<dyn Action>) -> Self {
        self.action = Some(action);
        self
    }
}

/// Loads a route module from its opaque `source_ref`.
///
/// Implementations may hit disk or network; the registry decides whether
/// the result is cached.
#[async_trait]
pub trait ModuleLoader: Send + Sync {
    async fn load(&self, source_ref: &str) -> Result<Arc<RouteModule>>;
}

/// Derives the paired data module's reference for routes whose loader and
/// action live next to (not inside) the UI module.
pub fn sibling_data_ref(source_ref: &str) -> String {
    format!("{source_ref}.data")
}

/// Module caching strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportStrategy {
    /// Load once per `source_ref`, keep for the process lifetime.
    Cached,
    /// Never cache; every resolution re-loads the module.
    AlwaysLazy,
}

/// The injected module-loading service: a [`ModuleLoader`] plus a
/// process-wide, write-once-per-key module cache.
pub struct ModuleRegistry {
    loader: Arc<dyn ModuleLoader>,
    strategy: ImportStrategy,
    modules: RwLock<HashMap<String, Arc<RouteModule>>>,
}

impl ModuleRegistry {
    pub fn new(loader: Arc<dyn ModuleLoader>) -> Self {
        ModuleRegistry {
            loader,
            strategy: ImportStrategy::Cached,
            modules: RwLock::new(HashMap::new()),
        }
    }

    /// A registry with caching disabled.
    pub fn always_lazy(loader: Arc<dyn ModuleLoader>) -> Self {
        ModuleRegistry {
            loader,
            strategy: ImportStrategy::AlwaysLazy,
            modules: RwLock::new(HashMap::new()),
        }
    }

    pub fn strategy(&self) -> ImportStrategy {
        self.strategy
    }

    /// Number of cached modules.
    pub fn len(&self) -> usize {
        self.modules.read().expect("module cache lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Loads the module for `source_ref`, consulting the cache first under
    /// the cached strategy. Load failures indicate a build/deployment
    /// inconsistency: they are logged and propagated, never recovered.
    pub async fn get(&self, source_ref: &str) -> Result<Arc<RouteModule>> {
        if self.strategy == ImportStrategy::Cached {
            let cached = self
                .modules
                .read()
                .expect("module cache lock poisoned")
                .get(source_ref)
                .cloned();
            if let Some(module) = cached {
                debug!(source_ref, "module cache hit");
                return Ok(module);
            }
        }

        let module = self.loader.load(source_ref).await.map_err(|err| {
            error!(source_ref, %err, "failed to load route module");
            err
        })?;

        if self.strategy == ImportStrategy::Cached {
            // Check-then-set: a concurrent load of the same ref is wasted
            // work, not a correctness problem.
            self.modules
                .write()
                .expect("module cache lock poisoned")
                .entry(source_ref.to_string())
                .or_insert_with(|| module.clone());
        }
        Ok(module)
    }
}

/// An in-memory [`ModuleLoader`] over a fixed map of modules. The natural
/// loader for statically-linked routes, and for tests.
#[derive(Default)]
pub struct StaticModuleLoader {
    modules: HashMap<String, Arc<RouteModule>>,
}

impl StaticModuleLoader {
    pub fn new() -> Self {
        StaticModuleLoader::default()
    }

    pub fn with_module(mut self, source_ref: impl Into<String>, module: RouteModule) -> Self {
        self.modules.insert(source_ref.into(), Arc::new(module));
        self
    }
}

#[async_trait]
impl ModuleLoader for StaticModuleLoader {
    async fn load(&self, source_ref: &str) -> Result<Arc<RouteModule>> {
        self.modules
            .get(source_ref)
            .cloned()
            .ok_or_else(|| anyhow!("unknown module '{source_ref}'"))
    }
}
