//! Binds resolved chain entries to their loaded route modules.
//!
//! Decoration happens fresh per request (the resolved chain is cached, the
//! decorated chain is not): accessors are cheap `Arc` clones over the
//! registry's module cache.

use std::sync::Arc;

use wayfarer_router::MatchCandidate;

use crate::module::{
    sibling_data_ref, Action, Component, HeadFn, Loader, ModuleRegistry, RouteModule,
};

/// One resolved chain entry with its capability accessors bound.
///
/// UI capabilities (component, error boundary) always come from the route's
/// own module; data capabilities (loader, action, head) come from the
/// paired data module when the route declares one.
#[derive(Clone)]
pub struct DecoratedRoute {
    pub candidate: MatchCandidate,
    ui_module: Arc<RouteModule>,
    data_module: Arc<RouteModule>,
}

impl DecoratedRoute {
    pub fn component(&self) -> Option<Arc<dyn Component>> {
        self.ui_module.component.clone()
    }

    pub fn error_boundary(&self) -> Option<Arc<dyn Component>> {
        self.ui_module.error_boundary.clone()
    }

    pub fn has_error_boundary(&self) -> bool {
        self.ui_module.error_boundary.is_some()
    }

    pub fn head(&self) -> Option<Arc<dyn HeadFn>> {
        self.data_module.head.clone()
    }

    pub fn loader(&self) -> Option<Arc<dyn Loader>> {
        self.data_module.loader.clone()
    }

    pub fn action(&self) -> Option<Arc<dyn Action>> {
        self.data_module.action.clone()
    }
}

/// Loads and binds the module for every entry of a resolved chain, in
/// chain order. A load failure is fatal for the request: it signals a
/// build/deployment inconsistency, not a data error.
pub async fn decorate_chain(
    registry: &ModuleRegistry,
    matched_paths: &[MatchCandidate],
) -> anyhow::Result<Vec<DecoratedRoute>> {
    let mut decorated = Vec::with_capacity(matched_paths.len());
    for candidate in matched_paths {
        let ui_module = registry.get(&candidate.route.source_ref).await?;
        let data_module = if candidate.route.has_sibling_data_file {
            registry
                .get(&sibling_data_ref(&candidate.route.source_ref))
                .await?
        } else {
            ui_module.clone()
        };
        decorated.push(DecoratedRoute {
            candidate: candidate.clone(),
            ui_module,
            data_module,
        });
    }
    Ok(decorated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::{ModuleRegistry, RouteModule, StaticModuleLoader};
    use crate::request::{DataError, DataFunctionArgs};
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use wayfarer_router::{initial_matching_paths, RouteDefinition, RouteTable};

    struct FixedLoader(Value);

    #[async_trait]
    impl Loader for FixedLoader {
        async fn call(&self, _args: &DataFunctionArgs) -> Result<Value, DataError> {
            Ok(self.0.clone())
        }
    }

    fn leaf_candidate(pattern: &str, source_ref: &str, sibling: bool) -> MatchCandidate {
        let mut def = RouteDefinition::new(pattern, source_ref);
        if sibling {
            def = def.with_sibling_data_file();
        }
        let table =
            RouteTable::new(vec![RouteDefinition::new("/*", "pages/catch-all"), def]).unwrap();
        initial_matching_paths(&table, pattern)
            .into_iter()
            .find(|c| c.route.pattern == pattern)
            .unwrap()
    }

    #[tokio::test]
    async fn sibling_data_file_splits_ui_and_data_modules() {
        let loader = StaticModuleLoader::new()
            .with_module("pages/lion", RouteModule::new())
            .with_module(
                "pages/lion.data",
                RouteModule::new().with_loader(Arc::new(FixedLoader(json!("from data file")))),
            );
        let registry = ModuleRegistry::new(Arc::new(loader));

        let candidate = leaf_candidate("/lion", "pages/lion", true);
        let decorated = decorate_chain(&registry, &[candidate]).await.unwrap();
        assert!(decorated[0].loader().is_some());
        assert!(decorated[0].component().is_none());
    }

    #[tokio::test]
    async fn missing_module_fails_decoration() {
        let registry = ModuleRegistry::new(Arc::new(StaticModuleLoader::new()));
        let candidate = leaf_candidate("/lion", "pages/lion", false);
        assert!(decorate_chain(&registry, &[candidate]).await.is_err());
    }
}
