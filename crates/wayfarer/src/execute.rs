//! Executes the data protocol for one resolved chain.
//!
//! Protocol per request:
//! 1. On a mutating method, the leaf's action runs (if it exports one).
//! 2. Every entry's loader runs concurrently; each writes only its own slot.
//! 3. A short-circuit from the action or any loader wins outright.
//! 4. The lowest failing index (the action counts at the leaf) picks the
//!    nearest ancestor error boundary. The active component list is
//!    truncated there and the boundary substituted in.
//! 5. With no ancestor boundary, the component list empties and the caller
//!    renders its default boundary.
//!
//! Loader/action failures never escape this module as errors; only module
//! resolution failures do.

use std::collections::HashMap;
use std::sync::Arc;

use axum::http::Method;
use futures::future::join_all;
use serde_json::Value;
use thiserror::Error;
use tracing::warn;
use wayfarer_router::{MatchCandidate, ResolvedChain};

use crate::decorate::{decorate_chain, DecoratedRoute};
use crate::module::{Component, HeadFn, ModuleRegistry};
use crate::request::{DataError, DataFunctionArgs, ResponseInit, ResponseSignal};

/// Fatal execution failure: the route's module could not be resolved.
/// Indicates a build/deployment inconsistency; surfaces to the transport
/// layer's generic error handling.
#[derive(Debug, Error)]
pub enum ExecuteError {
    #[error("route module resolution failed")]
    ModuleLoad(#[source] anyhow::Error),
}

/// Everything the render/transport layer needs for one matched request.
#[derive(Clone)]
pub struct ActivePathData {
    /// The resolved chain, outermost layout first.
    pub matching_paths: Vec<MatchCandidate>,
    /// Per-entry loader output; `None` for absent loaders and failures.
    pub loaders_data: Vec<Option<Value>>,
    /// Components to render, truncated at the active error boundary when a
    /// data function failed. Empty on failure with no ancestor boundary.
    pub active_components: Vec<Option<Arc<dyn Component>>>,
    /// Per-entry error boundary accessors, in chain order.
    pub active_error_boundaries: Vec<Option<Arc<dyn Component>>>,
    /// Per-entry head functions, in chain order.
    pub active_heads: Vec<Option<Arc<dyn HeadFn>>>,
    /// Index of the boundary substituted into `active_components`, when a
    /// failure was recovered by an ancestor boundary.
    pub outermost_error_boundary_index: Option<usize>,
    /// Whether any loader or the action failed.
    pub errored: bool,
    /// `None` everywhere except the leaf, which holds the action's output.
    pub action_data: Vec<Option<Value>>,
    pub splat_segments: Vec<String>,
    pub params: HashMap<String, String>,
    /// Status/headers accumulated by loaders and the action.
    pub response_init: ResponseInit,
}

/// Terminal result of executing a chain.
#[derive(Clone)]
pub enum ExecutionOutcome {
    /// Render the chain.
    Render(Box<ActivePathData>),
    /// A loader or action elected to bypass rendering.
    ShortCircuit(ResponseSignal),
}

/// Runs the full data protocol for `chain`.
pub async fn execute_chain(
    registry: &ModuleRegistry,
    chain: &ResolvedChain,
    method: Method,
    path: &str,
) -> Result<ExecutionOutcome, ExecuteError> {
    let decorated = decorate_chain(registry, &chain.matched_paths)
        .await
        .map_err(ExecuteError::ModuleLoad)?;

    let args = DataFunctionArgs::new(
        method,
        path,
        chain.params.clone(),
        chain.splat_segments.clone(),
    );

    if decorated.is_empty() {
        return Ok(ExecutionOutcome::Render(Box::new(empty_path_data(
            chain, &args,
        ))));
    }

    // The action completes before reconciliation begins; running it ahead
    // of the loader fan-out keeps both results available at step 4.
    let mut action_result: Option<Result<Value, DataError>> = None;
    if args.is_mutation() {
        if let Some(action) = decorated.last().and_then(DecoratedRoute::action) {
            action_result = Some(action.call(&args).await);
        }
    }

    // Fan-out: all loaders at once, each into its own slot.
    let loader_results: Vec<Option<Result<Value, DataError>>> =
        join_all(decorated.iter().map(|entry| {
            let args = &args;
            async move {
                match entry.loader() {
                    Some(loader) => Some(loader.call(args).await),
                    None => None,
                }
            }
        }))
        .await;

    // A deliberate early response wins outright.
    if let Some(Err(DataError::ShortCircuit(signal))) = &action_result {
        return Ok(ExecutionOutcome::ShortCircuit(signal.clone()));
    }
    for result in &loader_results {
        if let Some(Err(DataError::ShortCircuit(signal))) = result {
            return Ok(ExecutionOutcome::ShortCircuit(signal.clone()));
        }
    }

    let leaf_index = decorated.len() - 1;

    let loader_error_index = loader_results.iter().enumerate().find_map(|(i, result)| {
        if let Some(Err(DataError::Failure(err))) = result {
            warn!(
                index = i,
                pattern = %decorated[i].candidate.route.pattern,
                %err,
                "loader failed"
            );
            Some(i)
        } else {
            None
        }
    });
    let action_error_index = match &action_result {
        Some(Err(DataError::Failure(err))) => {
            warn!(
                pattern = %decorated[leaf_index].candidate.route.pattern,
                %err,
                "action failed"
            );
            Some(leaf_index)
        }
        _ => None,
    };
    let outermost_error_index = match (loader_error_index, action_error_index) {
        (Some(l), Some(a)) => Some(l.min(a)),
        (l, a) => l.or(a),
    };

    let loaders_data: Vec<Option<Value>> = loader_results
        .into_iter()
        .map(|result| match result {
            Some(Ok(value)) => Some(value),
            _ => None,
        })
        .collect();

    let mut action_data: Vec<Option<Value>> = vec![None; decorated.len()];
    if let Some(Ok(value)) = action_result {
        action_data[leaf_index] = Some(value);
    }

    let mut active_components: Vec<Option<Arc<dyn Component>>> =
        decorated.iter().map(DecoratedRoute::component).collect();

    let mut outermost_error_boundary_index = None;
    if let Some(error_index) = outermost_error_index {
        // Nearest ancestor boundary, strictly above the failing entry.
        outermost_error_boundary_index = (0..error_index)
            .rev()
            .find(|&i| decorated[i].has_error_boundary());
        match outermost_error_boundary_index {
            Some(boundary) => {
                active_components.truncate(boundary + 1);
                active_components[boundary] = decorated[boundary].error_boundary();
            }
            // No ancestor boundary: the caller's default boundary renders.
            None => active_components.clear(),
        }
    }

    Ok(ExecutionOutcome::Render(Box::new(ActivePathData {
        matching_paths: chain.matched_paths.clone(),
        loaders_data,
        active_components,
        active_error_boundaries: decorated
            .iter()
            .map(DecoratedRoute::error_boundary)
            .collect(),
        active_heads: decorated.iter().map(DecoratedRoute::head).collect(),
        outermost_error_boundary_index,
        errored: outermost_error_index.is_some(),
        action_data,
        splat_segments: chain.splat_segments.clone(),
        params: chain.params.clone(),
        response_init: args.response_init(),
    })))
}

fn empty_path_data(chain: &ResolvedChain, args: &DataFunctionArgs) -> ActivePathData {
    ActivePathData {
        matching_paths: Vec::new(),
        loaders_data: Vec::new(),
        active_components: Vec::new(),
        active_error_boundaries: Vec::new(),
        active_heads: Vec::new(),
        outermost_error_boundary_index: None,
        errored: false,
        action_data: Vec::new(),
        splat_segments: chain.splat_segments.clone(),
        params: chain.params.clone(),
        response_init: args.response_init(),
    }
}
