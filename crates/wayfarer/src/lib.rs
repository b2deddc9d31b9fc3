//! # Wayfarer runtime
//!
//! Per-request services layered on top of the pure matching core in
//! `wayfarer-router`:
//!
//! - [`cache::RouteCache`]: bounded LRU over resolved chains, with a
//!   low-priority eviction class for "not found" entries so path probing
//!   cannot crowd out real routes.
//! - [`module::ModuleRegistry`]: the injected module-loading service that
//!   turns a route's `source_ref` into its component/loader/action/head/
//!   error-boundary record, cached process-wide (or not, under the
//!   always-lazy strategy).
//! - [`decorate`]: binds each resolved chain entry to its loaded module.
//! - [`execute`]: runs the matched chain's action and loaders and applies
//!   the error-boundary fallback protocol, producing the
//!   [`execute::ActivePathData`] payload the render/transport layer
//!   consumes.
//! - [`engine::Engine`]: ties table, cache, and registry together for one
//!   `resolve -> decorate -> execute` round trip per request.

pub mod cache;
pub mod decorate;
pub mod engine;
pub mod execute;
pub mod module;
pub mod request;

pub use cache::RouteCache;
pub use decorate::{decorate_chain, DecoratedRoute};
pub use engine::Engine;
pub use execute::{execute_chain, ActivePathData, ExecuteError, ExecutionOutcome};
pub use module::{
    Action, Component, ComponentProps, HeadBlock, HeadFn, ImportStrategy, Loader, ModuleLoader,
    ModuleRegistry, RouteModule, StaticModuleLoader,
};
pub use request::{DataError, DataFunctionArgs, ResponseInit, ResponseSignal};

// The matching core, re-exported for convenience.
pub use wayfarer_router as router;
