//! # Wayfarer Router
//!
//! The matching and resolution core of the Wayfarer file-based routing
//! framework. Given a statically-built route table and an incoming request
//! path, it selects the ordered chain of matching route definitions
//! (outermost layout first, leaf last), extracts path parameters, and
//! captures splat segments for wildcard routes.
//!
//! Route patterns are `/`-delimited:
//! - literal segments (`/about`)
//! - dynamic segments (`/users/:id`)
//! - a trailing splat segment (`/docs/*`) matching the rest of the path
//! - index routes, written with a trailing slash (`/users/`), which match
//!   their own directory depth and nothing deeper
//!
//! Exactly one route per table is the *ultimate catch* (`/*`): the global
//! fallback when nothing more specific matches.
//!
//! This crate is pure and synchronous. The per-request runtime (caching,
//! module loading, loader/action execution) lives in the `wayfarer` crate.
//!
//! ## Example
//!
//! ```
//! use wayfarer_router::{RouteDefinition, RouteTable, resolve};
//!
//! let table = RouteTable::new(vec![
//!     RouteDefinition::new("/*", "pages/catch-all"),
//!     RouteDefinition::new("/users", "pages/users/layout"),
//!     RouteDefinition::new("/users/:id", "pages/users/id"),
//! ])
//! .unwrap();
//!
//! let chain = resolve(&table, "/users/123");
//! assert_eq!(chain.matched_paths.len(), 2);
//! assert_eq!(chain.params.get("id"), Some(&"123".to_string()));
//! ```

pub mod candidates;
pub mod matcher;
pub mod path;
pub mod resolve;
pub mod route;

pub use candidates::{initial_matching_paths, MatchCandidate};
pub use matcher::{match_pattern, MatchResult};
pub use path::{is_valid_path, normalize_path, real_segment_count, split_real_segments};
pub use resolve::{resolve, resolve_candidates, ResolvedChain};
pub use route::{
    PathType, RouteDefinition, RouteTable, RouteTableError, DYNAMIC_PREFIX, SPLAT_PARAM_NAME,
    SPLAT_SEGMENT, ULTIMATE_CATCH_PATTERN,
};
