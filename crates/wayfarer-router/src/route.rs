//! Static route table types.
//!
//! A [`RouteDefinition`] is produced once at build time (by the out-of-scope
//! route table generator) and held in read-only process state. The
//! [`RouteTable`] constructor enforces the two table-level invariants:
//! unique patterns, and exactly one ultimate catch route.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The reserved splat token: a single segment matching the rest of the path.
pub const SPLAT_SEGMENT: &str = "*";

/// Marker prefix for dynamic segments (`:id`).
pub const DYNAMIC_PREFIX: char = ':';

/// Reserved parameter name for splat captures. A `:splat` dynamic segment
/// matches but is never bound into `params`.
pub const SPLAT_PARAM_NAME: &str = "splat";

/// Pattern of the global fallback route.
pub const ULTIMATE_CATCH_PATTERN: &str = "/*";

/// Structural classification of a route definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PathType {
    /// The single root-level splat route (`/*`), matched when nothing more
    /// specific fits. The framework's "not found" handler.
    UltimateCatch,
    /// A route matching its parent directory's own path, written with a
    /// trailing slash (`/users/`). Matches at its own depth, never deeper.
    Index,
    /// A literal-only pattern; a guaranteed chain ancestor once it matches.
    StaticLayout,
    /// A pattern with one or more `:param` segments.
    DynamicLayout,
    /// A splat route below the root (`/docs/*`).
    NonUltimateSplat,
}

/// A single statically-known route.
///
/// `segments` mirrors `pattern` verbatim, including the trailing empty
/// segment that marks an index route. The matcher ignores empty segments;
/// the resolver's depth bookkeeping counts them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteDefinition {
    /// URL pattern like `/users/:id`, `/docs/*`, or `/users/` (index).
    pub pattern: String,
    /// Ordered segment descriptors mirroring `pattern`.
    pub segments: Vec<String>,
    /// Structural classification derived from the segments.
    pub path_type: PathType,
    /// Opaque reference used to load the route's module (component, loader,
    /// action, head, error boundary).
    pub source_ref: String,
    /// Whether the loader/action/head live in a paired data module next to
    /// the UI module.
    #[serde(default)]
    pub has_sibling_data_file: bool,
    /// Whether this definition is data-only (no UI); skipped by matching.
    #[serde(default)]
    pub is_data_only_file: bool,
}

impl RouteDefinition {
    /// Builds a definition from a pattern string, deriving the segment list
    /// and path type.
    ///
    /// # Examples
    ///
    /// ```
    /// use wayfarer_router::{PathType, RouteDefinition};
    ///
    /// let route = RouteDefinition::new("/users/:id", "pages/users/id");
    /// assert_eq!(route.path_type, PathType::DynamicLayout);
    ///
    /// let index = RouteDefinition::new("/users/", "pages/users/index");
    /// assert_eq!(index.path_type, PathType::Index);
    /// assert_eq!(index.segments, vec!["users".to_string(), String::new()]);
    /// ```
    pub fn new(pattern: impl Into<String>, source_ref: impl Into<String>) -> Self {
        let pattern = pattern.into();
        let segments: Vec<String> = pattern
            .trim_start_matches('/')
            .split('/')
            .map(str::to_string)
            .collect();
        let path_type = classify_segments(&segments);

        RouteDefinition {
            pattern,
            segments,
            path_type,
            source_ref: source_ref.into(),
            has_sibling_data_file: false,
            is_data_only_file: false,
        }
    }

    /// Marks the loader/action/head as living in a paired data module.
    pub fn with_sibling_data_file(mut self) -> Self {
        self.has_sibling_data_file = true;
        self
    }

    /// Marks this definition as data-only (never matched as a UI route).
    pub fn with_data_only(mut self) -> Self {
        self.is_data_only_file = true;
        self
    }

    /// Whether this definition is the global `/*` fallback.
    pub fn is_ultimate_catch_pattern(&self) -> bool {
        self.segments.len() == 1 && self.segments[0] == SPLAT_SEGMENT
    }
}

/// Classifies a raw segment list into a [`PathType`].
///
/// Index detection (trailing empty segment) runs before splat detection so
/// `/docs/` is an index even inside a directory that also holds `/docs/*`.
fn classify_segments(segments: &[String]) -> PathType {
    if segments.len() == 1 && segments[0] == SPLAT_SEGMENT {
        return PathType::UltimateCatch;
    }
    match segments.last().map(String::as_str) {
        Some("") => PathType::Index,
        Some(SPLAT_SEGMENT) => PathType::NonUltimateSplat,
        _ if segments.iter().any(|s| s.starts_with(DYNAMIC_PREFIX)) => PathType::DynamicLayout,
        _ => PathType::StaticLayout,
    }
}

/// Errors raised while constructing a [`RouteTable`].
#[derive(Debug, Error)]
pub enum RouteTableError {
    #[error("duplicate route pattern '{0}'")]
    DuplicatePattern(String),
    #[error("route table must contain exactly one ultimate catch route ('/*')")]
    MissingUltimateCatch,
    #[error("route table contains more than one ultimate catch route")]
    MultipleUltimateCatch,
    #[error("invalid route table JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// The immutable, process-wide set of route definitions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteTable {
    routes: Vec<RouteDefinition>,
}

impl RouteTable {
    /// Validates and wraps a set of route definitions.
    ///
    /// Rejects duplicate patterns and tables without exactly one ultimate
    /// catch route.
    pub fn new(routes: Vec<RouteDefinition>) -> Result<Self, RouteTableError> {
        let mut seen = std::collections::HashSet::new();
        for route in &routes {
            if !seen.insert(route.pattern.as_str()) {
                return Err(RouteTableError::DuplicatePattern(route.pattern.clone()));
            }
        }

        match routes.iter().filter(|r| r.is_ultimate_catch_pattern()).count() {
            0 => Err(RouteTableError::MissingUltimateCatch),
            1 => Ok(RouteTable { routes }),
            _ => Err(RouteTableError::MultipleUltimateCatch),
        }
    }

    /// Deserializes a table from the JSON emitted by the build-time route
    /// table generator, applying the same validation as [`RouteTable::new`].
    pub fn from_json(json: &str) -> Result<Self, RouteTableError> {
        let routes: Vec<RouteDefinition> = serde_json::from_str(json)?;
        RouteTable::new(routes)
    }

    /// All route definitions, in table order.
    pub fn routes(&self) -> &[RouteDefinition] {
        &self.routes
    }

    /// The global `/*` fallback route.
    pub fn ultimate_catch(&self) -> &RouteDefinition {
        // Guaranteed by construction.
        self.routes
            .iter()
            .find(|r| r.is_ultimate_catch_pattern())
            .expect("route table always holds one ultimate catch")
    }
}
