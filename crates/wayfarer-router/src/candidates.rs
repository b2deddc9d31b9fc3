//! The candidate filter: every structurally-matching route for one path.
//!
//! No ordering guarantee at this stage; ordering and tie-breaking belong to
//! the resolution pipeline in [`crate::resolve`].

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::matcher::match_pattern;
use crate::route::{PathType, RouteDefinition, RouteTable, DYNAMIC_PREFIX, SPLAT_SEGMENT};

/// A route definition annotated with the outcome of matching it against one
/// request path. Ephemeral, derived per request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchCandidate {
    pub route: RouteDefinition,
    /// Parameters bound by this candidate's dynamic segments.
    pub params: HashMap<String, String>,
    /// Specificity score from the matcher.
    pub score: u32,
    /// Non-empty segment count of the request path.
    pub real_segment_count: usize,
}

impl MatchCandidate {
    /// Declared segment count, including the empty index marker segment.
    pub fn raw_segment_len(&self) -> usize {
        self.route.segments.len()
    }

    /// Declared segment count excluding the empty index marker.
    pub fn non_empty_segment_len(&self) -> usize {
        self.route.segments.iter().filter(|s| !s.is_empty()).count()
    }

    /// Declared segments that consume exactly one path segment each
    /// (everything except splat tokens and the index marker).
    pub fn non_splat_segment_len(&self) -> usize {
        self.route
            .segments
            .iter()
            .filter(|s| !s.is_empty() && s.as_str() != SPLAT_SEGMENT)
            .count()
    }

    pub fn is_index(&self) -> bool {
        self.route.path_type == PathType::Index
    }

    pub fn is_static_layout(&self) -> bool {
        self.route.path_type == PathType::StaticLayout
    }

    pub fn is_dynamic_layout(&self) -> bool {
        self.route.path_type == PathType::DynamicLayout
    }

    pub fn is_ultimate_catch(&self) -> bool {
        self.route.path_type == PathType::UltimateCatch
    }

    pub fn is_non_ultimate_splat(&self) -> bool {
        self.route.path_type == PathType::NonUltimateSplat
    }

    /// Whether the declared pattern ends in a splat token.
    pub fn has_splat_tail(&self) -> bool {
        self.route.segments.last().map(String::as_str) == Some(SPLAT_SEGMENT)
    }

    /// Last declared segment (the index marker for index routes).
    pub fn last_segment(&self) -> Option<&str> {
        self.route.segments.last().map(String::as_str)
    }

    /// For an index route, the segment naming its own directory (the
    /// second-to-last declared segment).
    pub fn index_directory_segment(&self) -> Option<&str> {
        let len = self.route.segments.len();
        if len < 2 {
            return None;
        }
        Some(self.route.segments[len - 2].as_str())
    }

    /// Whether this is an index route nested directly under a dynamic
    /// directory segment.
    pub fn is_index_under_dynamic(&self) -> bool {
        self.is_index()
            && self
                .index_directory_segment()
                .is_some_and(|s| s.starts_with(DYNAMIC_PREFIX))
    }
}

/// Runs the matcher over every definition in the table and collects the
/// structural matches.
///
/// Data-only definitions are skipped. A definition carrying the global `/*`
/// pattern is re-tagged as the ultimate catch if the build layer labelled it
/// otherwise.
pub fn initial_matching_paths(table: &RouteTable, path: &str) -> Vec<MatchCandidate> {
    let candidates: Vec<MatchCandidate> = table
        .routes()
        .iter()
        .filter(|route| !route.is_data_only_file)
        .filter_map(|route| {
            let outcome = match_pattern(&route.pattern, path);
            if !outcome.matches {
                return None;
            }

            let mut route = route.clone();
            if route.is_ultimate_catch_pattern() && route.path_type != PathType::UltimateCatch {
                route.path_type = PathType::UltimateCatch;
            }

            Some(MatchCandidate {
                route,
                params: outcome.params,
                score: outcome.score,
                real_segment_count: outcome.real_segment_count,
            })
        })
        .collect();

    debug!(path, count = candidates.len(), "initial matching paths");
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::route::RouteDefinition;

    fn table() -> RouteTable {
        RouteTable::new(vec![
            RouteDefinition::new("/*", "pages/catch-all"),
            RouteDefinition::new("/lion", "pages/lion"),
            RouteDefinition::new("/lion/", "pages/lion/index"),
            RouteDefinition::new("/lion/:id", "pages/lion/id"),
            RouteDefinition::new("/lion/:stats_id", "pages/lion/stats.data").with_data_only(),
        ])
        .unwrap()
    }

    #[test]
    fn collects_all_structural_matches() {
        let candidates = initial_matching_paths(&table(), "/lion/123");
        let patterns: Vec<&str> = candidates.iter().map(|c| c.route.pattern.as_str()).collect();
        // Index matches at its own directory depth too; admissibility is the
        // resolver's job, not the filter's.
        assert!(patterns.contains(&"/*"));
        assert!(patterns.contains(&"/lion"));
        assert!(patterns.contains(&"/lion/:id"));
    }

    #[test]
    fn skips_data_only_definitions() {
        let candidates = initial_matching_paths(&table(), "/lion/123");
        assert!(candidates
            .iter()
            .all(|c| c.route.source_ref != "pages/lion/stats.data"));
    }

    #[test]
    fn retags_mislabelled_ultimate_catch() {
        let candidates = initial_matching_paths(&table(), "/nothing/here");
        let catch = candidates
            .iter()
            .find(|c| c.route.pattern == "/*")
            .unwrap();
        assert!(catch.is_ultimate_catch());
    }
}
