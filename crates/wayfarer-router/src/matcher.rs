//! The pattern matcher: one pattern against one request path.
//!
//! Pure function, no table context. Matching compares the non-empty
//! segments of both sides, so trailing slashes never affect the outcome and
//! an index pattern (`/users/`) matches at the same depth as its sibling
//! layout (`/users`).

use std::collections::HashMap;

use crate::route::{DYNAMIC_PREFIX, SPLAT_PARAM_NAME, SPLAT_SEGMENT};

/// Outcome of matching a single pattern against a request path.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchResult {
    /// Whether the pattern structurally matches the path.
    pub matches: bool,
    /// Parameters bound by dynamic segments.
    pub params: HashMap<String, String>,
    /// Specificity score: +3 per matching literal segment, +2 per dynamic
    /// segment, +1 per splat segment.
    pub score: u32,
    /// Count of non-empty segments in the request path.
    pub real_segment_count: usize,
}

impl MatchResult {
    fn no_match(real_segment_count: usize) -> Self {
        MatchResult {
            matches: false,
            params: HashMap::new(),
            score: 0,
            real_segment_count,
        }
    }
}

/// Matches `pattern` against `path`, binding params and scoring specificity.
///
/// A pattern shorter than the path still matches (layouts match every path
/// beneath them); a pattern longer than the path never does, except through
/// its trailing splat segment.
///
/// # Examples
///
/// ```
/// use wayfarer_router::match_pattern;
///
/// let m = match_pattern("/users/:id", "/users/123");
/// assert!(m.matches);
/// assert_eq!(m.score, 5);
/// assert_eq!(m.params.get("id"), Some(&"123".to_string()));
///
/// let m = match_pattern("/docs/*", "/docs/a/b/c");
/// assert!(m.matches);
/// assert_eq!(m.score, 4);
/// ```
pub fn match_pattern(pattern: &str, path: &str) -> MatchResult {
    let pattern_segments: Vec<&str> = pattern
        .trim_start_matches('/')
        .split('/')
        .filter(|s| !s.is_empty())
        .collect();
    let path_segments: Vec<&str> = path
        .trim_start_matches('/')
        .split('/')
        .filter(|s| !s.is_empty())
        .collect();
    let real_segment_count = path_segments.len();

    // Structural length bound. A trailing splat absorbs the rest of the
    // path, so the pattern may run one segment past it; otherwise the
    // pattern must not be deeper than the path.
    let ends_with_splat = pattern_segments.last() == Some(&SPLAT_SEGMENT);
    if ends_with_splat {
        if path_segments.len() + 1 < pattern_segments.len() {
            return MatchResult::no_match(real_segment_count);
        }
    } else if pattern_segments.len() > path_segments.len() {
        return MatchResult::no_match(real_segment_count);
    }

    // Exact equality is an immediate all-literal match.
    if pattern_segments == path_segments {
        return MatchResult {
            matches: true,
            params: HashMap::new(),
            score: 3 * pattern_segments.len() as u32,
            real_segment_count,
        };
    }

    let mut score = 0u32;
    let mut params = HashMap::new();

    for (i, pattern_segment) in pattern_segments.iter().enumerate() {
        if *pattern_segment == SPLAT_SEGMENT {
            // Everything after a splat is absorbed by it.
            score += 1;
            break;
        }
        if let Some(name) = pattern_segment.strip_prefix(DYNAMIC_PREFIX) {
            score += 2;
            if name != SPLAT_PARAM_NAME {
                params.insert(name.to_string(), path_segments[i].to_string());
            }
            continue;
        }
        if *pattern_segment == path_segments[i] {
            score += 3;
            continue;
        }
        // First failing literal aborts the match.
        return MatchResult::no_match(real_segment_count);
    }

    MatchResult {
        matches: true,
        params,
        score,
        real_segment_count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn literal_pattern_matches_only_itself_at_depth() {
        let m = match_pattern("/lion", "/lion");
        assert!(m.matches);
        assert_eq!(m.score, 3);
        assert_eq!(m.real_segment_count, 1);

        assert!(!match_pattern("/lion", "/tiger").matches);
        assert!(!match_pattern("/lion/cub", "/lion").matches);
    }

    #[test]
    fn layouts_match_deeper_paths() {
        let m = match_pattern("/lion", "/lion/123/456");
        assert!(m.matches);
        assert_eq!(m.score, 3);
        assert_eq!(m.real_segment_count, 3);
    }

    #[test]
    fn trailing_slash_is_ignored() {
        assert!(match_pattern("/lion", "/lion/").matches);
        assert!(match_pattern("/lion/", "/lion").matches);
    }

    #[test]
    fn dynamic_segments_bind_params() {
        let m = match_pattern("/tiger/:tiger_id/:tiger_cub_id", "/tiger/123/456");
        assert!(m.matches);
        assert_eq!(m.score, 3 + 2 + 2);
        assert_eq!(m.params.get("tiger_id"), Some(&"123".to_string()));
        assert_eq!(m.params.get("tiger_cub_id"), Some(&"456".to_string()));
    }

    #[test]
    fn reserved_splat_param_name_is_never_bound() {
        let m = match_pattern("/files/:splat", "/files/readme");
        assert!(m.matches);
        assert!(m.params.is_empty());
    }

    #[test]
    fn splat_requires_enough_leading_segments() {
        assert!(match_pattern("/lion/*", "/lion/a").matches);
        assert!(match_pattern("/lion/*", "/lion").matches);
        assert!(!match_pattern("/lion/*", "/").matches);
    }

    #[test]
    fn splat_scores_below_dynamic_and_literal() {
        let literal = match_pattern("/docs/guide", "/docs/guide").score;
        let dynamic = match_pattern("/docs/:page", "/docs/guide").score;
        let splat = match_pattern("/docs/*", "/docs/guide").score;
        assert!(literal > dynamic);
        assert!(dynamic > splat);
    }

    #[test]
    fn ultimate_catch_matches_everything() {
        assert!(match_pattern("/*", "/").matches);
        assert!(match_pattern("/*", "/a/b/c").matches);
        assert_eq!(match_pattern("/*", "/a/b/c").score, 1);
    }

    #[test]
    fn first_failing_literal_stops_scoring() {
        let m = match_pattern("/a/b/c", "/a/x/c");
        assert!(!m.matches);
        assert_eq!(m.score, 0);
    }
}
