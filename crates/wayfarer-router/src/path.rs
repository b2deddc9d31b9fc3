//! Path validation and normalization utilities.
//!
//! All functions here are pure: same input, same output, no side effects.

use std::borrow::Cow;

/// Checks whether a request path is already in canonical form.
///
/// Canonical form: starts with `/`, no `//` or `\`, no trailing `/`
/// (except the root path itself).
///
/// # Examples
///
/// ```
/// use wayfarer_router::path::is_valid_path;
///
/// assert!(is_valid_path("/"));
/// assert!(is_valid_path("/users/123"));
///
/// assert!(!is_valid_path(""));
/// assert!(!is_valid_path("users"));
/// assert!(!is_valid_path("/users/"));
/// assert!(!is_valid_path("/users//123"));
/// ```
pub fn is_valid_path(path: &str) -> bool {
    let mut bytes = path.bytes();
    if bytes.next() != Some(b'/') {
        return false;
    }
    if path.len() == 1 {
        return true;
    }

    // One pass: reject backslashes and empty segments, which covers both
    // `//` runs and a trailing `/`.
    let mut prev = b'/';
    for b in bytes {
        match b {
            b'\\' => return false,
            b'/' if prev == b'/' => return false,
            _ => {}
        }
        prev = b;
    }
    prev != b'/'
}

/// Normalizes a request path to canonical form.
///
/// Returns `Cow::Borrowed` when the input is already canonical (zero
/// allocations), `Cow::Owned` otherwise. Trailing slashes, duplicate
/// slashes, and backslashes are all collapsed; the root path stays `/`.
///
/// The normalized path is also the route cache key, so two spellings of
/// the same path always resolve to the same cache entry.
///
/// # Examples
///
/// ```
/// use wayfarer_router::path::normalize_path;
///
/// assert_eq!(normalize_path("/users/123/"), "/users/123");
/// assert_eq!(normalize_path("/users//123"), "/users/123");
/// assert_eq!(normalize_path(""), "/");
/// ```
pub fn normalize_path(path: &str) -> Cow<'_, str> {
    if is_valid_path(path) {
        return Cow::Borrowed(path);
    }

    let mut normalized = String::with_capacity(path.len() + 1);
    for segment in path
        .split(|c| c == '/' || c == '\\')
        .filter(|s| !s.is_empty())
    {
        normalized.push('/');
        normalized.push_str(segment);
    }

    if normalized.is_empty() {
        Cow::Borrowed("/")
    } else {
        Cow::Owned(normalized)
    }
}

/// Splits a path into its non-empty segments.
///
/// `/lion/123/` yields `["lion", "123"]`; the root path yields no segments.
pub fn split_real_segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

/// Counts the non-empty segments of a request path.
///
/// This is the "real segment count" the resolver uses to detect under- and
/// over-matching relative to index and splat routes.
pub fn real_segment_count(path: &str) -> usize {
    path.split('/').filter(|s| !s.is_empty()).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_paths() {
        assert!(is_valid_path("/"));
        assert!(is_valid_path("/about"));
        assert!(is_valid_path("/users/123"));

        assert!(!is_valid_path(""));
        assert!(!is_valid_path("about"));
        assert!(!is_valid_path("/about/"));
        assert!(!is_valid_path("/about//page"));
        assert!(!is_valid_path("/about\\page"));
    }

    #[test]
    fn normalize_borrows_when_canonical() {
        assert!(matches!(normalize_path("/about"), Cow::Borrowed("/about")));
        assert!(matches!(normalize_path("/"), Cow::Borrowed("/")));
    }

    #[test]
    fn normalize_strips_trailing_and_duplicate_slashes() {
        assert_eq!(normalize_path("/about/"), "/about");
        assert_eq!(normalize_path("/path///to//page"), "/path/to/page");
        assert_eq!(normalize_path("\\users\\123"), "/users/123");
        assert_eq!(normalize_path("/a\\b//c/"), "/a/b/c");
        assert_eq!(normalize_path(""), "/");
        assert_eq!(normalize_path("///"), "/");
    }

    #[test]
    fn real_segments() {
        assert_eq!(split_real_segments("/lion/123/456"), vec!["lion", "123", "456"]);
        assert_eq!(split_real_segments("/"), Vec::<&str>::new());
        assert_eq!(real_segment_count("/lion/"), 1);
        assert_eq!(real_segment_count("/"), 0);
    }
}
