//! The resolution pipeline: from structural candidates to the final chain.
//!
//! Route trees are ambiguous by construction: an index route and a splat
//! route can both fit one path at once. Resolution is therefore a
//! multi-pass filter/score/tie-break pipeline. Each pass is a small pure
//! function so every rule stays testable in isolation:
//!
//! 1. structural admissibility (depth bounds, index-at-own-depth rule)
//! 2. catch-all suppression
//! 3. static layouts become definite matches
//! 4. competitive filtering against the static baseline, grouped by depth
//! 5. per-depth winner selection (index precedence, wildcard tracking)
//! 6. dynamic-index override suppression
//! 7. assembly and final-splat correction
//! 8. adjacent dynamic-layout/index pruning
//!
//! The output chain is ordered outermost layout first, innermost leaf last.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::candidates::{initial_matching_paths, MatchCandidate};
use crate::path::split_real_segments;
use crate::route::RouteTable;

/// The final ordered composition for one request path.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResolvedChain {
    /// Matching route definitions, outermost layout first, innermost leaf
    /// last.
    pub matched_paths: Vec<MatchCandidate>,
    /// Path segments captured by the deepest wildcard match (or by the
    /// ultimate catch).
    pub splat_segments: Vec<String>,
    /// Parameters from the deepest chain entry's match.
    pub params: HashMap<String, String>,
}

impl ResolvedChain {
    /// Whether this chain represents a "not found" outcome: nothing matched,
    /// or only the global fallback did.
    pub fn is_not_found(&self) -> bool {
        match self.matched_paths.as_slice() {
            [] => true,
            [only] => only.is_ultimate_catch(),
            _ => false,
        }
    }
}

/// Matches and resolves `path` against the whole table.
pub fn resolve(table: &RouteTable, path: &str) -> ResolvedChain {
    resolve_candidates(initial_matching_paths(table, path), path)
}

/// Resolves a pre-computed candidate list for `path`.
pub fn resolve_candidates(candidates: Vec<MatchCandidate>, path: &str) -> ResolvedChain {
    let path_segments = split_real_segments(path);
    let real = path_segments.len();
    let ultimate = candidates.iter().find(|c| c.is_ultimate_catch()).cloned();

    // Pass 1: structural admissibility.
    let mut survivors = filter_admissible(candidates, real);

    // Pass 2: catch-all suppression. A more specific match always wins over
    // the global fallback; the fallback alone is terminal.
    if survivors.len() > 1 {
        survivors.retain(|c| !c.is_ultimate_catch());
    } else if survivors.len() == 1 && survivors[0].is_ultimate_catch() {
        return ultimate_fallback(ultimate, &path_segments);
    }
    if survivors.is_empty() {
        return ultimate_fallback(ultimate, &path_segments);
    }

    // Pass 3: static layouts are definite matches. They set the baseline a
    // dynamic/index/splat competitor must beat at the same depth.
    let (definite, contenders): (Vec<MatchCandidate>, Vec<MatchCandidate>) = survivors
        .into_iter()
        .partition(MatchCandidate::is_static_layout);

    // Pass 4: competitive grouping by declared depth.
    let groups = group_competitive(contenders, &definite);

    // Pass 5: per-depth winner selection with wildcard-splat tracking.
    let picks = pick_depth_winners(groups, real, &path_segments);

    // Pass 6: a concrete static sibling outranks a dynamically-matched index.
    let winners = suppress_dynamic_index_overrides(picks.winners, &definite, real);

    // Pass 7: assembly and final-splat correction.
    let mut chain = assemble(definite, winners);
    let mut splat_segments = picks.splat_segments;
    if chain.is_empty() {
        return ultimate_fallback(ultimate, &path_segments);
    }
    if needs_different_splat(chain.last().expect("chain is non-empty"), real) {
        match picks.wildcard_splat {
            Some(wildcard) => {
                splat_segments = trailing_splat_segments(&wildcard, &path_segments);
                *chain.last_mut().expect("chain is non-empty") = wildcard;
            }
            // Deliberate give-up policy: reset to the global fallback rather
            // than serving a partial chain.
            None => return ultimate_fallback(ultimate, &path_segments),
        }
    }

    // Pass 8: adjacent dynamic-layout/index pruning.
    let chain = prune_adjacent_dynamic_layouts(chain);

    let params = chain.last().map(|c| c.params.clone()).unwrap_or_default();
    debug!(
        path,
        chain_len = chain.len(),
        splat_len = splat_segments.len(),
        "resolved chain"
    );
    ResolvedChain {
        matched_paths: chain,
        splat_segments,
        params,
    }
}

/// Pass 1. An index route's trailing empty segment is virtual, so its
/// declared count is adjusted down by one for the depth bound; additionally
/// an index only matches at exactly its own directory depth.
fn filter_admissible(candidates: Vec<MatchCandidate>, real: usize) -> Vec<MatchCandidate> {
    candidates
        .into_iter()
        .filter(|c| {
            let declared = c.raw_segment_len();
            let adjusted = if c.is_index() {
                declared.saturating_sub(1)
            } else {
                declared
            };
            if adjusted > real {
                return false;
            }
            if c.is_index() && c.non_empty_segment_len() != real {
                return false;
            }
            true
        })
        .collect()
}

/// Pass 4. Drops contenders that fail to beat the best definite static score
/// at their own depth, then groups the survivors by declared depth.
fn group_competitive(
    contenders: Vec<MatchCandidate>,
    definite: &[MatchCandidate],
) -> BTreeMap<usize, Vec<MatchCandidate>> {
    let mut static_best: HashMap<usize, u32> = HashMap::new();
    for d in definite {
        let best = static_best.entry(d.raw_segment_len()).or_insert(0);
        *best = (*best).max(d.score);
    }

    let mut groups: BTreeMap<usize, Vec<MatchCandidate>> = BTreeMap::new();
    for c in contenders {
        if let Some(&best) = static_best.get(&c.raw_segment_len()) {
            if c.score <= best {
                continue;
            }
        }
        groups.entry(c.raw_segment_len()).or_default().push(c);
    }
    groups
}

struct DepthPicks {
    winners: Vec<MatchCandidate>,
    wildcard_splat: Option<MatchCandidate>,
    splat_segments: Vec<String>,
}

/// Pass 5. Within each depth group the highest score wins, except that an
/// index matched shallower than the path (its declared count, virtual
/// segment included, exceeds the real count) takes precedence. The best
/// non-ultimate splat seen anywhere is tracked for Pass 7; splat segments
/// are recorded from the winner of the deepest group holding a splat
/// contender.
fn pick_depth_winners(
    groups: BTreeMap<usize, Vec<MatchCandidate>>,
    real: usize,
    path_segments: &[&str],
) -> DepthPicks {
    let mut winners = Vec::new();
    let mut wildcard_splat: Option<MatchCandidate> = None;
    let mut splat_segments = Vec::new();

    for group in groups.into_values() {
        for c in &group {
            if c.is_non_ultimate_splat()
                && wildcard_splat.as_ref().map_or(true, |w| c.score > w.score)
            {
                wildcard_splat = Some(c.clone());
            }
        }

        let group_has_splat = group.iter().any(MatchCandidate::is_non_ultimate_splat);
        let overshoot_index = best_by_score(
            group
                .iter()
                .filter(|c| c.is_index() && c.raw_segment_len() > real),
        );
        let winner = match overshoot_index {
            Some(index) => Some(index.clone()),
            None => best_by_score(group.iter()).cloned(),
        };

        if let Some(winner) = winner {
            if group_has_splat {
                splat_segments = trailing_splat_segments(&winner, path_segments);
            }
            winners.push(winner);
        }
    }

    DepthPicks {
        winners,
        wildcard_splat,
        splat_segments,
    }
}

/// Highest score wins; earlier table order wins ties.
fn best_by_score<'a>(
    iter: impl Iterator<Item = &'a MatchCandidate>,
) -> Option<&'a MatchCandidate> {
    iter.fold(None, |best, c| match best {
        Some(b) if b.score >= c.score => Some(b),
        _ => Some(c),
    })
}

/// Pass 6. A winner that is an index nested under a dynamic segment loses
/// outright to a strictly higher-scoring static layout at the request's own
/// depth whose final segment names a different directory.
fn suppress_dynamic_index_overrides(
    winners: Vec<MatchCandidate>,
    definite: &[MatchCandidate],
    real: usize,
) -> Vec<MatchCandidate> {
    winners
        .into_iter()
        .filter(|w| {
            if !w.is_index_under_dynamic() {
                return true;
            }
            let directory = w.index_directory_segment();
            !definite.iter().any(|d| {
                d.raw_segment_len() == real && d.score > w.score && d.last_segment() != directory
            })
        })
        .collect()
}

/// Pass 7 assembly: definite matches plus depth winners, outermost first.
fn assemble(definite: Vec<MatchCandidate>, winners: Vec<MatchCandidate>) -> Vec<MatchCandidate> {
    let mut chain = definite;
    chain.extend(winners);
    chain.sort_by_key(MatchCandidate::raw_segment_len);
    chain
}

/// Pass 7 correction test. The last entry's constructive length (declared
/// length minus the index's virtual segment) must land exactly on the path
/// unless the entry itself carries a splat tail.
fn needs_different_splat(last: &MatchCandidate, real: usize) -> bool {
    let constructive = last.raw_segment_len() - usize::from(last.is_index());
    if constructive > real {
        // Splat is too far out.
        return true;
    }
    // Splat is needed but missing.
    constructive < real && !last.has_splat_tail()
}

/// Pass 8. A dynamic layout immediately followed by an index from a
/// different dynamic branch is dropped from the chain.
fn prune_adjacent_dynamic_layouts(chain: Vec<MatchCandidate>) -> Vec<MatchCandidate> {
    let dropped: Vec<bool> = chain
        .iter()
        .enumerate()
        .map(|(i, c)| {
            if !c.is_dynamic_layout() {
                return false;
            }
            match chain.get(i + 1) {
                Some(next) if next.is_index() => {
                    next.index_directory_segment() != c.last_segment()
                }
                _ => false,
            }
        })
        .collect();

    chain
        .into_iter()
        .zip(dropped)
        .filter(|(_, dropped)| !dropped)
        .map(|(c, _)| c)
        .collect()
}

/// Trailing path segments beyond the winner's non-splat segments.
fn trailing_splat_segments(winner: &MatchCandidate, path_segments: &[&str]) -> Vec<String> {
    let consumed = winner.non_splat_segment_len().min(path_segments.len());
    path_segments[consumed..]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Terminal fallback: the ultimate catch alone, absorbing the whole path.
fn ultimate_fallback(ultimate: Option<MatchCandidate>, path_segments: &[&str]) -> ResolvedChain {
    match ultimate {
        Some(c) => ResolvedChain {
            params: c.params.clone(),
            matched_paths: vec![c],
            splat_segments: path_segments.iter().map(|s| s.to_string()).collect(),
        },
        // Structural no-match: only possible when no ultimate catch was
        // registered among the candidates.
        None => ResolvedChain::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::route::RouteDefinition;
    use pretty_assertions::assert_eq;

    fn candidate(pattern: &str, path: &str) -> MatchCandidate {
        let table = RouteTable::new(vec![
            RouteDefinition::new("/*", "catch"),
            RouteDefinition::new(pattern, pattern),
        ])
        .unwrap();
        initial_matching_paths(&table, path)
            .into_iter()
            .find(|c| c.route.pattern == pattern)
            .expect("pattern should match path")
    }

    #[test]
    fn admissibility_drops_too_deep_candidates() {
        let deep = candidate("/a/b", "/a/b");
        let out = filter_admissible(vec![deep], 1);
        assert!(out.is_empty());
    }

    #[test]
    fn admissibility_allows_index_at_own_depth_only() {
        let index = candidate("/lion/", "/lion");
        assert_eq!(filter_admissible(vec![index.clone()], 1).len(), 1);

        // The same index is inadmissible for a deeper request.
        let index_deeper = candidate("/lion/", "/lion/cub");
        assert!(filter_admissible(vec![index_deeper], 2).is_empty());
    }

    #[test]
    fn competitive_grouping_drops_losers_against_static_baseline() {
        let dynamic = candidate("/:param", "/lion");
        let layout = candidate("/lion", "/lion");
        let groups = group_competitive(vec![dynamic], &[layout]);
        assert!(groups.is_empty());
    }

    #[test]
    fn competitive_grouping_keeps_unchallenged_depths() {
        let dynamic = candidate("/lion/:id", "/lion/123");
        let layout = candidate("/lion", "/lion/123");
        let groups = group_competitive(vec![dynamic], &[layout]);
        assert_eq!(groups.len(), 1);
        assert!(groups.contains_key(&2));
    }

    #[test]
    fn depth_winner_prefers_overshooting_index() {
        // Both fit /gallery/latest at depth 3; index precedence beats score.
        let index = candidate("/gallery/:album/", "/gallery/latest");
        let dynamic = candidate("/gallery/latest/*", "/gallery/latest");
        assert!(dynamic.score > index.score);

        let mut groups = BTreeMap::new();
        groups.insert(3usize, vec![dynamic, index.clone()]);
        let picks = pick_depth_winners(groups, 2, &["gallery", "latest"]);
        assert_eq!(picks.winners, vec![index]);
    }

    #[test]
    fn wildcard_splat_tracks_best_splat_across_depths() {
        let shallow = candidate("/docs/*", "/docs/a/b");
        let deep = candidate("/docs/a/*", "/docs/a/b");
        let mut groups = BTreeMap::new();
        groups.insert(2usize, vec![shallow]);
        groups.insert(3usize, vec![deep.clone()]);
        let picks = pick_depth_winners(groups, 2, &["docs", "a", "b"]);
        assert_eq!(picks.wildcard_splat, Some(deep));
    }

    #[test]
    fn splat_segments_come_from_group_winner() {
        let splat = candidate("/lion/*", "/lion/123/456");
        let mut groups = BTreeMap::new();
        groups.insert(2usize, vec![splat]);
        let picks = pick_depth_winners(groups, 3, &["lion", "123", "456"]);
        assert_eq!(picks.splat_segments, vec!["123", "456"]);
    }

    #[test]
    fn dynamic_index_override_suppression() {
        let index = candidate("/dynamic-index/:param/", "/dynamic-index/override");
        let sibling = candidate("/dynamic-index/override", "/dynamic-index/override");
        assert!(index.is_index_under_dynamic());
        let out = suppress_dynamic_index_overrides(vec![index], &[sibling], 2);
        assert!(out.is_empty());
    }

    #[test]
    fn dynamic_index_survives_without_static_sibling() {
        let index = candidate("/dynamic-index/:param/", "/dynamic-index/foo");
        let out = suppress_dynamic_index_overrides(vec![index.clone()], &[], 2);
        assert_eq!(out, vec![index]);
    }

    #[test]
    fn splat_correction_flags_missing_splat() {
        let layout = candidate("/lion", "/lion/deeper");
        assert!(needs_different_splat(&layout, 2));

        let splat = candidate("/lion/*", "/lion/deeper/still");
        assert!(!needs_different_splat(&splat, 3));

        let index = candidate("/lion/", "/lion");
        assert!(!needs_different_splat(&index, 1));
    }

    #[test]
    fn adjacent_dynamic_layout_from_other_branch_is_pruned() {
        let dynamic_layout = candidate("/x/:a", "/x/b");
        let index = candidate("/x/b/", "/x/b");
        let chain = prune_adjacent_dynamic_layouts(vec![dynamic_layout, index.clone()]);
        assert_eq!(chain, vec![index]);
    }

    #[test]
    fn adjacent_dynamic_layout_from_same_branch_is_kept() {
        let dynamic_layout = candidate("/x/:a", "/x/b");
        let index = candidate("/x/:a/", "/x/b");
        let chain =
            prune_adjacent_dynamic_layouts(vec![dynamic_layout.clone(), index.clone()]);
        assert_eq!(chain, vec![dynamic_layout, index]);
    }
}
