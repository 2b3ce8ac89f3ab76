use std::collections::BTreeSet;

use serde::Serialize;
use tracing::debug;

use super::domain::ProfileId;
use super::graph::{CompatibilityEdge, CompatibilityGraph, PairKey};

/// One committed pair from a matching pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchedPair {
    pub pair: PairKey,
    pub score: u8,
}

/// Result of a greedy pass: a valid matching (no profile in two pairs) plus
/// every profile left over, surfaced explicitly rather than dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchOutcome {
    pub pairs: Vec<MatchedPair>,
    pub unmatched: Vec<ProfileId>,
}

/// Greedy maximum-weight approximation: edges sorted by score descending with
/// pair-key lexicographic order as the tiebreaker, committed whenever both
/// endpoints are still free. O(e log e) in the admissible edge count. This is
/// a deterministic heuristic, not an optimal weighted-matching solver.
pub fn greedy_match(graph: &CompatibilityGraph) -> MatchOutcome {
    let mut edges: Vec<&CompatibilityEdge> = graph.edges().collect();
    edges.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| a.pair.cmp(&b.pair)));

    let mut taken: BTreeSet<&ProfileId> = BTreeSet::new();
    let mut pairs = Vec::new();

    for edge in edges {
        if taken.contains(&edge.pair.first) || taken.contains(&edge.pair.second) {
            continue;
        }
        taken.insert(&edge.pair.first);
        taken.insert(&edge.pair.second);
        pairs.push(MatchedPair {
            pair: edge.pair.clone(),
            score: edge.score,
        });
    }

    // Odd cohorts and isolated profiles end up here for a later pass or
    // manual handling.
    let unmatched: Vec<ProfileId> = graph
        .profile_ids()
        .filter(|id| !taken.contains(id))
        .cloned()
        .collect();

    debug!(
        cohort = %graph.cohort_id().0,
        pairs = pairs.len(),
        unmatched = unmatched.len(),
        "greedy matching pass complete"
    );

    MatchOutcome { pairs, unmatched }
}
