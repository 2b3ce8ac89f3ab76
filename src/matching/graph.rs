use std::collections::BTreeMap;

use serde::Serialize;

use super::dealbreakers::DealBreakerFilter;
use super::domain::{CohortId, Profile, ProfileId};
use super::scoring::{CompatibilityReport, CompatibilityScorer};

/// Canonical, order-independent key for a profile pair: the lower identifier
/// always comes first, so `edge(A, B)` and `edge(B, A)` are the same entry.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct PairKey {
    pub first: ProfileId,
    pub second: ProfileId,
}

impl PairKey {
    pub fn new(a: ProfileId, b: ProfileId) -> Self {
        if a <= b {
            Self { first: a, second: b }
        } else {
            Self { first: b, second: a }
        }
    }

    pub fn touches(&self, profile_id: &ProfileId) -> bool {
        &self.first == profile_id || &self.second == profile_id
    }

    pub fn partner_of(&self, profile_id: &ProfileId) -> Option<&ProfileId> {
        if &self.first == profile_id {
            Some(&self.second)
        } else if &self.second == profile_id {
            Some(&self.first)
        } else {
            None
        }
    }
}

/// Admissible, scored relationship between two profiles. Derived data only;
/// recomputed from profiles on demand, never treated as ground truth.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompatibilityEdge {
    pub pair: PairKey,
    pub score: u8,
    pub report: CompatibilityReport,
}

/// Errors raised while assembling a cohort graph.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    #[error("profile {0:?} belongs to a different cohort than the graph")]
    CohortMismatch(ProfileId),
    #[error("profile {0:?} already present in the graph")]
    DuplicateProfile(ProfileId),
}

/// Weighted, undirected graph over all admissible pairs in one cohort
/// snapshot. Construction evaluates scorer and filter over all C(n,2) pairs,
/// an O(n^2) cost accepted for batch runs; `extend` adds one profile at the
/// cost of its n-1 touching edges only.
#[derive(Debug)]
pub struct CompatibilityGraph {
    cohort_id: CohortId,
    profiles: BTreeMap<ProfileId, Profile>,
    edges: BTreeMap<PairKey, CompatibilityEdge>,
}

impl CompatibilityGraph {
    pub fn new(cohort_id: CohortId) -> Self {
        Self {
            cohort_id,
            profiles: BTreeMap::new(),
            edges: BTreeMap::new(),
        }
    }

    /// Build the full graph from a frozen snapshot of one cohort's profiles.
    pub fn build(
        cohort_id: CohortId,
        snapshot: Vec<Profile>,
        scorer: &CompatibilityScorer,
        filter: &DealBreakerFilter,
    ) -> Result<Self, GraphError> {
        let mut graph = Self::new(cohort_id);
        for profile in snapshot {
            graph.extend(profile, scorer, filter)?;
        }
        Ok(graph)
    }

    /// Add one profile, computing only the edges that touch it. Inadmissible
    /// pairs (deal-breaker or policy) are never stored, not even with a zero
    /// score.
    pub fn extend(
        &mut self,
        profile: Profile,
        scorer: &CompatibilityScorer,
        filter: &DealBreakerFilter,
    ) -> Result<(), GraphError> {
        if profile.cohort_id != self.cohort_id {
            return Err(GraphError::CohortMismatch(profile.profile_id.clone()));
        }
        if self.profiles.contains_key(&profile.profile_id) {
            return Err(GraphError::DuplicateProfile(profile.profile_id.clone()));
        }

        for existing in self.profiles.values() {
            if !filter.is_admissible(existing, &profile) {
                continue;
            }
            let report = scorer.score(existing, &profile);
            if !report.admissible {
                continue;
            }
            let pair = PairKey::new(existing.profile_id.clone(), profile.profile_id.clone());
            self.edges.insert(
                pair.clone(),
                CompatibilityEdge {
                    pair,
                    score: report.overall,
                    report,
                },
            );
        }

        self.profiles.insert(profile.profile_id.clone(), profile);
        Ok(())
    }

    pub fn cohort_id(&self) -> &CohortId {
        &self.cohort_id
    }

    pub fn profile(&self, profile_id: &ProfileId) -> Option<&Profile> {
        self.profiles.get(profile_id)
    }

    pub fn profile_ids(&self) -> impl Iterator<Item = &ProfileId> {
        self.profiles.keys()
    }

    pub fn profile_count(&self) -> usize {
        self.profiles.len()
    }

    pub fn edge(&self, a: &ProfileId, b: &ProfileId) -> Option<&CompatibilityEdge> {
        self.edges.get(&PairKey::new(a.clone(), b.clone()))
    }

    /// Edges in canonical pair-key order, for reproducible downstream passes.
    pub fn edges(&self) -> impl Iterator<Item = &CompatibilityEdge> {
        self.edges.values()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Admissible edges touching one profile, highest score first with pair
    /// key as the deterministic tiebreaker.
    pub fn edges_for(&self, profile_id: &ProfileId) -> Vec<&CompatibilityEdge> {
        let mut edges: Vec<&CompatibilityEdge> = self
            .edges
            .values()
            .filter(|edge| edge.pair.touches(profile_id))
            .collect();
        edges.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| a.pair.cmp(&b.pair)));
        edges
    }
}
