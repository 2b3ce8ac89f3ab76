//! Roommate compatibility matching engine.
//!
//! Pairwise multi-criteria scoring, deal-breaker exclusion, graph
//! construction over a cohort snapshot, greedy disjoint pairing, and
//! capacity-aware room allocation, exposed behind one service interface so
//! every front end consumes the same authoritative implementation.

pub mod allocation;
pub(crate) mod dealbreakers;
pub mod domain;
pub mod explain;
pub mod graph;
pub mod import;
pub mod matcher;
pub mod repository;
pub mod router;
pub mod scoring;
pub mod service;

#[cfg(test)]
mod tests;

pub use allocation::{AllocationOutcome, PriorityWeights, RoomAllocator, UnresolvedPair};
pub use dealbreakers::{DealBreakerFilter, DealBreakerPolicy, DealBreakerViolation};
pub use domain::{
    Assignment, AssignmentStatus, CohortId, DealBreakerTag, Gender, InvalidTransition,
    OrdinalLevel, Profile, ProfileId, Room, RoomId,
};
pub use explain::{Explanation, ExplanationGenerator};
pub use graph::{CompatibilityEdge, CompatibilityGraph, GraphError, PairKey};
pub use import::{
    profiles_from_path, profiles_from_reader, rooms_from_path, rooms_from_reader,
    CohortImportError,
};
pub use matcher::{greedy_match, MatchOutcome, MatchedPair};
pub use repository::{
    AssignmentRepository, InMemoryAssignmentRepository, InMemoryProfileStore,
    InMemoryRoomDirectory, ProfileStore, ReservationError, RoomDirectory, StoreError,
};
pub use router::matching_router;
pub use scoring::{
    Category, CategoryScore, CategoryWeights, CompatibilityReport, CompatibilityScorer,
    FieldContribution, ScoringConfig,
};
pub use service::{CancelToken, MatchingRunOutcome, MatchingService, MatchingServiceError};
