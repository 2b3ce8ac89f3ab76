use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use super::allocation::{AllocationOutcome, RoomAllocator, UnresolvedPair};
use super::dealbreakers::DealBreakerFilter;
use super::domain::{Assignment, CohortId, Profile, ProfileId, Room, RoomId};
use super::explain::{Explanation, ExplanationGenerator};
use super::graph::{CompatibilityEdge, CompatibilityGraph, GraphError};
use super::matcher::{greedy_match, MatchOutcome};
use super::repository::{
    AssignmentRepository, ProfileStore, ReservationError, RoomDirectory, StoreError,
};
use super::scoring::CompatibilityScorer;

/// Cooperative cancellation flag for long batch runs. Cancelling aborts the
/// run before anything is committed; previously committed batches stay put.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// Error raised by the matching service.
#[derive(Debug, thiserror::Error)]
pub enum MatchingServiceError {
    #[error("cohort {0:?} has no submitted profiles")]
    CohortNotFound(CohortId),
    #[error("profile {0:?} not found")]
    ProfileNotFound(ProfileId),
    #[error("profiles {0:?} and {1:?} belong to different cohorts")]
    CohortMismatch(ProfileId, ProfileId),
    #[error("matching run cancelled before commit")]
    Cancelled,
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Graph(#[from] GraphError),
}

/// Full pipeline output for one cohort run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchingRunOutcome {
    pub cohort_id: CohortId,
    pub assignments: Vec<Assignment>,
    pub unmatched: Vec<ProfileId>,
    pub unresolved: Vec<UnresolvedPair>,
}

/// Service composing scorer, deal-breaker filter, matcher, and allocator
/// behind the three exposed operations. The batch itself is a pure
/// computation over a frozen snapshot; only room reservation and the final
/// batch commit touch shared state.
pub struct MatchingService<P, R, A> {
    profiles: Arc<P>,
    rooms: Arc<R>,
    assignments: Arc<A>,
    scorer: Arc<CompatibilityScorer>,
    filter: Arc<DealBreakerFilter>,
    allocator: RoomAllocator,
    explainer: ExplanationGenerator,
}

impl<P, R, A> MatchingService<P, R, A>
where
    P: ProfileStore + 'static,
    R: RoomDirectory + 'static,
    A: AssignmentRepository + 'static,
{
    pub fn new(
        profiles: Arc<P>,
        rooms: Arc<R>,
        assignments: Arc<A>,
        scorer: CompatibilityScorer,
        filter: DealBreakerFilter,
        allocator: RoomAllocator,
    ) -> Self {
        let explainer = ExplanationGenerator::new(scorer.config().clone());
        Self {
            profiles,
            rooms,
            assignments,
            scorer: Arc::new(scorer),
            filter: Arc::new(filter),
            allocator,
            explainer,
        }
    }

    /// Execute the full graph -> match -> allocate pipeline for one cohort.
    /// Deterministic and idempotent for an unchanged snapshot: re-running
    /// without new submissions yields byte-identical assignments.
    pub fn run_matching_for_cohort(
        &self,
        cohort_id: &CohortId,
        cancel: &CancelToken,
    ) -> Result<MatchingRunOutcome, MatchingServiceError> {
        let snapshot = self.profiles.cohort_snapshot(cohort_id)?;
        if snapshot.is_empty() {
            return Err(MatchingServiceError::CohortNotFound(cohort_id.clone()));
        }

        info!(cohort = %cohort_id.0, profiles = snapshot.len(), "matching run started");

        let graph = self.build_graph(cohort_id, snapshot, cancel)?;
        let matched = greedy_match(&graph);

        if cancel.is_cancelled() {
            return Err(MatchingServiceError::Cancelled);
        }

        // The new batch replaces the previous one wholesale, so seats held by
        // the superseded batch are given back before the room snapshot is
        // taken. This is what makes an unchanged-snapshot rerun land each
        // pair in the same room again. The released seats are remembered:
        // until the new batch actually commits, the old one is still the
        // current truth and must get its seats back if the run aborts.
        let superseded = self.release_superseded(cohort_id)?;

        let room_snapshot = match self.rooms.available_rooms() {
            Ok(rooms) => rooms,
            Err(error) => {
                self.reclaim(&superseded);
                return Err(error.into());
            }
        };
        let allocation = self
            .allocator
            .allocate(&graph, &matched.pairs, &room_snapshot);

        let outcome = match self.commit(cohort_id, &matched, allocation, &room_snapshot, cancel) {
            Ok(outcome) => outcome,
            Err(error) => {
                self.reclaim(&superseded);
                return Err(error);
            }
        };

        info!(
            cohort = %cohort_id.0,
            assignments = outcome.assignments.len(),
            unmatched = outcome.unmatched.len(),
            unresolved = outcome.unresolved.len(),
            "matching run committed"
        );

        Ok(outcome)
    }

    /// Ad hoc browse query: admissible edges touching one profile, best
    /// first, without running allocation.
    pub fn top_matches(
        &self,
        profile_id: &ProfileId,
        limit: usize,
    ) -> Result<Vec<CompatibilityEdge>, MatchingServiceError> {
        let profile = self
            .profiles
            .fetch(profile_id)?
            .ok_or_else(|| MatchingServiceError::ProfileNotFound(profile_id.clone()))?;

        let snapshot = self.profiles.cohort_snapshot(&profile.cohort_id)?;
        let graph = CompatibilityGraph::build(
            profile.cohort_id.clone(),
            snapshot,
            &self.scorer,
            &self.filter,
        )?;

        Ok(graph
            .edges_for(profile_id)
            .into_iter()
            .take(limit)
            .cloned()
            .collect())
    }

    /// On-demand explanation for one pair. Deal-breaker exclusions come back
    /// as an explicit inadmissible verdict rather than a low score.
    pub fn explain(
        &self,
        a: &ProfileId,
        b: &ProfileId,
    ) -> Result<Explanation, MatchingServiceError> {
        let profile_a = self
            .profiles
            .fetch(a)?
            .ok_or_else(|| MatchingServiceError::ProfileNotFound(a.clone()))?;
        let profile_b = self
            .profiles
            .fetch(b)?
            .ok_or_else(|| MatchingServiceError::ProfileNotFound(b.clone()))?;

        if profile_a.cohort_id != profile_b.cohort_id {
            return Err(MatchingServiceError::CohortMismatch(a.clone(), b.clone()));
        }

        let violations = self.filter.violations(&profile_a, &profile_b);
        if !violations.is_empty() {
            return Ok(Explanation::Inadmissible {
                violations: violations
                    .into_iter()
                    .map(|violation| {
                        format!("{}: {}", violation.tag.label(), violation.detail)
                    })
                    .collect(),
            });
        }

        let report = self.scorer.score(&profile_a, &profile_b);
        Ok(self.explainer.explain(&profile_a, &profile_b, &report))
    }

    /// Last committed assignment set; never blocks on an in-progress run.
    pub fn current_assignments(
        &self,
        cohort_id: &CohortId,
    ) -> Result<Vec<Assignment>, MatchingServiceError> {
        Ok(self.assignments.current(cohort_id)?)
    }

    fn build_graph(
        &self,
        cohort_id: &CohortId,
        snapshot: Vec<Profile>,
        cancel: &CancelToken,
    ) -> Result<CompatibilityGraph, MatchingServiceError> {
        let mut graph = CompatibilityGraph::new(cohort_id.clone());
        for profile in snapshot {
            if cancel.is_cancelled() {
                return Err(MatchingServiceError::Cancelled);
            }
            graph.extend(profile, &self.scorer, &self.filter)?;
        }
        debug!(
            cohort = %cohort_id.0,
            edges = graph.edge_count(),
            "compatibility graph built"
        );
        Ok(graph)
    }

    /// Release the seats held by the cohort's committed batch, returning the
    /// seats actually given back so an aborted run can restore them.
    fn release_superseded(
        &self,
        cohort_id: &CohortId,
    ) -> Result<Vec<(RoomId, u8)>, MatchingServiceError> {
        let mut released = Vec::new();
        for previous in self.assignments.current(cohort_id)? {
            let seats = previous.members.len() as u8;
            match self.rooms.release(&previous.room_id, seats) {
                Ok(()) => released.push((previous.room_id, seats)),
                Err(error) => {
                    warn!(room = %previous.room_id.0, %error, "failed to release superseded seats");
                }
            }
        }
        Ok(released)
    }

    /// Give superseded seats back after an aborted run, so the batch that is
    /// still current keeps its occupancy and cannot be double-booked.
    fn reclaim(&self, released: &[(RoomId, u8)]) {
        for (room_id, seats) in released {
            let mut expected = 0u8;
            loop {
                match self.rooms.reserve(room_id, *seats, expected) {
                    Ok(_) => break,
                    Err(ReservationError::Stale { current }) => expected = current,
                    Err(error) => {
                        warn!(room = %room_id.0, %error, "failed to restore superseded seats");
                        break;
                    }
                }
            }
        }
    }

    /// Reserve room seats via compare-and-swap and commit the batch
    /// all-or-nothing. A reservation lost to a concurrent update is retried
    /// against the fresh occupancy; a pair whose room filled up is requeued
    /// onto the next open room. Any store failure rolls back the seats taken
    /// so far and aborts without a partial commit.
    fn commit(
        &self,
        cohort_id: &CohortId,
        matched: &MatchOutcome,
        allocation: AllocationOutcome,
        room_snapshot: &[Room],
        cancel: &CancelToken,
    ) -> Result<MatchingRunOutcome, MatchingServiceError> {
        let AllocationOutcome {
            assignments: planned,
            mut unresolved,
        } = allocation;

        let mut reserved: Vec<(RoomId, u8)> = Vec::new();
        let mut committed = Vec::new();

        let rollback = |reserved: &[(RoomId, u8)], rooms: &R| {
            for (room_id, seats) in reserved {
                if let Err(error) = rooms.release(room_id, *seats) {
                    warn!(room = %room_id.0, %error, "failed to roll back reservation");
                }
            }
        };

        for assignment in planned {
            if cancel.is_cancelled() {
                rollback(&reserved, self.rooms.as_ref());
                return Err(MatchingServiceError::Cancelled);
            }

            let seats = assignment.members.len() as u8;
            match self.reserve_with_retry(&assignment.room_id, seats, room_snapshot) {
                Ok(room_id) => {
                    reserved.push((room_id.clone(), seats));
                    let mut assignment = assignment;
                    assignment.room_id = room_id;
                    committed.push(assignment);
                }
                Err(ReserveFailure::NoRoom) => {
                    if let [first, second] = assignment.members.as_slice() {
                        unresolved.push(UnresolvedPair {
                            pair: super::matcher::MatchedPair {
                                pair: super::graph::PairKey::new(first.clone(), second.clone()),
                                score: assignment.score,
                            },
                            reason: "room capacity claimed by a concurrent allocation"
                                .to_string(),
                        });
                    }
                }
                Err(ReserveFailure::Store(error)) => {
                    rollback(&reserved, self.rooms.as_ref());
                    return Err(MatchingServiceError::Store(StoreError::Unavailable(
                        error.to_string(),
                    )));
                }
            }
        }

        if let Err(error) = self.assignments.commit_batch(cohort_id, committed.clone()) {
            rollback(&reserved, self.rooms.as_ref());
            return Err(error.into());
        }

        unresolved.sort_by(|a, b| a.pair.pair.cmp(&b.pair.pair));

        Ok(MatchingRunOutcome {
            cohort_id: cohort_id.clone(),
            assignments: committed,
            unmatched: matched.unmatched.clone(),
            unresolved,
        })
    }

    /// Try the planned room first, then fall through the remaining snapshot
    /// rooms in canonical order. Stale occupancy is retried with the fresh
    /// value; a full room moves on to the next candidate.
    fn reserve_with_retry(
        &self,
        planned_room: &RoomId,
        seats: u8,
        room_snapshot: &[Room],
    ) -> Result<RoomId, ReserveFailure> {
        let mut candidates: Vec<&Room> = Vec::new();
        if let Some(planned) = room_snapshot
            .iter()
            .find(|room| &room.room_id == planned_room)
        {
            candidates.push(planned);
        }
        candidates.extend(
            room_snapshot
                .iter()
                .filter(|room| &room.room_id != planned_room && room.available),
        );

        for room in candidates {
            let mut expected = room.occupancy;
            loop {
                match self.rooms.reserve(&room.room_id, seats, expected) {
                    Ok(_) => return Ok(room.room_id.clone()),
                    Err(ReservationError::Stale { current }) => {
                        debug!(room = %room.room_id.0, current, "reservation raced, retrying");
                        expected = current;
                    }
                    Err(ReservationError::Full { .. }) | Err(ReservationError::NotFound) => break,
                    Err(error @ ReservationError::Unavailable(_)) => {
                        return Err(ReserveFailure::Store(error))
                    }
                }
            }
        }

        Err(ReserveFailure::NoRoom)
    }
}

enum ReserveFailure {
    NoRoom,
    Store(ReservationError),
}
