use serde::Serialize;
use tracing::debug;

use super::domain::{Assignment, AssignmentStatus, Profile, Room};
use super::graph::CompatibilityGraph;
use super::matcher::MatchedPair;

/// Knobs for the pair priority ordering used during allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PriorityWeights {
    /// Points per combined academic year of the pair (seniority first).
    pub seniority_weight: u32,
    /// Flat bonus when both members share a home region.
    pub region_affinity_bonus: u32,
}

impl Default for PriorityWeights {
    fn default() -> Self {
        Self {
            seniority_weight: 10,
            region_affinity_bonus: 15,
        }
    }
}

/// A matched pair the allocator could not place: every open room lacked the
/// remaining capacity. Escalated to an administrator, never force-assigned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnresolvedPair {
    pub pair: MatchedPair,
    pub reason: String,
}

/// Allocation result: pending assignments plus pairs needing escalation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AllocationOutcome {
    pub assignments: Vec<Assignment>,
    pub unresolved: Vec<UnresolvedPair>,
}

/// Capacity-aware allocator. Pairs are placed in priority order into the
/// first open room with enough *remaining* capacity; capacity is decremented
/// rather than the room removed, so larger rooms accept several pairs.
#[derive(Debug, Clone, Default)]
pub struct RoomAllocator {
    weights: PriorityWeights,
}

impl RoomAllocator {
    pub fn new(weights: PriorityWeights) -> Self {
        Self { weights }
    }

    /// Priority for one matched pair: seniority plus region affinity plus the
    /// compatibility score itself.
    pub fn pair_priority(&self, a: &Profile, b: &Profile, score: u8) -> u32 {
        let seniority =
            self.weights.seniority_weight * (a.academic_year as u32 + b.academic_year as u32);
        let affinity = if !a.home_region.is_empty() && a.home_region == b.home_region {
            self.weights.region_affinity_bonus
        } else {
            0
        };
        seniority + affinity + score as u32
    }

    /// Assign matched pairs to rooms. `rooms` is a snapshot; occupancy checks
    /// against live state happen when the batch is committed.
    pub fn allocate(
        &self,
        graph: &CompatibilityGraph,
        pairs: &[MatchedPair],
        rooms: &[Room],
    ) -> AllocationOutcome {
        // Canonical room order: floor, then identifier. Closed rooms and
        // rooms already too full for a pair are skipped up front.
        let mut open_rooms: Vec<Room> = rooms
            .iter()
            .filter(|room| room.available && room.capacity >= 2)
            .cloned()
            .collect();
        open_rooms.sort_by(|a, b| {
            a.floor
                .cmp(&b.floor)
                .then_with(|| a.room_id.cmp(&b.room_id))
        });

        let mut ordered: Vec<(u32, &MatchedPair)> = pairs
            .iter()
            .map(|pair| {
                let priority = match (
                    graph.profile(&pair.pair.first),
                    graph.profile(&pair.pair.second),
                ) {
                    (Some(a), Some(b)) => self.pair_priority(a, b, pair.score),
                    _ => pair.score as u32,
                };
                (priority, pair)
            })
            .collect();
        ordered.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.pair.cmp(&b.1.pair)));

        let mut assignments = Vec::new();
        let mut unresolved = Vec::new();

        for (priority, pair) in ordered {
            let seats = 2u8;
            let slot = open_rooms
                .iter_mut()
                .find(|room| room.remaining_capacity() >= seats);

            match slot {
                Some(room) => {
                    room.occupancy += seats;
                    debug!(
                        room = %room.room_id.0,
                        pair = ?pair.pair,
                        priority,
                        "pair placed"
                    );
                    assignments.push(Assignment {
                        room_id: room.room_id.clone(),
                        members: vec![pair.pair.first.clone(), pair.pair.second.clone()],
                        cohort_id: graph.cohort_id().clone(),
                        score: pair.score,
                        status: AssignmentStatus::PendingApproval,
                    });
                }
                None => unresolved.push(UnresolvedPair {
                    pair: pair.clone(),
                    reason: "no room with sufficient remaining capacity".to_string(),
                }),
            }
        }

        AllocationOutcome {
            assignments,
            unresolved,
        }
    }
}
