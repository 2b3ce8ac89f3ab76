use std::collections::HashMap;
use std::sync::Mutex;

use super::domain::{Assignment, CohortId, Profile, ProfileId, Room, RoomId};

/// Error enumeration for profile and assignment store failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Failure modes for the atomic room reservation.
#[derive(Debug, thiserror::Error)]
pub enum ReservationError {
    #[error("room not found")]
    NotFound,
    #[error("room occupancy changed underneath the reservation (current {current})")]
    Stale { current: u8 },
    #[error("room lacks capacity for {requested} more occupant(s)")]
    Full { requested: u8 },
    #[error("room directory unavailable: {0}")]
    Unavailable(String),
}

/// Source of validated survey records. One immutable record per person per
/// cohort; resubmission is a conflict, not an update.
pub trait ProfileStore: Send + Sync {
    fn insert(&self, profile: Profile) -> Result<(), StoreError>;

    /// Frozen snapshot for one matching run. Profiles submitted afterwards
    /// are deferred to the next cycle.
    fn cohort_snapshot(&self, cohort_id: &CohortId) -> Result<Vec<Profile>, StoreError>;

    fn fetch(&self, profile_id: &ProfileId) -> Result<Option<Profile>, StoreError>;
}

/// Room inventory with atomic occupancy updates.
pub trait RoomDirectory: Send + Sync {
    fn available_rooms(&self) -> Result<Vec<Room>, StoreError>;

    /// Compare-and-swap occupancy update: succeeds only when the room's
    /// current occupancy still equals `expected_occupancy`. A losing caller
    /// receives `Stale` with the fresh value and must retry against it; the
    /// room's declared capacity is never exceeded.
    fn reserve(
        &self,
        room_id: &RoomId,
        seats: u8,
        expected_occupancy: u8,
    ) -> Result<u8, ReservationError>;

    /// Roll back seats taken by an aborted batch.
    fn release(&self, room_id: &RoomId, seats: u8) -> Result<(), ReservationError>;
}

/// Committed assignment batches, swapped atomically per cohort so readers
/// always see the last complete batch and never a half-written one.
pub trait AssignmentRepository: Send + Sync {
    fn commit_batch(
        &self,
        cohort_id: &CohortId,
        assignments: Vec<Assignment>,
    ) -> Result<(), StoreError>;

    fn current(&self, cohort_id: &CohortId) -> Result<Vec<Assignment>, StoreError>;
}

/// Mutex-backed profile store for the CLI pipeline and tests.
#[derive(Debug, Default)]
pub struct InMemoryProfileStore {
    profiles: Mutex<HashMap<ProfileId, Profile>>,
}

impl InMemoryProfileStore {
    pub fn with_profiles(profiles: Vec<Profile>) -> Result<Self, StoreError> {
        let store = Self::default();
        for profile in profiles {
            store.insert(profile)?;
        }
        Ok(store)
    }
}

impl ProfileStore for InMemoryProfileStore {
    fn insert(&self, profile: Profile) -> Result<(), StoreError> {
        let mut guard = self.profiles.lock().expect("profile store mutex poisoned");
        if guard.contains_key(&profile.profile_id) {
            return Err(StoreError::Conflict);
        }
        guard.insert(profile.profile_id.clone(), profile);
        Ok(())
    }

    fn cohort_snapshot(&self, cohort_id: &CohortId) -> Result<Vec<Profile>, StoreError> {
        let guard = self.profiles.lock().expect("profile store mutex poisoned");
        let mut snapshot: Vec<Profile> = guard
            .values()
            .filter(|profile| &profile.cohort_id == cohort_id)
            .cloned()
            .collect();
        snapshot.sort_by(|a, b| a.profile_id.cmp(&b.profile_id));
        Ok(snapshot)
    }

    fn fetch(&self, profile_id: &ProfileId) -> Result<Option<Profile>, StoreError> {
        let guard = self.profiles.lock().expect("profile store mutex poisoned");
        Ok(guard.get(profile_id).cloned())
    }
}

/// Mutex-backed room directory implementing the compare-and-swap contract.
#[derive(Debug, Default)]
pub struct InMemoryRoomDirectory {
    rooms: Mutex<HashMap<RoomId, Room>>,
}

impl InMemoryRoomDirectory {
    pub fn with_rooms(rooms: Vec<Room>) -> Self {
        let map = rooms
            .into_iter()
            .map(|room| (room.room_id.clone(), room))
            .collect();
        Self {
            rooms: Mutex::new(map),
        }
    }
}

impl RoomDirectory for InMemoryRoomDirectory {
    fn available_rooms(&self) -> Result<Vec<Room>, StoreError> {
        let guard = self.rooms.lock().expect("room directory mutex poisoned");
        let mut rooms: Vec<Room> = guard
            .values()
            .filter(|room| room.available)
            .cloned()
            .collect();
        rooms.sort_by(|a, b| a.floor.cmp(&b.floor).then_with(|| a.room_id.cmp(&b.room_id)));
        Ok(rooms)
    }

    fn reserve(
        &self,
        room_id: &RoomId,
        seats: u8,
        expected_occupancy: u8,
    ) -> Result<u8, ReservationError> {
        let mut guard = self.rooms.lock().expect("room directory mutex poisoned");
        let room = guard.get_mut(room_id).ok_or(ReservationError::NotFound)?;

        if room.occupancy != expected_occupancy {
            return Err(ReservationError::Stale {
                current: room.occupancy,
            });
        }
        if room.remaining_capacity() < seats {
            return Err(ReservationError::Full { requested: seats });
        }

        room.occupancy += seats;
        Ok(room.occupancy)
    }

    fn release(&self, room_id: &RoomId, seats: u8) -> Result<(), ReservationError> {
        let mut guard = self.rooms.lock().expect("room directory mutex poisoned");
        let room = guard.get_mut(room_id).ok_or(ReservationError::NotFound)?;
        room.occupancy = room.occupancy.saturating_sub(seats);
        Ok(())
    }
}

/// Mutex-backed assignment repository with per-cohort atomic batch swap.
#[derive(Debug, Default)]
pub struct InMemoryAssignmentRepository {
    batches: Mutex<HashMap<CohortId, Vec<Assignment>>>,
}

impl AssignmentRepository for InMemoryAssignmentRepository {
    fn commit_batch(
        &self,
        cohort_id: &CohortId,
        assignments: Vec<Assignment>,
    ) -> Result<(), StoreError> {
        let mut guard = self.batches.lock().expect("assignment mutex poisoned");
        guard.insert(cohort_id.clone(), assignments);
        Ok(())
    }

    fn current(&self, cohort_id: &CohortId) -> Result<Vec<Assignment>, StoreError> {
        let guard = self.batches.lock().expect("assignment mutex poisoned");
        Ok(guard.get(cohort_id).cloned().unwrap_or_default())
    }
}
