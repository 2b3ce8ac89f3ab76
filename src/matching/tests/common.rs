use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::NaiveTime;
use serde_json::Value;

use crate::matching::allocation::{PriorityWeights, RoomAllocator};
use crate::matching::dealbreakers::{DealBreakerFilter, DealBreakerPolicy};
use crate::matching::domain::{
    Assignment, CleanlinessStandards, CohortId, ConflictStyle, DietStyle, Gender,
    LifestylePreferences, OrdinalLevel, PersonalityTraits, Profile, ProfileId, Room, RoomId,
    SleepSchedule, SmokingHabit, SocialPreferences, StudyHabits, StudyLocation, ToleranceLevel,
};
use crate::matching::repository::{
    AssignmentRepository, InMemoryAssignmentRepository, InMemoryProfileStore,
    InMemoryRoomDirectory, ReservationError, RoomDirectory, StoreError,
};
use crate::matching::scoring::{CompatibilityScorer, ScoringConfig};
use crate::matching::service::MatchingService;

pub(super) const COHORT: &str = "fall-2026";

pub(super) fn cohort() -> CohortId {
    CohortId(COHORT.to_string())
}

pub(super) fn time(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).expect("valid time")
}

pub(super) fn level(value: u8) -> OrdinalLevel {
    OrdinalLevel::new(value).expect("valid ordinal")
}

/// Baseline early-sleeping, tidy, non-smoking profile. Tests tweak fields
/// from here so each case states only what it cares about.
pub(super) fn profile(id: &str) -> Profile {
    Profile {
        profile_id: ProfileId(id.to_string()),
        cohort_id: cohort(),
        display_name: format!("Resident {id}"),
        age: 20,
        gender: Gender::Female,
        academic_track: "Computer Science".to_string(),
        academic_year: 2,
        home_region: "North".to_string(),
        lifestyle: LifestylePreferences {
            smoking: SmokingHabit::Never,
            smoking_tolerance: ToleranceLevel::Low,
            diet: DietStyle::NoPreference,
            cooks_in_room: false,
            has_pet: false,
        },
        study: StudyHabits {
            daily_study_hours: Some(4),
            study_location: StudyLocation::Library,
            needs_quiet: true,
        },
        cleanliness: CleanlinessStandards {
            tidiness: level(5),
            cleaning_frequency: level(4),
            shares_chores: true,
        },
        social: SocialPreferences {
            sociability: level(3),
            guest_frequency: level(2),
            shared_interests: ["reading", "hiking"]
                .into_iter()
                .map(str::to_string)
                .collect(),
        },
        sleep: SleepSchedule {
            bedtime: time(22, 30),
            wake_time: time(7, 0),
            light_sleeper: false,
        },
        personality: PersonalityTraits {
            introversion: level(3),
            openness: Some(level(4)),
            conflict_style: ConflictStyle::Direct,
        },
        deal_breakers: BTreeSet::new(),
    }
}

pub(super) fn room(id: &str, floor: u8, capacity: u8) -> Room {
    Room {
        room_id: RoomId(id.to_string()),
        floor,
        capacity,
        occupancy: 0,
        amenities: vec!["desk".to_string()],
        available: true,
    }
}

pub(super) fn scorer() -> CompatibilityScorer {
    CompatibilityScorer::new(ScoringConfig::default())
}

pub(super) fn filter() -> DealBreakerFilter {
    DealBreakerFilter::new(DealBreakerPolicy::default())
}

pub(super) type TestService =
    MatchingService<InMemoryProfileStore, InMemoryRoomDirectory, InMemoryAssignmentRepository>;

pub(super) fn build_service(
    profiles: Vec<Profile>,
    rooms: Vec<Room>,
) -> (
    TestService,
    Arc<InMemoryRoomDirectory>,
    Arc<InMemoryAssignmentRepository>,
) {
    let profile_store =
        Arc::new(InMemoryProfileStore::with_profiles(profiles).expect("unique profile ids"));
    let room_directory = Arc::new(InMemoryRoomDirectory::with_rooms(rooms));
    let assignments = Arc::new(InMemoryAssignmentRepository::default());

    let service = MatchingService::new(
        profile_store,
        room_directory.clone(),
        assignments.clone(),
        scorer(),
        filter(),
        RoomAllocator::new(PriorityWeights::default()),
    );

    (service, room_directory, assignments)
}

/// Room directory that loses the first compare-and-swap to a simulated
/// concurrent admin assignment, so callers must retry against fresh state.
pub(super) struct ContendedRoomDirectory {
    inner: InMemoryRoomDirectory,
    raced: AtomicBool,
}

impl ContendedRoomDirectory {
    pub(super) fn new(rooms: Vec<Room>) -> Self {
        Self {
            inner: InMemoryRoomDirectory::with_rooms(rooms),
            raced: AtomicBool::new(false),
        }
    }
}

impl RoomDirectory for ContendedRoomDirectory {
    fn available_rooms(&self) -> Result<Vec<Room>, StoreError> {
        self.inner.available_rooms()
    }

    fn reserve(
        &self,
        room_id: &RoomId,
        seats: u8,
        expected_occupancy: u8,
    ) -> Result<u8, ReservationError> {
        if !self.raced.swap(true, Ordering::AcqRel) {
            // A concurrent manual assignment grabbed one seat first.
            let current = self.inner.reserve(room_id, 1, expected_occupancy)?;
            return Err(ReservationError::Stale { current });
        }
        self.inner.reserve(room_id, seats, expected_occupancy)
    }

    fn release(&self, room_id: &RoomId, seats: u8) -> Result<(), ReservationError> {
        self.inner.release(room_id, seats)
    }
}

/// Assignment repository that accepts reads but refuses every batch commit,
/// for exercising the reservation rollback path.
#[derive(Default)]
pub(super) struct UnavailableAssignmentRepository;

impl AssignmentRepository for UnavailableAssignmentRepository {
    fn commit_batch(
        &self,
        _cohort_id: &CohortId,
        _assignments: Vec<Assignment>,
    ) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("assignment store offline".to_string()))
    }

    fn current(&self, _cohort_id: &CohortId) -> Result<Vec<Assignment>, StoreError> {
        Ok(Vec::new())
    }
}

/// Assignment repository that accepts the first batch and goes offline for
/// every later commit, for exercising aborted reruns.
#[derive(Default)]
pub(super) struct FlakyAssignmentRepository {
    inner: InMemoryAssignmentRepository,
    committed_once: AtomicBool,
}

impl AssignmentRepository for FlakyAssignmentRepository {
    fn commit_batch(
        &self,
        cohort_id: &CohortId,
        assignments: Vec<Assignment>,
    ) -> Result<(), StoreError> {
        if self.committed_once.swap(true, Ordering::AcqRel) {
            return Err(StoreError::Unavailable("assignment store offline".to_string()));
        }
        self.inner.commit_batch(cohort_id, assignments)
    }

    fn current(&self, cohort_id: &CohortId) -> Result<Vec<Assignment>, StoreError> {
        self.inner.current(cohort_id)
    }
}

/// Repository wrapper counting commits, to assert all-or-nothing batches.
#[derive(Default)]
pub(super) struct CountingAssignmentRepository {
    inner: InMemoryAssignmentRepository,
    commits: Mutex<usize>,
}

impl CountingAssignmentRepository {
    pub(super) fn commit_count(&self) -> usize {
        *self.commits.lock().expect("commit counter poisoned")
    }
}

impl AssignmentRepository for CountingAssignmentRepository {
    fn commit_batch(
        &self,
        cohort_id: &CohortId,
        assignments: Vec<Assignment>,
    ) -> Result<(), StoreError> {
        *self.commits.lock().expect("commit counter poisoned") += 1;
        self.inner.commit_batch(cohort_id, assignments)
    }

    fn current(&self, cohort_id: &CohortId) -> Result<Vec<Assignment>, StoreError> {
        self.inner.current(cohort_id)
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
