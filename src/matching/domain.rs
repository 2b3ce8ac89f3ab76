use std::collections::BTreeSet;

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

/// Identifier wrapper for submitted roommate profiles.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProfileId(pub String);

/// Identifier for one matching cycle (e.g., one semester intake).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CohortId(pub String);

/// Identifier for a physical room.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RoomId(pub String);

/// Declared gender used for the same-gender pairing policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Female,
    Male,
    NonBinary,
}

/// Validated ordinal survey answer on the fixed 1..=5 scale.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "u8", into = "u8")]
pub struct OrdinalLevel(u8);

impl OrdinalLevel {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    pub fn new(value: u8) -> Result<Self, InvalidOrdinal> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(InvalidOrdinal(value))
        }
    }

    pub fn value(self) -> u8 {
        self.0
    }

    /// Rank distance between two answers, used by the ordinal penalty table.
    pub fn distance(self, other: Self) -> u8 {
        self.0.abs_diff(other.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("ordinal answer {0} outside the 1..=5 survey scale")]
pub struct InvalidOrdinal(pub u8);

impl TryFrom<u8> for OrdinalLevel {
    type Error = InvalidOrdinal;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<OrdinalLevel> for u8 {
    fn from(level: OrdinalLevel) -> Self {
        level.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SmokingHabit {
    Never,
    Occasional,
    Regular,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToleranceLevel {
    None,
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DietStyle {
    Vegetarian,
    NonVegetarian,
    NoPreference,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StudyLocation {
    InRoom,
    Library,
    Flexible,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictStyle {
    Direct,
    Accommodating,
    Avoidant,
}

/// Day-to-day habits that shape shared living.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifestylePreferences {
    pub smoking: SmokingHabit,
    pub smoking_tolerance: ToleranceLevel,
    pub diet: DietStyle,
    pub cooks_in_room: bool,
    pub has_pet: bool,
}

/// Study rhythm and noise requirements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudyHabits {
    /// Optional; scored as the neutral midpoint when absent.
    pub daily_study_hours: Option<u8>,
    pub study_location: StudyLocation,
    pub needs_quiet: bool,
}

/// Tidiness expectations on the shared ordinal scale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanlinessStandards {
    pub tidiness: OrdinalLevel,
    pub cleaning_frequency: OrdinalLevel,
    pub shares_chores: bool,
}

/// Sociability and guest habits, plus declared interests for overlap bonuses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialPreferences {
    pub sociability: OrdinalLevel,
    pub guest_frequency: OrdinalLevel,
    pub shared_interests: BTreeSet<String>,
}

/// Sleep window in local wall-clock time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SleepSchedule {
    pub bedtime: NaiveTime,
    pub wake_time: NaiveTime,
    pub light_sleeper: bool,
}

/// Self-reported temperament answers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonalityTraits {
    pub introversion: OrdinalLevel,
    /// Optional; scored as the neutral midpoint when absent.
    pub openness: Option<OrdinalLevel>,
    pub conflict_style: ConflictStyle,
}

/// Declared hard constraints. Each tag maps to a trait threshold in the
/// candidate partner that triggers exclusion, see the deal-breaker filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DealBreakerTag {
    Smoking,
    Messy,
    FrequentGuests,
    NightOwl,
    Pets,
}

impl DealBreakerTag {
    pub const fn label(self) -> &'static str {
        match self {
            DealBreakerTag::Smoking => "smoking",
            DealBreakerTag::Messy => "messy",
            DealBreakerTag::FrequentGuests => "frequent_guests",
            DealBreakerTag::NightOwl => "night_owl",
            DealBreakerTag::Pets => "pets",
        }
    }
}

/// One validated survey record. Immutable once submitted for a cohort;
/// resubmission for the same cohort is rejected by the profile store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub profile_id: ProfileId,
    pub cohort_id: CohortId,
    pub display_name: String,
    pub age: u8,
    pub gender: Gender,
    pub academic_track: String,
    pub academic_year: u8,
    pub home_region: String,
    pub lifestyle: LifestylePreferences,
    pub study: StudyHabits,
    pub cleanliness: CleanlinessStandards,
    pub social: SocialPreferences,
    pub sleep: SleepSchedule,
    pub personality: PersonalityTraits,
    pub deal_breakers: BTreeSet<DealBreakerTag>,
}

/// Capacity-bounded room offered to the allocator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    pub room_id: RoomId,
    pub floor: u8,
    pub capacity: u8,
    pub occupancy: u8,
    pub amenities: Vec<String>,
    pub available: bool,
}

impl Room {
    pub fn remaining_capacity(&self) -> u8 {
        self.capacity.saturating_sub(self.occupancy)
    }
}

/// Status workflow for a committed assignment.
///
/// `PendingApproval -> {Confirmed, Rejected}` and `Confirmed -> Completed`;
/// `Rejected` and `Completed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentStatus {
    PendingApproval,
    Confirmed,
    Rejected,
    Completed,
}

impl AssignmentStatus {
    pub const fn label(self) -> &'static str {
        match self {
            AssignmentStatus::PendingApproval => "pending_approval",
            AssignmentStatus::Confirmed => "confirmed",
            AssignmentStatus::Rejected => "rejected",
            AssignmentStatus::Completed => "completed",
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, AssignmentStatus::Rejected | AssignmentStatus::Completed)
    }

    fn allows(self, next: AssignmentStatus) -> bool {
        matches!(
            (self, next),
            (
                AssignmentStatus::PendingApproval,
                AssignmentStatus::Confirmed | AssignmentStatus::Rejected
            ) | (AssignmentStatus::Confirmed, AssignmentStatus::Completed)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid assignment transition {from:?} -> {to:?}")]
pub struct InvalidTransition {
    pub from: AssignmentStatus,
    pub to: AssignmentStatus,
}

/// Committed outcome of a matching run: a pair (or group) placed in a room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub room_id: RoomId,
    pub members: Vec<ProfileId>,
    pub cohort_id: CohortId,
    pub score: u8,
    pub status: AssignmentStatus,
}

impl Assignment {
    /// Advance the status workflow, rejecting transitions outside the table.
    pub fn transition(&mut self, next: AssignmentStatus) -> Result<(), InvalidTransition> {
        if self.status.allows(next) {
            self.status = next;
            Ok(())
        } else {
            Err(InvalidTransition {
                from: self.status,
                to: next,
            })
        }
    }
}
