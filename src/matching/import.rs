use std::collections::BTreeSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::NaiveTime;
use serde::Deserialize;

use super::domain::{
    CleanlinessStandards, CohortId, ConflictStyle, DealBreakerTag, DietStyle, Gender,
    InvalidOrdinal, LifestylePreferences, OrdinalLevel, PersonalityTraits, Profile, ProfileId,
    Room, RoomId, SleepSchedule, SmokingHabit, SocialPreferences, StudyHabits, StudyLocation,
    ToleranceLevel,
};

/// Errors raised while importing survey or room CSV exports.
#[derive(Debug, thiserror::Error)]
pub enum CohortImportError {
    #[error("failed to read csv: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to open {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("row {row}: unrecognized {field} value '{value}'")]
    BadValue {
        row: usize,
        field: &'static str,
        value: String,
    },
    #[error("row {row}: {source}")]
    BadOrdinal { row: usize, source: InvalidOrdinal },
    #[error("row {row}: '{value}' is not a HH:MM time")]
    BadTime { row: usize, value: String },
    #[error("row {row}: {detail}")]
    BadRoom { row: usize, detail: String },
}

/// Import survey rows from a CSV export. Multi-valued cells use semicolons,
/// times use 24h `HH:MM`, and optional answers may be blank.
pub fn profiles_from_reader<R: Read>(reader: R) -> Result<Vec<Profile>, CohortImportError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut profiles = Vec::new();
    for (index, record) in csv_reader.deserialize::<ProfileRow>().enumerate() {
        // Header is line 1, first data row line 2.
        let row = index + 2;
        profiles.push(record?.into_profile(row)?);
    }
    Ok(profiles)
}

pub fn profiles_from_path<P: AsRef<Path>>(path: P) -> Result<Vec<Profile>, CohortImportError> {
    let file = File::open(path.as_ref()).map_err(|source| CohortImportError::Io {
        path: path.as_ref().display().to_string(),
        source,
    })?;
    profiles_from_reader(file)
}

/// Import the room inventory from a CSV export.
pub fn rooms_from_reader<R: Read>(reader: R) -> Result<Vec<Room>, CohortImportError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut rooms = Vec::new();
    for (index, record) in csv_reader.deserialize::<RoomRow>().enumerate() {
        let row = index + 2;
        rooms.push(record?.into_room(row)?);
    }
    Ok(rooms)
}

pub fn rooms_from_path<P: AsRef<Path>>(path: P) -> Result<Vec<Room>, CohortImportError> {
    let file = File::open(path.as_ref()).map_err(|source| CohortImportError::Io {
        path: path.as_ref().display().to_string(),
        source,
    })?;
    rooms_from_reader(file)
}

#[derive(Debug, Deserialize)]
struct ProfileRow {
    profile_id: String,
    cohort_id: String,
    display_name: String,
    age: u8,
    gender: String,
    academic_track: String,
    academic_year: u8,
    home_region: String,
    smoking: String,
    smoking_tolerance: String,
    diet: String,
    cooks_in_room: String,
    has_pet: String,
    #[serde(default, deserialize_with = "empty_as_none")]
    daily_study_hours: Option<u8>,
    study_location: String,
    needs_quiet: String,
    tidiness: u8,
    cleaning_frequency: u8,
    shares_chores: String,
    sociability: u8,
    guest_frequency: u8,
    #[serde(default)]
    shared_interests: String,
    bedtime: String,
    wake_time: String,
    light_sleeper: String,
    introversion: u8,
    #[serde(default, deserialize_with = "empty_as_none")]
    openness: Option<u8>,
    conflict_style: String,
    #[serde(default)]
    deal_breakers: String,
}

impl ProfileRow {
    fn into_profile(self, row: usize) -> Result<Profile, CohortImportError> {
        let ordinal = |value: u8| {
            OrdinalLevel::new(value).map_err(|source| CohortImportError::BadOrdinal { row, source })
        };

        Ok(Profile {
            profile_id: ProfileId(self.profile_id),
            cohort_id: CohortId(self.cohort_id),
            display_name: self.display_name,
            age: self.age,
            gender: parse_gender(&self.gender, row)?,
            academic_track: self.academic_track,
            academic_year: self.academic_year,
            home_region: self.home_region,
            lifestyle: LifestylePreferences {
                smoking: parse_smoking(&self.smoking, row)?,
                smoking_tolerance: parse_tolerance(&self.smoking_tolerance, row)?,
                diet: parse_diet(&self.diet, row)?,
                cooks_in_room: parse_bool(&self.cooks_in_room, "cooks_in_room", row)?,
                has_pet: parse_bool(&self.has_pet, "has_pet", row)?,
            },
            study: StudyHabits {
                daily_study_hours: self.daily_study_hours,
                study_location: parse_study_location(&self.study_location, row)?,
                needs_quiet: parse_bool(&self.needs_quiet, "needs_quiet", row)?,
            },
            cleanliness: CleanlinessStandards {
                tidiness: ordinal(self.tidiness)?,
                cleaning_frequency: ordinal(self.cleaning_frequency)?,
                shares_chores: parse_bool(&self.shares_chores, "shares_chores", row)?,
            },
            social: SocialPreferences {
                sociability: ordinal(self.sociability)?,
                guest_frequency: ordinal(self.guest_frequency)?,
                shared_interests: split_multi(&self.shared_interests),
            },
            sleep: SleepSchedule {
                bedtime: parse_time(&self.bedtime, row)?,
                wake_time: parse_time(&self.wake_time, row)?,
                light_sleeper: parse_bool(&self.light_sleeper, "light_sleeper", row)?,
            },
            personality: PersonalityTraits {
                introversion: ordinal(self.introversion)?,
                openness: self.openness.map(ordinal).transpose()?,
                conflict_style: parse_conflict_style(&self.conflict_style, row)?,
            },
            deal_breakers: parse_deal_breakers(&self.deal_breakers, row)?,
        })
    }
}

#[derive(Debug, Deserialize)]
struct RoomRow {
    room_id: String,
    floor: u8,
    capacity: u8,
    #[serde(default)]
    occupancy: u8,
    #[serde(default)]
    amenities: String,
    available: String,
}

impl RoomRow {
    fn into_room(self, row: usize) -> Result<Room, CohortImportError> {
        // Bad inventory is rejected at intake rather than silently skipped
        // once allocation runs.
        if self.capacity < 2 {
            return Err(CohortImportError::BadRoom {
                row,
                detail: format!(
                    "room {} capacity {} cannot host a pair",
                    self.room_id, self.capacity
                ),
            });
        }
        if self.occupancy > self.capacity {
            return Err(CohortImportError::BadRoom {
                row,
                detail: format!(
                    "room {} occupancy {} exceeds capacity {}",
                    self.room_id, self.occupancy, self.capacity
                ),
            });
        }

        Ok(Room {
            room_id: RoomId(self.room_id),
            floor: self.floor,
            capacity: self.capacity,
            occupancy: self.occupancy,
            amenities: split_multi(&self.amenities).into_iter().collect(),
            available: parse_bool(&self.available, "available", row)?,
        })
    }
}

fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<u8>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value
            .parse::<u8>()
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

fn split_multi(raw: &str) -> BTreeSet<String> {
    raw.split(';')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect()
}

fn bad_value(row: usize, field: &'static str, value: &str) -> CohortImportError {
    CohortImportError::BadValue {
        row,
        field,
        value: value.to_string(),
    }
}

fn parse_bool(raw: &str, field: &'static str, row: usize) -> Result<bool, CohortImportError> {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "yes" | "y" | "1" => Ok(true),
        "false" | "no" | "n" | "0" => Ok(false),
        _ => Err(bad_value(row, field, raw)),
    }
}

fn parse_gender(raw: &str, row: usize) -> Result<Gender, CohortImportError> {
    match raw.to_ascii_lowercase().as_str() {
        "female" | "f" => Ok(Gender::Female),
        "male" | "m" => Ok(Gender::Male),
        "non_binary" | "nonbinary" | "nb" => Ok(Gender::NonBinary),
        _ => Err(bad_value(row, "gender", raw)),
    }
}

fn parse_smoking(raw: &str, row: usize) -> Result<SmokingHabit, CohortImportError> {
    match raw.to_ascii_lowercase().as_str() {
        "never" => Ok(SmokingHabit::Never),
        "occasional" => Ok(SmokingHabit::Occasional),
        "regular" => Ok(SmokingHabit::Regular),
        _ => Err(bad_value(row, "smoking", raw)),
    }
}

fn parse_tolerance(raw: &str, row: usize) -> Result<ToleranceLevel, CohortImportError> {
    match raw.to_ascii_lowercase().as_str() {
        "none" => Ok(ToleranceLevel::None),
        "low" => Ok(ToleranceLevel::Low),
        "medium" => Ok(ToleranceLevel::Medium),
        "high" => Ok(ToleranceLevel::High),
        _ => Err(bad_value(row, "smoking_tolerance", raw)),
    }
}

fn parse_diet(raw: &str, row: usize) -> Result<DietStyle, CohortImportError> {
    match raw.to_ascii_lowercase().as_str() {
        "vegetarian" => Ok(DietStyle::Vegetarian),
        "non_vegetarian" | "nonvegetarian" => Ok(DietStyle::NonVegetarian),
        "no_preference" | "any" => Ok(DietStyle::NoPreference),
        _ => Err(bad_value(row, "diet", raw)),
    }
}

fn parse_study_location(raw: &str, row: usize) -> Result<StudyLocation, CohortImportError> {
    match raw.to_ascii_lowercase().as_str() {
        "in_room" | "room" => Ok(StudyLocation::InRoom),
        "library" => Ok(StudyLocation::Library),
        "flexible" => Ok(StudyLocation::Flexible),
        _ => Err(bad_value(row, "study_location", raw)),
    }
}

fn parse_conflict_style(raw: &str, row: usize) -> Result<ConflictStyle, CohortImportError> {
    match raw.to_ascii_lowercase().as_str() {
        "direct" => Ok(ConflictStyle::Direct),
        "accommodating" => Ok(ConflictStyle::Accommodating),
        "avoidant" => Ok(ConflictStyle::Avoidant),
        _ => Err(bad_value(row, "conflict_style", raw)),
    }
}

fn parse_deal_breakers(
    raw: &str,
    row: usize,
) -> Result<BTreeSet<DealBreakerTag>, CohortImportError> {
    split_multi(raw)
        .into_iter()
        .map(|entry| match entry.to_ascii_lowercase().as_str() {
            "smoking" => Ok(DealBreakerTag::Smoking),
            "messy" => Ok(DealBreakerTag::Messy),
            "frequent_guests" | "frequent-guests" => Ok(DealBreakerTag::FrequentGuests),
            "night_owl" | "night-owl" => Ok(DealBreakerTag::NightOwl),
            "pets" => Ok(DealBreakerTag::Pets),
            _ => Err(CohortImportError::BadValue {
                row,
                field: "deal_breakers",
                value: entry,
            }),
        })
        .collect()
}

fn parse_time(raw: &str, row: usize) -> Result<NaiveTime, CohortImportError> {
    NaiveTime::parse_from_str(raw.trim(), "%H:%M").map_err(|_| CohortImportError::BadTime {
        row,
        value: raw.to_string(),
    })
}
