use chrono::NaiveTime;

use super::config::{Category, ScoringConfig};
use super::{CategoryScore, FieldContribution};
use crate::matching::domain::{
    ConflictStyle, DietStyle, OrdinalLevel, Profile, SmokingHabit, StudyLocation, ToleranceLevel,
};

/// Neutral midpoint applied when an optional survey field is missing.
pub(crate) const NEUTRAL_SCORE: u8 = 50;

const MINUTES_PER_DAY: u32 = 24 * 60;

/// Comfort lookup indexed by the partner's habit and one's own tolerance.
/// Non-smokers are frictionless regardless of the partner's tolerance.
const SMOKING_COMFORT: [[u8; 4]; 3] = [
    // partner never smokes
    [100, 100, 100, 100],
    // partner smokes occasionally: tolerance none, low, medium, high
    [30, 60, 85, 100],
    // partner smokes regularly
    [10, 30, 60, 90],
];

fn habit_row(habit: SmokingHabit) -> usize {
    match habit {
        SmokingHabit::Never => 0,
        SmokingHabit::Occasional => 1,
        SmokingHabit::Regular => 2,
    }
}

fn tolerance_column(tolerance: ToleranceLevel) -> usize {
    match tolerance {
        ToleranceLevel::None => 0,
        ToleranceLevel::Low => 1,
        ToleranceLevel::Medium => 2,
        ToleranceLevel::High => 3,
    }
}

/// Both directions are evaluated and the tighter one wins, keeping the field
/// symmetric.
pub(crate) fn smoking_score(a: &Profile, b: &Profile) -> u8 {
    let a_comfort = SMOKING_COMFORT[habit_row(b.lifestyle.smoking)]
        [tolerance_column(a.lifestyle.smoking_tolerance)];
    let b_comfort = SMOKING_COMFORT[habit_row(a.lifestyle.smoking)]
        [tolerance_column(b.lifestyle.smoking_tolerance)];
    a_comfort.min(b_comfort)
}

pub(crate) fn ordinal_score(a: OrdinalLevel, b: OrdinalLevel, table: &[u8; 5]) -> u8 {
    let distance = a.distance(b) as usize;
    table[distance.min(table.len() - 1)]
}

pub(crate) fn optional_ordinal_score(
    a: Option<OrdinalLevel>,
    b: Option<OrdinalLevel>,
    table: &[u8; 5],
) -> u8 {
    match (a, b) {
        (Some(a), Some(b)) => ordinal_score(a, b, table),
        _ => NEUTRAL_SCORE,
    }
}

/// Minute gap between two wall-clock times measured around the clock face, so
/// 23:30 and 00:30 are one hour apart.
pub(crate) fn circular_minute_gap(a: NaiveTime, b: NaiveTime) -> u32 {
    let a = minutes_of_day(a);
    let b = minutes_of_day(b);
    let forward = a.abs_diff(b);
    forward.min(MINUTES_PER_DAY - forward)
}

fn minutes_of_day(time: NaiveTime) -> u32 {
    use chrono::Timelike;
    time.hour() * 60 + time.minute()
}

/// Linear decay from 100 down to a floor of zero across the configured window.
pub(crate) fn time_score(a: NaiveTime, b: NaiveTime, decay_minutes: u32) -> u8 {
    let gap = circular_minute_gap(a, b);
    if decay_minutes == 0 || gap >= decay_minutes {
        return 0;
    }
    let remaining = (decay_minutes - gap) * 100 / decay_minutes;
    remaining as u8
}

pub(crate) fn equality_score(equal: bool, mismatch_score: u8) -> u8 {
    if equal {
        100
    } else {
        mismatch_score
    }
}

/// Intersection-size bonus for multi-valued fields, capped at 100.
pub(crate) fn interest_overlap_score(
    a: &std::collections::BTreeSet<String>,
    b: &std::collections::BTreeSet<String>,
    base: u8,
    per_shared: u8,
) -> u8 {
    let shared = a.intersection(b).count() as u32;
    let score = base as u32 + shared * per_shared as u32;
    score.min(100) as u8
}

fn diet_score(a: DietStyle, b: DietStyle, config: &ScoringConfig) -> u8 {
    match (a, b) {
        _ if a == b => 100,
        (DietStyle::NoPreference, _) | (_, DietStyle::NoPreference) => 85,
        _ => config.categorical_mismatch_score,
    }
}

fn study_location_score(a: StudyLocation, b: StudyLocation, config: &ScoringConfig) -> u8 {
    match (a, b) {
        _ if a == b => 100,
        (StudyLocation::Flexible, _) | (_, StudyLocation::Flexible) => 80,
        _ => config.categorical_mismatch_score,
    }
}

/// Study-hour answers sit on an open numeric scale, so the gap decays in
/// fifteen-point steps rather than through the ordinal table.
fn study_hours_score(a: Option<u8>, b: Option<u8>) -> u8 {
    match (a, b) {
        (Some(a), Some(b)) => {
            let gap = a.abs_diff(b) as u32;
            100u32.saturating_sub(gap * 15).max(10) as u8
        }
        _ => NEUTRAL_SCORE,
    }
}

fn conflict_style_score(a: ConflictStyle, b: ConflictStyle, config: &ScoringConfig) -> u8 {
    match (a, b) {
        _ if a == b => 100,
        (ConflictStyle::Direct, ConflictStyle::Avoidant)
        | (ConflictStyle::Avoidant, ConflictStyle::Direct) => config.categorical_mismatch_score,
        _ => 75,
    }
}

fn category_from_fields(category: Category, fields: Vec<FieldContribution>) -> CategoryScore {
    let total: u32 = fields.iter().map(|field| field.score as u32).sum();
    let score = if fields.is_empty() {
        NEUTRAL_SCORE
    } else {
        (total / fields.len() as u32) as u8
    };
    CategoryScore {
        category,
        score,
        contributions: fields,
    }
}

fn contribution(field: &'static str, score: u8, note: String) -> FieldContribution {
    FieldContribution { field, score, note }
}

pub(crate) fn score_lifestyle(a: &Profile, b: &Profile, config: &ScoringConfig) -> CategoryScore {
    let smoking = smoking_score(a, b);
    let diet = diet_score(a.lifestyle.diet, b.lifestyle.diet, config);
    let cooking = equality_score(
        a.lifestyle.cooks_in_room == b.lifestyle.cooks_in_room,
        config.boolean_mismatch_score,
    );
    let pets = equality_score(
        a.lifestyle.has_pet == b.lifestyle.has_pet,
        config.boolean_mismatch_score,
    );

    category_from_fields(
        Category::Lifestyle,
        vec![
            contribution(
                "smoking",
                smoking,
                format!(
                    "habits {:?}/{:?} against tolerances {:?}/{:?}",
                    a.lifestyle.smoking,
                    b.lifestyle.smoking,
                    a.lifestyle.smoking_tolerance,
                    b.lifestyle.smoking_tolerance
                ),
            ),
            contribution(
                "diet",
                diet,
                format!("{:?} with {:?}", a.lifestyle.diet, b.lifestyle.diet),
            ),
            contribution(
                "cooking",
                cooking,
                format!(
                    "cooks in room: {} / {}",
                    a.lifestyle.cooks_in_room, b.lifestyle.cooks_in_room
                ),
            ),
            contribution(
                "pets",
                pets,
                format!("has pet: {} / {}", a.lifestyle.has_pet, b.lifestyle.has_pet),
            ),
        ],
    )
}

pub(crate) fn score_study(a: &Profile, b: &Profile, config: &ScoringConfig) -> CategoryScore {
    let hours = study_hours_score(a.study.daily_study_hours, b.study.daily_study_hours);
    let location = study_location_score(a.study.study_location, b.study.study_location, config);
    let quiet = equality_score(
        a.study.needs_quiet == b.study.needs_quiet,
        config.boolean_mismatch_score,
    );

    let hours_note = match (a.study.daily_study_hours, b.study.daily_study_hours) {
        (Some(a_hours), Some(b_hours)) => format!("{a_hours}h against {b_hours}h daily"),
        _ => "missing answer scored neutral".to_string(),
    };

    category_from_fields(
        Category::Study,
        vec![
            contribution("daily_study_hours", hours, hours_note),
            contribution(
                "study_location",
                location,
                format!("{:?} with {:?}", a.study.study_location, b.study.study_location),
            ),
            contribution(
                "needs_quiet",
                quiet,
                format!("{} / {}", a.study.needs_quiet, b.study.needs_quiet),
            ),
        ],
    )
}

pub(crate) fn score_cleanliness(a: &Profile, b: &Profile, config: &ScoringConfig) -> CategoryScore {
    let tidiness = ordinal_score(
        a.cleanliness.tidiness,
        b.cleanliness.tidiness,
        &config.ordinal_penalty,
    );
    let frequency = ordinal_score(
        a.cleanliness.cleaning_frequency,
        b.cleanliness.cleaning_frequency,
        &config.ordinal_penalty,
    );
    let chores = equality_score(
        a.cleanliness.shares_chores == b.cleanliness.shares_chores,
        config.boolean_mismatch_score,
    );

    category_from_fields(
        Category::Cleanliness,
        vec![
            contribution(
                "tidiness",
                tidiness,
                format!(
                    "levels {} and {}",
                    a.cleanliness.tidiness.value(),
                    b.cleanliness.tidiness.value()
                ),
            ),
            contribution(
                "cleaning_frequency",
                frequency,
                format!(
                    "levels {} and {}",
                    a.cleanliness.cleaning_frequency.value(),
                    b.cleanliness.cleaning_frequency.value()
                ),
            ),
            contribution(
                "shares_chores",
                chores,
                format!(
                    "{} / {}",
                    a.cleanliness.shares_chores, b.cleanliness.shares_chores
                ),
            ),
        ],
    )
}

pub(crate) fn score_social(a: &Profile, b: &Profile, config: &ScoringConfig) -> CategoryScore {
    let sociability = ordinal_score(
        a.social.sociability,
        b.social.sociability,
        &config.ordinal_penalty,
    );
    let guests = ordinal_score(
        a.social.guest_frequency,
        b.social.guest_frequency,
        &config.ordinal_penalty,
    );
    let interests = interest_overlap_score(
        &a.social.shared_interests,
        &b.social.shared_interests,
        config.interest_base,
        config.interest_per_shared,
    );
    let shared = a
        .social
        .shared_interests
        .intersection(&b.social.shared_interests)
        .count();

    category_from_fields(
        Category::Social,
        vec![
            contribution(
                "sociability",
                sociability,
                format!(
                    "levels {} and {}",
                    a.social.sociability.value(),
                    b.social.sociability.value()
                ),
            ),
            contribution(
                "guest_frequency",
                guests,
                format!(
                    "levels {} and {}",
                    a.social.guest_frequency.value(),
                    b.social.guest_frequency.value()
                ),
            ),
            contribution(
                "shared_interests",
                interests,
                format!("{shared} shared interest(s)"),
            ),
        ],
    )
}

pub(crate) fn score_sleep(a: &Profile, b: &Profile, config: &ScoringConfig) -> CategoryScore {
    let bedtime = time_score(a.sleep.bedtime, b.sleep.bedtime, config.time_decay_minutes);
    let wake = time_score(
        a.sleep.wake_time,
        b.sleep.wake_time,
        config.time_decay_minutes,
    );
    let light = equality_score(
        a.sleep.light_sleeper == b.sleep.light_sleeper,
        config.boolean_mismatch_score,
    );

    category_from_fields(
        Category::Sleep,
        vec![
            contribution(
                "bedtime",
                bedtime,
                format!(
                    "{} against {} ({} minute gap)",
                    a.sleep.bedtime,
                    b.sleep.bedtime,
                    circular_minute_gap(a.sleep.bedtime, b.sleep.bedtime)
                ),
            ),
            contribution(
                "wake_time",
                wake,
                format!("{} against {}", a.sleep.wake_time, b.sleep.wake_time),
            ),
            contribution(
                "light_sleeper",
                light,
                format!("{} / {}", a.sleep.light_sleeper, b.sleep.light_sleeper),
            ),
        ],
    )
}

pub(crate) fn score_personality(a: &Profile, b: &Profile, config: &ScoringConfig) -> CategoryScore {
    let introversion = ordinal_score(
        a.personality.introversion,
        b.personality.introversion,
        &config.ordinal_penalty,
    );
    let openness = optional_ordinal_score(
        a.personality.openness,
        b.personality.openness,
        &config.ordinal_penalty,
    );
    let conflict = conflict_style_score(
        a.personality.conflict_style,
        b.personality.conflict_style,
        config,
    );

    let openness_note = match (a.personality.openness, b.personality.openness) {
        (Some(a_level), Some(b_level)) => {
            format!("levels {} and {}", a_level.value(), b_level.value())
        }
        _ => "missing answer scored neutral".to_string(),
    };

    category_from_fields(
        Category::Personality,
        vec![
            contribution(
                "introversion",
                introversion,
                format!(
                    "levels {} and {}",
                    a.personality.introversion.value(),
                    b.personality.introversion.value()
                ),
            ),
            contribution("openness", openness, openness_note),
            contribution(
                "conflict_style",
                conflict,
                format!(
                    "{:?} with {:?}",
                    a.personality.conflict_style, b.personality.conflict_style
                ),
            ),
        ],
    )
}
