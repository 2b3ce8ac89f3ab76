use serde::{Deserialize, Serialize};

/// The six survey categories, in canonical order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Lifestyle,
    Study,
    Cleanliness,
    Social,
    Sleep,
    Personality,
}

impl Category {
    pub const fn ordered() -> [Self; 6] {
        [
            Self::Lifestyle,
            Self::Study,
            Self::Cleanliness,
            Self::Social,
            Self::Sleep,
            Self::Personality,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Category::Lifestyle => "lifestyle",
            Category::Study => "study habits",
            Category::Cleanliness => "cleanliness",
            Category::Social => "social preferences",
            Category::Sleep => "sleep schedule",
            Category::Personality => "personality",
        }
    }
}

/// Fixed category weights; must sum to 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CategoryWeights {
    pub lifestyle: f32,
    pub study: f32,
    pub cleanliness: f32,
    pub social: f32,
    pub sleep: f32,
    pub personality: f32,
}

impl CategoryWeights {
    pub fn weight(&self, category: Category) -> f32 {
        match category {
            Category::Lifestyle => self.lifestyle,
            Category::Study => self.study,
            Category::Cleanliness => self.cleanliness,
            Category::Social => self.social,
            Category::Sleep => self.sleep,
            Category::Personality => self.personality,
        }
    }

    pub fn total(&self) -> f32 {
        self.lifestyle + self.study + self.cleanliness + self.social + self.sleep + self.personality
    }
}

impl Default for CategoryWeights {
    fn default() -> Self {
        Self {
            lifestyle: 0.20,
            study: 0.20,
            cleanliness: 0.20,
            social: 0.15,
            sleep: 0.15,
            personality: 0.10,
        }
    }
}

/// Rubric configuration backing the pairwise scorer. All distance behavior is
/// table-driven so categories can be retuned without touching matcher or
/// allocator code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    pub weights: CategoryWeights,
    /// Score by ordinal rank distance; distances past the last entry stay
    /// capped at the final value.
    pub ordinal_penalty: [u8; 5],
    /// Linear decay window for time-of-day fields: the minute gap at which a
    /// time subscore reaches its floor of zero.
    pub time_decay_minutes: u32,
    /// Score granted when two boolean habits disagree (agreement scores 100).
    pub boolean_mismatch_score: u8,
    /// Score granted when categorical answers disagree outright.
    pub categorical_mismatch_score: u8,
    /// Base score for the shared-interest overlap field.
    pub interest_base: u8,
    /// Bonus per shared interest, capped at 100 overall.
    pub interest_per_shared: u8,
    /// Category subscore at or above which the explanation generator reports
    /// the category as a match reason.
    pub strong_match_threshold: u8,
    /// Bedtime gap (in hours) beyond which a warning is raised.
    pub sleep_gap_warning_hours: u32,
    /// Guest-frequency rank distance at which a warning is raised.
    pub guest_gap_warning: u8,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            weights: CategoryWeights::default(),
            ordinal_penalty: [100, 80, 55, 30, 10],
            time_decay_minutes: 240,
            boolean_mismatch_score: 40,
            categorical_mismatch_score: 35,
            interest_base: 40,
            interest_per_shared: 20,
            strong_match_threshold: 75,
            sleep_gap_warning_hours: 3,
            guest_gap_warning: 3,
        }
    }
}
