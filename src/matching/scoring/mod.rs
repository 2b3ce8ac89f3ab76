mod config;
pub(crate) mod rules;

pub use config::{Category, CategoryWeights, ScoringConfig};

use serde::Serialize;

use super::domain::Profile;

/// Stateless pairwise scorer applying the rubric configuration. Pure: the
/// same two profiles always produce the same report, in either argument
/// order.
pub struct CompatibilityScorer {
    config: ScoringConfig,
}

impl CompatibilityScorer {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    pub fn score(&self, a: &Profile, b: &Profile) -> CompatibilityReport {
        let categories = vec![
            rules::score_lifestyle(a, b, &self.config),
            rules::score_study(a, b, &self.config),
            rules::score_cleanliness(a, b, &self.config),
            rules::score_social(a, b, &self.config),
            rules::score_sleep(a, b, &self.config),
            rules::score_personality(a, b, &self.config),
        ];

        let weighted: f32 = categories
            .iter()
            .map(|category| {
                self.config.weights.weight(category.category) * category.score as f32
            })
            .sum();
        let overall = weighted.round().clamp(0.0, 100.0) as u8;

        // Policy gate, not a preference: mixed-gender pairs are forced to
        // zero and marked inadmissible, which is distinct from a low score.
        if a.gender != b.gender {
            return CompatibilityReport {
                overall: 0,
                admissible: false,
                policy_violations: vec!["same_gender_pairing_policy".to_string()],
                categories,
            };
        }

        CompatibilityReport {
            overall,
            admissible: true,
            policy_violations: Vec::new(),
            categories,
        }
    }
}

/// Discrete per-field contribution retained for transparent explanations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldContribution {
    pub field: &'static str,
    pub score: u8,
    pub note: String,
}

/// One category subscore with its raw field contributions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryScore {
    pub category: Category,
    pub score: u8,
    pub contributions: Vec<FieldContribution>,
}

/// Full scoring output for one profile pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompatibilityReport {
    pub overall: u8,
    pub admissible: bool,
    pub policy_violations: Vec<String>,
    pub categories: Vec<CategoryScore>,
}

impl CompatibilityReport {
    pub fn category_score(&self, category: Category) -> Option<u8> {
        self.categories
            .iter()
            .find(|entry| entry.category == category)
            .map(|entry| entry.score)
    }
}
