use serde::Serialize;

use super::domain::{DietStyle, Profile, SmokingHabit};
use super::scoring::rules::{circular_minute_gap, smoking_score};
use super::scoring::{CompatibilityReport, ScoringConfig};

/// Human-readable verdict for one pair, for UI consumption. An excluded pair
/// gets an explicit inadmissible result, never a fabricated numeric score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Explanation {
    Inadmissible { violations: Vec<String> },
    Scored {
        overall: u8,
        reasons: Vec<String>,
        warnings: Vec<String>,
    },
}

/// Derives reasons and warnings from a scored pair. Deterministic and
/// side-effect free; reasons are ordered by category weight descending so the
/// most influential categories lead.
#[derive(Debug, Clone)]
pub struct ExplanationGenerator {
    config: ScoringConfig,
}

impl ExplanationGenerator {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    pub fn explain(&self, a: &Profile, b: &Profile, report: &CompatibilityReport) -> Explanation {
        if !report.admissible {
            return Explanation::Inadmissible {
                violations: report.policy_violations.clone(),
            };
        }

        Explanation::Scored {
            overall: report.overall,
            reasons: self.reasons(report),
            warnings: self.warnings(a, b),
        }
    }

    fn reasons(&self, report: &CompatibilityReport) -> Vec<String> {
        let mut strong: Vec<_> = report
            .categories
            .iter()
            .enumerate()
            .filter(|(_, category)| category.score >= self.config.strong_match_threshold)
            .collect();
        // Weight descending; canonical category order breaks ties so output
        // is stable run to run.
        strong.sort_by(|(a_idx, a), (b_idx, b)| {
            let a_weight = self.config.weights.weight(a.category);
            let b_weight = self.config.weights.weight(b.category);
            b_weight
                .partial_cmp(&a_weight)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a_idx.cmp(b_idx))
        });

        strong
            .into_iter()
            .map(|(_, category)| {
                format!(
                    "strong {} alignment ({} / 100)",
                    category.category.label(),
                    category.score
                )
            })
            .collect()
    }

    /// Frictions worth flagging that did not rise to full exclusion.
    fn warnings(&self, a: &Profile, b: &Profile) -> Vec<String> {
        let mut warnings = Vec::new();

        let bedtime_gap = circular_minute_gap(a.sleep.bedtime, b.sleep.bedtime);
        let limit_minutes = self.config.sleep_gap_warning_hours * 60;
        if bedtime_gap > limit_minutes {
            warnings.push(format!(
                "bedtimes differ by {} minutes (over the {} hour comfort window)",
                bedtime_gap, self.config.sleep_gap_warning_hours
            ));
        }

        let smokes = |profile: &Profile| profile.lifestyle.smoking != SmokingHabit::Never;
        if (smokes(a) || smokes(b)) && smoking_score(a, b) < self.config.strong_match_threshold {
            warnings.push("smoking habits sit near one partner's tolerance limit".to_string());
        }

        let diet_conflict = matches!(
            (a.lifestyle.diet, b.lifestyle.diet),
            (DietStyle::Vegetarian, DietStyle::NonVegetarian)
                | (DietStyle::NonVegetarian, DietStyle::Vegetarian)
        );
        if diet_conflict && (a.lifestyle.cooks_in_room || b.lifestyle.cooks_in_room) {
            warnings.push("conflicting food preferences with in-room cooking".to_string());
        }

        let guest_gap = a
            .social
            .guest_frequency
            .distance(b.social.guest_frequency);
        if guest_gap >= self.config.guest_gap_warning {
            warnings.push(format!(
                "guest expectations differ by {guest_gap} levels"
            ));
        }

        warnings
    }
}
