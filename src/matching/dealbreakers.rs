use chrono::NaiveTime;
use serde::Serialize;

use super::domain::{DealBreakerTag, Profile, SmokingHabit, ToleranceLevel};

/// Thresholds backing deal-breaker exclusion. Each declared tag maps to the
/// trait in the candidate partner that triggers it.
#[derive(Debug, Clone, PartialEq)]
pub struct DealBreakerPolicy {
    /// `Smoking` triggers when the partner's tolerance is at or above this,
    /// or when the partner smokes regularly.
    pub smoking_tolerance_trigger: ToleranceLevel,
    /// `Messy` triggers when the partner's tidiness is at or below this.
    pub messy_tidiness_trigger: u8,
    /// `FrequentGuests` triggers when the partner's guest frequency is at or
    /// above this.
    pub guest_frequency_trigger: u8,
    /// `NightOwl` triggers when the partner's bedtime falls inside the late
    /// window starting at this cutoff (wrapping past midnight until 06:00).
    pub night_owl_cutoff: NaiveTime,
}

impl Default for DealBreakerPolicy {
    fn default() -> Self {
        Self {
            smoking_tolerance_trigger: ToleranceLevel::High,
            messy_tidiness_trigger: 2,
            guest_frequency_trigger: 4,
            night_owl_cutoff: NaiveTime::from_hms_opt(0, 30, 0)
                .unwrap_or(NaiveTime::MIN),
        }
    }
}

/// A tag one profile declared together with the partner trait that tripped it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DealBreakerViolation {
    pub declared_by: super::domain::ProfileId,
    pub tag: DealBreakerTag,
    pub detail: String,
}

/// Pure predicate deciding whether a pair is categorically inadmissible.
/// Checked in both directions; any hit excludes the pair from the graph
/// entirely rather than producing a low-score edge.
#[derive(Debug, Clone, Default)]
pub struct DealBreakerFilter {
    policy: DealBreakerPolicy,
}

impl DealBreakerFilter {
    pub fn new(policy: DealBreakerPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &DealBreakerPolicy {
        &self.policy
    }

    /// Collect every violated constraint for the pair, in both directions.
    /// An empty result means the pair is admissible.
    pub fn violations(&self, a: &Profile, b: &Profile) -> Vec<DealBreakerViolation> {
        let mut violations = self.directional(a, b);
        violations.extend(self.directional(b, a));
        violations
    }

    pub fn is_admissible(&self, a: &Profile, b: &Profile) -> bool {
        self.violations(a, b).is_empty()
    }

    /// Evaluate `declarer`'s tags against `candidate`'s traits.
    fn directional(&self, declarer: &Profile, candidate: &Profile) -> Vec<DealBreakerViolation> {
        let mut violations = Vec::new();

        for tag in &declarer.deal_breakers {
            let detail = match tag {
                DealBreakerTag::Smoking => self.smoking_detail(candidate),
                DealBreakerTag::Messy => self.messy_detail(candidate),
                DealBreakerTag::FrequentGuests => self.guests_detail(candidate),
                DealBreakerTag::NightOwl => self.night_owl_detail(candidate),
                DealBreakerTag::Pets => candidate
                    .lifestyle
                    .has_pet
                    .then(|| "partner keeps a pet".to_string()),
            };

            if let Some(detail) = detail {
                violations.push(DealBreakerViolation {
                    declared_by: declarer.profile_id.clone(),
                    tag: *tag,
                    detail,
                });
            }
        }

        violations
    }

    fn smoking_detail(&self, candidate: &Profile) -> Option<String> {
        if candidate.lifestyle.smoking == SmokingHabit::Regular {
            return Some("partner smokes regularly".to_string());
        }
        if candidate.lifestyle.smoking_tolerance >= self.policy.smoking_tolerance_trigger {
            return Some(format!(
                "partner smoking tolerance {:?} at or above {:?}",
                candidate.lifestyle.smoking_tolerance, self.policy.smoking_tolerance_trigger
            ));
        }
        None
    }

    fn messy_detail(&self, candidate: &Profile) -> Option<String> {
        let tidiness = candidate.cleanliness.tidiness.value();
        (tidiness <= self.policy.messy_tidiness_trigger).then(|| {
            format!(
                "partner tidiness {} at or below {}",
                tidiness, self.policy.messy_tidiness_trigger
            )
        })
    }

    fn guests_detail(&self, candidate: &Profile) -> Option<String> {
        let frequency = candidate.social.guest_frequency.value();
        (frequency >= self.policy.guest_frequency_trigger).then(|| {
            format!(
                "partner guest frequency {} at or above {}",
                frequency, self.policy.guest_frequency_trigger
            )
        })
    }

    fn night_owl_detail(&self, candidate: &Profile) -> Option<String> {
        let bedtime = candidate.sleep.bedtime;
        let morning_end = NaiveTime::from_hms_opt(6, 0, 0).unwrap_or(NaiveTime::MIN);
        let late = if self.policy.night_owl_cutoff < morning_end {
            // Cutoff past midnight: the late window wraps the clock face.
            bedtime >= self.policy.night_owl_cutoff && bedtime < morning_end
        } else {
            bedtime >= self.policy.night_owl_cutoff || bedtime < morning_end
        };
        late.then(|| format!("partner bedtime {bedtime} falls in the late-night window"))
    }
}
