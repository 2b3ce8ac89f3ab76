use super::common::*;
use crate::matching::domain::{DealBreakerTag, SmokingHabit, ToleranceLevel};

#[test]
fn smoking_tag_excludes_high_tolerance_partner() {
    let filter = filter();
    let mut a = profile("p3");
    a.deal_breakers.insert(DealBreakerTag::Smoking);
    let mut b = profile("p4");
    b.lifestyle.smoking_tolerance = ToleranceLevel::High;

    let violations = filter.violations(&a, &b);

    assert!(!filter.is_admissible(&a, &b));
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].tag, DealBreakerTag::Smoking);
    assert_eq!(violations[0].declared_by, a.profile_id);
}

#[test]
fn smoking_tag_excludes_regular_smoker_regardless_of_tolerance() {
    let filter = filter();
    let mut a = profile("p1");
    a.deal_breakers.insert(DealBreakerTag::Smoking);
    let mut b = profile("p2");
    b.lifestyle.smoking = SmokingHabit::Regular;
    b.lifestyle.smoking_tolerance = ToleranceLevel::None;

    assert!(!filter.is_admissible(&a, &b));
}

#[test]
fn exclusion_applies_in_both_directions() {
    let filter = filter();
    let mut declares = profile("p1");
    declares.deal_breakers.insert(DealBreakerTag::Messy);
    let mut messy = profile("p2");
    messy.cleanliness.tidiness = level(1);

    // The declaring profile may appear on either side of the check.
    assert!(!filter.is_admissible(&declares, &messy));
    assert!(!filter.is_admissible(&messy, &declares));
}

#[test]
fn tidy_partner_does_not_trip_messy_tag() {
    let filter = filter();
    let mut a = profile("p1");
    a.deal_breakers.insert(DealBreakerTag::Messy);
    let b = profile("p2");

    assert!(filter.is_admissible(&a, &b));
}

#[test]
fn frequent_guest_tag_uses_threshold() {
    let filter = filter();
    let mut a = profile("p1");
    a.deal_breakers.insert(DealBreakerTag::FrequentGuests);

    let mut moderate = profile("p2");
    moderate.social.guest_frequency = level(3);
    assert!(filter.is_admissible(&a, &moderate));

    let mut heavy = profile("p3");
    heavy.social.guest_frequency = level(4);
    assert!(!filter.is_admissible(&a, &heavy));
}

#[test]
fn night_owl_tag_catches_bedtimes_past_midnight() {
    let filter = filter();
    let mut a = profile("p1");
    a.deal_breakers.insert(DealBreakerTag::NightOwl);

    let mut night_owl = profile("p2");
    night_owl.sleep.bedtime = time(2, 0);
    assert!(!filter.is_admissible(&a, &night_owl));

    let mut early = profile("p3");
    early.sleep.bedtime = time(22, 0);
    assert!(filter.is_admissible(&a, &early));
}

#[test]
fn pets_tag_excludes_pet_owners() {
    let filter = filter();
    let mut a = profile("p1");
    a.deal_breakers.insert(DealBreakerTag::Pets);
    let mut b = profile("p2");
    b.lifestyle.has_pet = true;

    let violations = filter.violations(&a, &b);
    assert_eq!(violations.len(), 1);
    assert!(violations[0].detail.contains("pet"));
}

#[test]
fn violations_accumulate_from_both_profiles() {
    let filter = filter();
    let mut a = profile("p1");
    a.deal_breakers.insert(DealBreakerTag::Pets);
    a.lifestyle.smoking_tolerance = ToleranceLevel::High;
    let mut b = profile("p2");
    b.deal_breakers.insert(DealBreakerTag::Smoking);
    b.lifestyle.has_pet = true;

    let violations = filter.violations(&a, &b);

    assert_eq!(violations.len(), 2);
    assert!(violations
        .iter()
        .any(|violation| violation.declared_by == a.profile_id));
    assert!(violations
        .iter()
        .any(|violation| violation.declared_by == b.profile_id));
}
