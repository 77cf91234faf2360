use super::common::*;
use crate::workflows::portfolio::optimizer::{CrossMeasureOptimizer, BUNDLE_DISCOUNT};
use crate::workflows::quality::domain::MemberId;
use crate::workflows::quality::measures::{BundleGroup, MeasureId};

fn standard_summaries() -> Vec<crate::workflows::quality::aggregate::MeasureSummary> {
    registry()
        .definitions()
        .iter()
        .map(|definition| summary(definition.id, 100, 80))
        .collect()
}

#[test]
fn triple_weighted_gaps_outscore_a_single_standard_gap() {
    let registry = registry();
    let summaries = standard_summaries();
    let profiles = vec![
        profile("triple-gaps", &[MeasureId::Cbp, MeasureId::Hbd, MeasureId::Ked]),
        profile("one-gap", &[MeasureId::Flu]),
    ];

    let entries = CrossMeasureOptimizer::score(&profiles, &registry, &summaries);
    let triple = entries
        .iter()
        .find(|entry| entry.member_id == MemberId("triple-gaps".to_string()))
        .expect("scored");
    let single = entries
        .iter()
        .find(|entry| entry.member_id == MemberId("one-gap".to_string()))
        .expect("scored");

    // Three triple-weighted gaps, the multi-gap bonus, and the linear term:
    // 3 x 3.0 + 2.0 (KED is also a new measure) + 1.5 + 3 x 0.5.
    assert!((triple.raw_score - 14.0).abs() < f64::EPSILON);
    assert!((single.raw_score - 0.5).abs() < f64::EPSILON);
    assert!((triple.priority_score - 100.0).abs() < f64::EPSILON);
    assert!(triple.priority_score > single.priority_score);
}

#[test]
fn shared_lab_draw_discounts_the_cost() {
    let registry = registry();
    let summaries = standard_summaries();
    // HBD and KED both close on a lab draw.
    let profiles = vec![profile("m", &[MeasureId::Hbd, MeasureId::Ked])];

    let entries = CrossMeasureOptimizer::score(&profiles, &registry, &summaries);
    let entry = &entries[0];
    assert_eq!(entry.bundles, vec![BundleGroup::LabDraw]);

    let undiscounted: f64 = [MeasureId::Hbd, MeasureId::Ked]
        .iter()
        .map(|id| registry.get(*id).expect("in catalog").intervention_cost)
        .sum();
    assert!((entry.total_cost - (undiscounted - BUNDLE_DISCOUNT)).abs() < f64::EPSILON);
    assert_eq!(entry.recommended_actions.len(), 2);
}

#[test]
fn a_single_bundled_measure_earns_no_discount() {
    let registry = registry();
    let summaries = standard_summaries();
    let profiles = vec![profile("m", &[MeasureId::Hbd])];

    let entries = CrossMeasureOptimizer::score(&profiles, &registry, &summaries);
    assert!(entries[0].bundles.is_empty());
    assert!(
        (entries[0].total_cost
            - registry.get(MeasureId::Hbd).expect("in catalog").intervention_cost)
            .abs()
            < f64::EPSILON
    );
}

#[test]
fn gap_free_population_scores_zero_everywhere() {
    let registry = registry();
    let summaries = standard_summaries();
    let profiles = vec![profile("m-1", &[]), profile("m-2", &[])];

    let entries = CrossMeasureOptimizer::score(&profiles, &registry, &summaries);
    for entry in &entries {
        assert_eq!(entry.priority_score, 0.0);
        assert_eq!(entry.total_cost, 0.0);
        assert_eq!(entry.expected_roi, 0.0);
    }
}

#[test]
fn expected_value_splits_over_the_eligible_population() {
    let registry = registry();
    let summaries = vec![summary(MeasureId::Flu, 200, 100)];
    let profiles = vec![profile("m", &[MeasureId::Flu])];

    let entries = CrossMeasureOptimizer::score(&profiles, &registry, &summaries);
    let flu = registry.get(MeasureId::Flu).expect("in catalog");
    let expected_min = flu.value_range.min / 200.0 * flu.closure_probability;
    assert!((entries[0].expected_value_min - expected_min).abs() < 1e-9);
    assert!(entries[0].expected_roi > 0.0);
}

#[test]
fn ranking_sorts_by_roi_then_priority() {
    let registry = registry();
    let summaries = standard_summaries();
    // FLU has the cheapest intervention in the catalog, so its lone gap
    // carries a better ROI than the expensive multi-gap member.
    let profiles = vec![
        profile("expensive", &[MeasureId::Omw, MeasureId::Bcs]),
        profile("cheap", &[MeasureId::Flu]),
    ];

    let entries = CrossMeasureOptimizer::score(&profiles, &registry, &summaries);
    assert!(entries[0].expected_roi >= entries[1].expected_roi);
}

#[test]
fn budget_walk_stops_at_the_first_overrun() {
    let registry = registry();
    let summaries = standard_summaries();
    let profiles = vec![
        profile("a", &[MeasureId::Flu]),
        profile("b", &[MeasureId::Flu]),
        profile("c", &[MeasureId::Flu]),
    ];
    let entries = CrossMeasureOptimizer::score(&profiles, &registry, &summaries);
    let per_member = entries[0].total_cost;

    // Room for exactly two members.
    let plan = CrossMeasureOptimizer::budget_plan(&entries, per_member * 2.0 + 1.0);
    assert_eq!(plan.admitted.len(), 2);
    assert!((plan.total_cost - per_member * 2.0).abs() < f64::EPSILON);

    let everything = CrossMeasureOptimizer::budget_plan(&entries, per_member * 10.0);
    assert_eq!(everything.admitted.len(), 3);

    let nothing = CrossMeasureOptimizer::budget_plan(&entries, 0.0);
    assert!(nothing.admitted.is_empty());
    assert_eq!(nothing.total_cost, 0.0);
}
