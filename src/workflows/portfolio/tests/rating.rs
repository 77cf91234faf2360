use super::common::*;
use crate::workflows::portfolio::rating::{
    bonus_rate, measure_stars, ClosureStrategy, StarRatingSimulator,
};
use crate::workflows::quality::measures::MeasureId;

fn simulator() -> StarRatingSimulator {
    StarRatingSimulator::new(50_000_000.0)
}

#[test]
fn star_table_steps_are_monotonic_and_inclusive() {
    assert_eq!(measure_stars(100.0), 5.0);
    assert_eq!(measure_stars(95.0), 5.0);
    assert_eq!(measure_stars(94.9), 4.5);
    assert_eq!(measure_stars(90.0), 4.5);
    assert_eq!(measure_stars(85.0), 4.0);
    assert_eq!(measure_stars(80.0), 3.5);
    assert_eq!(measure_stars(70.0), 3.0);
    assert_eq!(measure_stars(60.0), 2.5);
    assert_eq!(measure_stars(50.0), 2.0);
    assert_eq!(measure_stars(49.9), 1.0);
    assert_eq!(measure_stars(0.0), 1.0);
}

#[test]
fn bonus_table_rewards_high_bands_and_charges_low_ones() {
    assert_eq!(bonus_rate(5.0), 0.05);
    assert_eq!(bonus_rate(4.5), 0.045);
    assert_eq!(bonus_rate(4.0), 0.04);
    assert_eq!(bonus_rate(3.5), 0.03);
    assert_eq!(bonus_rate(3.0), 0.015);
    assert!(bonus_rate(2.5) < 0.0);
    assert!(bonus_rate(1.0) < 0.0);
}

#[test]
fn overall_rating_weights_triple_measures() {
    let simulator = simulator();
    let registry = registry();
    // One standard measure at five stars, one triple-weighted at three.
    let summaries = vec![
        summary(MeasureId::Bcs, 100, 96),
        summary(MeasureId::Cbp, 100, 70),
    ];

    let rating = simulator.rate(&summaries, &registry);
    assert_eq!(rating.measure_stars.len(), 2);
    // (5.0 x 1 + 3.0 x 3) / 4
    assert!((rating.overall_stars - 3.5).abs() < 1e-9);
    assert!((rating.bonus_rate - 0.03).abs() < f64::EPSILON);
    assert!((rating.bonus_payment - 1_500_000.0).abs() < 1e-6);
}

#[test]
fn empty_eligible_measures_carry_no_weight() {
    let simulator = simulator();
    let registry = registry();
    let summaries = vec![
        summary(MeasureId::Bcs, 100, 96),
        summary(MeasureId::Omw, 0, 0),
    ];

    let rating = simulator.rate(&summaries, &registry);
    assert_eq!(rating.measure_stars.len(), 1);
    assert_eq!(rating.overall_stars, 5.0);
}

#[test]
fn raising_one_rate_never_lowers_the_rating() {
    let simulator = simulator();
    let registry = registry();
    let low = vec![
        summary(MeasureId::Bcs, 100, 70),
        summary(MeasureId::Cbp, 100, 70),
    ];
    let high = vec![
        summary(MeasureId::Bcs, 100, 96),
        summary(MeasureId::Cbp, 100, 70),
    ];

    let before = simulator.rate(&low, &registry).overall_stars;
    let after = simulator.rate(&high, &registry).overall_stars;
    assert!(after >= before);
}

#[test]
fn full_uniform_closure_reaches_full_compliance() {
    let simulator = simulator();
    let registry = registry();
    let summaries = vec![summary(MeasureId::Cbp, 100, 60)];
    let profiles = vec![profile("m", &[MeasureId::Cbp])];

    let scenario = simulator.simulate(
        &summaries,
        &registry,
        &profiles,
        ClosureStrategy::Uniform,
        1.0,
    );

    // 60% compliance plus the full 40-point gap rate.
    assert!((scenario.rating.measure_stars[0].compliance_rate - 100.0).abs() < 1e-9);
    assert!(scenario.star_delta > 0.0);
    assert!(scenario.bonus_delta > 0.0);
}

#[test]
fn zero_closure_is_the_baseline() {
    let simulator = simulator();
    let registry = registry();
    let summaries = vec![summary(MeasureId::Cbp, 100, 60)];
    let profiles = vec![profile("m", &[MeasureId::Cbp])];

    let scenario = simulator.simulate(
        &summaries,
        &registry,
        &profiles,
        ClosureStrategy::Uniform,
        0.0,
    );
    assert_eq!(scenario.star_delta, 0.0);
    assert_eq!(scenario.bonus_delta, 0.0);
}

#[test]
fn triple_focus_leaves_standard_measures_untouched() {
    let simulator = simulator();
    let registry = registry();
    // Only a standard measure has open gaps.
    let summaries = vec![
        summary(MeasureId::Bcs, 100, 60),
        summary(MeasureId::Cbp, 100, 96),
    ];
    let profiles = vec![profile("m", &[MeasureId::Bcs])];

    let scenario = simulator.simulate(
        &summaries,
        &registry,
        &profiles,
        ClosureStrategy::TripleWeightedFocus,
        1.0,
    );
    assert_eq!(scenario.star_delta, 0.0);

    let balanced = simulator.simulate(
        &summaries,
        &registry,
        &profiles,
        ClosureStrategy::Balanced,
        1.0,
    );
    // Balanced still applies half the closure to standard measures.
    assert!(balanced.rating.measure_stars[0].compliance_rate > 60.0);
}

#[test]
fn multi_gap_focus_scales_with_the_multi_gap_share() {
    let simulator = simulator();
    let registry = registry();
    let summaries = vec![summary(MeasureId::Cbp, 100, 60)];

    // Every gap belongs to a single-gap member: nothing to focus on.
    let lone_gaps = vec![profile("m-1", &[MeasureId::Cbp])];
    let scenario = simulator.simulate(
        &summaries,
        &registry,
        &lone_gaps,
        ClosureStrategy::MultiGapFocus,
        1.0,
    );
    assert_eq!(scenario.star_delta, 0.0);

    // Every gap belongs to a multi-gap member: equivalent to uniform.
    let multi_gaps = vec![profile("m-1", &[MeasureId::Cbp, MeasureId::Hbd, MeasureId::Bcs])];
    let focused = simulator.simulate(
        &summaries,
        &registry,
        &multi_gaps,
        ClosureStrategy::MultiGapFocus,
        1.0,
    );
    let uniform = simulator.simulate(
        &summaries,
        &registry,
        &multi_gaps,
        ClosureStrategy::Uniform,
        1.0,
    );
    assert_eq!(
        focused.rating.overall_stars,
        uniform.rating.overall_stars
    );
}

#[test]
fn standard_scenario_grid_covers_every_strategy() {
    let simulator = simulator();
    let registry = registry();
    let summaries = vec![summary(MeasureId::Cbp, 100, 60)];
    let profiles = vec![profile("m", &[MeasureId::Cbp])];

    let scenarios = simulator.standard_scenarios(&summaries, &registry, &profiles);
    assert_eq!(scenarios.len(), 8);
    assert!(scenarios
        .iter()
        .any(|scenario| scenario.strategy == ClosureStrategy::NewMeasureFocus));
    // Deeper uniform closure never rates worse than shallower closure.
    assert!(scenarios[3].rating.overall_stars >= scenarios[0].rating.overall_stars);
}
