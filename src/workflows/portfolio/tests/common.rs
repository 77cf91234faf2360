use crate::workflows::quality::aggregate::{GapProfile, MeasureSummary};
use crate::workflows::quality::domain::{MemberId, MemberRecord, Sex};
use crate::workflows::quality::evaluation::MeasureEvaluationResult;
use crate::workflows::quality::measures::{MeasureId, MeasureRegistry, MeasureWeight};

pub(super) fn registry() -> MeasureRegistry {
    MeasureRegistry::standard().expect("standard catalog loads")
}

/// A population summary with no exclusions and the given headline counts.
pub(super) fn summary(measure_id: MeasureId, eligible: usize, numerator: usize) -> MeasureSummary {
    let compliance_rate = if eligible == 0 {
        0.0
    } else {
        numerator as f64 / eligible as f64 * 100.0
    };
    MeasureSummary {
        measure_id,
        denominator: eligible,
        excluded: 0,
        numerator,
        gaps: eligible.saturating_sub(numerator),
        eligible,
        compliance_rate,
    }
}

pub(super) fn profile(member: &str, gaps: &[MeasureId]) -> GapProfile {
    let registry = registry();
    let mut gap_measures = gaps.to_vec();
    gap_measures.sort();
    let triple_weighted_gaps = gap_measures
        .iter()
        .filter(|id| {
            registry
                .get(**id)
                .map(|definition| definition.weight == MeasureWeight::Triple)
                .unwrap_or(false)
        })
        .count();
    let total_gaps = gap_measures.len();

    GapProfile {
        member_id: MemberId(member.to_string()),
        total_denominators: total_gaps,
        total_numerators: 0,
        total_gaps,
        gap_measures,
        triple_weighted_gaps,
        has_multiple_gaps: total_gaps >= 2,
        has_3plus_gaps: total_gaps >= 3,
    }
}

pub(super) fn eligible_result(
    member: &str,
    measure_id: MeasureId,
    in_numerator: bool,
) -> MeasureEvaluationResult {
    MeasureEvaluationResult {
        member_id: MemberId(member.to_string()),
        measure_id,
        in_denominator: true,
        excluded: false,
        exclusion_reason: None,
        ineligibility_reason: None,
        in_numerator,
        numerator_reason: String::new(),
        has_gap: !in_numerator,
    }
}

pub(super) fn member_in_group(id: &str, race: &str) -> MemberRecord {
    MemberRecord {
        member_id: MemberId(id.to_string()),
        birth_date: None,
        enrollment_days: 365,
        sex: Sex::Female,
        race_ethnicity: Some(race.to_string()),
        language: None,
        sdoh_flags: Vec::new(),
    }
}

/// `count` members in one demographic group, the first `compliant` of them
/// in the numerator, with matching evaluation results for the measure.
pub(super) fn cohort(
    measure_id: MeasureId,
    race: &str,
    count: usize,
    compliant: usize,
) -> (Vec<MemberRecord>, Vec<MeasureEvaluationResult>) {
    let mut members = Vec::new();
    let mut results = Vec::new();
    for n in 0..count {
        let id = format!("{race}-{n}");
        members.push(member_in_group(&id, race));
        results.push(eligible_result(&id, measure_id, n < compliant));
    }
    (members, results)
}
