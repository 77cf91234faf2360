use std::collections::HashMap;

use rayon::prelude::*;
use tracing::info;

use super::codes::CodeSetRegistry;
use super::domain::{ClinicalEvent, MeasurementPeriod, MemberEventIndex, MemberId, MemberRecord};
use super::evaluation::{MeasureEvaluationResult, MeasureEvaluator};
use super::measures::MeasureRegistry;

/// All inputs for one measurement year, pre-loaded in memory. The engine
/// touches no external resource during evaluation.
#[derive(Debug, Clone, Default)]
pub struct PopulationSnapshot {
    pub members: Vec<MemberRecord>,
    pub events: Vec<ClinicalEvent>,
}

/// Evaluate every member against every measure. Members are partitioned
/// across the rayon pool; each worker sees only read-only definitions and
/// its own member's events, and the per-worker result lists are
/// concatenated once all workers finish. Aggregation must not start before
/// this returns.
pub fn evaluate_population(
    registry: &MeasureRegistry,
    codes: &CodeSetRegistry,
    period: MeasurementPeriod,
    snapshot: &PopulationSnapshot,
) -> Vec<MeasureEvaluationResult> {
    // Group events by member once, up front, so no worker rescans the full
    // event table.
    let mut events_by_member: HashMap<&MemberId, Vec<&ClinicalEvent>> = HashMap::new();
    for event in &snapshot.events {
        events_by_member
            .entry(&event.member_id)
            .or_default()
            .push(event);
    }

    let evaluator = MeasureEvaluator::new(period);

    let results: Vec<MeasureEvaluationResult> = snapshot
        .members
        .par_iter()
        .flat_map_iter(|member| {
            let member_events = events_by_member
                .get(&member.member_id)
                .map(Vec::as_slice)
                .unwrap_or(&[]);
            let index = MemberEventIndex::build(codes, member_events.iter().copied());
            registry
                .definitions()
                .iter()
                .map(|definition| evaluator.evaluate(definition, member, &index))
                .collect::<Vec<_>>()
        })
        .collect();

    info!(
        members = snapshot.members.len(),
        measures = registry.len(),
        results = results.len(),
        year = period.year,
        "population evaluation complete"
    );

    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::quality::domain::{EventKind, Sex};
    use chrono::NaiveDate;

    fn snapshot() -> PopulationSnapshot {
        let member = MemberRecord {
            member_id: MemberId("m-1".to_string()),
            birth_date: NaiveDate::from_ymd_opt(1960, 6, 1),
            enrollment_days: 365,
            sex: Sex::Female,
            race_ethnicity: None,
            language: None,
            sdoh_flags: Vec::new(),
        };
        let event = ClinicalEvent {
            member_id: MemberId("m-1".to_string()),
            kind: EventKind::Claim,
            code: "77067".to_string(),
            date: NaiveDate::from_ymd_opt(2025, 4, 10).unwrap(),
            value: None,
            days_supply: None,
        };
        PopulationSnapshot {
            members: vec![member],
            events: vec![event],
        }
    }

    #[test]
    fn produces_one_result_per_member_measure_pair() {
        let registry = MeasureRegistry::standard().expect("catalog loads");
        let codes = CodeSetRegistry::standard();
        let results = evaluate_population(
            &registry,
            &codes,
            MeasurementPeriod::new(2025),
            &snapshot(),
        );
        assert_eq!(results.len(), registry.len());
    }

    #[test]
    fn rerunning_on_unchanged_inputs_is_idempotent() {
        let registry = MeasureRegistry::standard().expect("catalog loads");
        let codes = CodeSetRegistry::standard();
        let period = MeasurementPeriod::new(2025);
        let snapshot = snapshot();

        let mut first = evaluate_population(&registry, &codes, period, &snapshot);
        let mut second = evaluate_population(&registry, &codes, period, &snapshot);
        let key = |result: &MeasureEvaluationResult| {
            (result.member_id.clone(), result.measure_id)
        };
        first.sort_by_key(key);
        second.sort_by_key(key);
        assert_eq!(first, second);
    }
}
