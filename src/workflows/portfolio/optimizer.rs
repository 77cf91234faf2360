use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::workflows::quality::aggregate::{GapProfile, MeasureSummary};
use crate::workflows::quality::domain::MemberId;
use crate::workflows::quality::measures::{
    BundleGroup, MeasureId, MeasureRegistry, MeasureWeight,
};

/// Fixed dollar discount applied to a member's intervention cost for each
/// bundle group shared by two or more of their gapped measures.
pub const BUNDLE_DISCOUNT: f64 = 20.0;

/// One member's slot in the ranked intervention list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriorityEntry {
    pub member_id: MemberId,
    /// Normalized to 0-100 across the scored population.
    pub priority_score: f64,
    pub raw_score: f64,
    pub gap_measures: Vec<MeasureId>,
    pub total_cost: f64,
    pub expected_value_min: f64,
    pub expected_value_max: f64,
    pub expected_roi: f64,
    pub recommended_actions: Vec<String>,
    pub bundles: Vec<BundleGroup>,
}

/// Result of walking the ranked list under a spending ceiling. Greedy by
/// ROI, stopping at the first member that would overrun the budget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetPlan {
    pub budget: f64,
    pub admitted: Vec<MemberId>,
    pub total_cost: f64,
    pub expected_value_min: f64,
    pub expected_value_max: f64,
}

/// Scores gap profiles into a ranked, cost/value-annotated intervention
/// list. Pure over its inputs; rerunning on the same profiles reproduces
/// the same ordering.
pub struct CrossMeasureOptimizer;

impl CrossMeasureOptimizer {
    pub fn score(
        profiles: &[GapProfile],
        registry: &MeasureRegistry,
        summaries: &[MeasureSummary],
    ) -> Vec<PriorityEntry> {
        let eligible_by_measure: BTreeMap<MeasureId, usize> = summaries
            .iter()
            .map(|summary| (summary.measure_id, summary.eligible))
            .collect();

        let mut entries: Vec<PriorityEntry> = profiles
            .iter()
            .map(|profile| Self::score_member(profile, registry, &eligible_by_measure))
            .collect();

        let max_raw = entries
            .iter()
            .map(|entry| entry.raw_score)
            .fold(0.0_f64, f64::max);
        for entry in &mut entries {
            entry.priority_score = if max_raw == 0.0 {
                0.0
            } else {
                entry.raw_score / max_raw * 100.0
            };
        }

        entries.sort_by(|a, b| {
            b.expected_roi
                .total_cmp(&a.expected_roi)
                .then(b.priority_score.total_cmp(&a.priority_score))
        });
        entries
    }

    fn score_member(
        profile: &GapProfile,
        registry: &MeasureRegistry,
        eligible_by_measure: &BTreeMap<MeasureId, usize>,
    ) -> PriorityEntry {
        let mut raw_score = 0.0;
        let mut total_cost = 0.0;
        let mut expected_value_min = 0.0;
        let mut expected_value_max = 0.0;
        let mut recommended_actions = Vec::new();
        let mut bundle_counts: BTreeMap<BundleGroup, usize> = BTreeMap::new();

        for measure_id in &profile.gap_measures {
            let Some(definition) = registry.get(*measure_id) else {
                continue;
            };

            // Weight buckets are additive: one gapped measure can land in
            // both the triple-weighted and the new-measure bucket.
            if definition.weight == MeasureWeight::Triple {
                raw_score += 3.0;
            }
            if definition.new_measure {
                raw_score += 2.0;
            }

            total_cost += definition.intervention_cost;
            recommended_actions.push(definition.recommended_action.to_string());
            if let Some(bundle) = definition.bundle {
                *bundle_counts.entry(bundle).or_default() += 1;
            }

            let eligible = eligible_by_measure
                .get(measure_id)
                .copied()
                .unwrap_or_default();
            if eligible > 0 {
                let per_member = definition.closure_probability / eligible as f64;
                expected_value_min += definition.value_range.min * per_member;
                expected_value_max += definition.value_range.max * per_member;
            }
        }

        if profile.has_multiple_gaps {
            raw_score += 1.5;
        }
        raw_score += 0.5 * profile.total_gaps as f64;

        // A bundle only exists when at least two gapped measures share the
        // same clinical resource.
        let bundles: Vec<BundleGroup> = bundle_counts
            .into_iter()
            .filter(|(_, count)| *count >= 2)
            .map(|(bundle, _)| bundle)
            .collect();
        total_cost = (total_cost - BUNDLE_DISCOUNT * bundles.len() as f64).max(0.0);

        let expected_roi = if total_cost == 0.0 {
            0.0
        } else {
            (expected_value_min + expected_value_max) / 2.0 / total_cost
        };

        PriorityEntry {
            member_id: profile.member_id.clone(),
            priority_score: 0.0,
            raw_score,
            gap_measures: profile.gap_measures.clone(),
            total_cost,
            expected_value_min,
            expected_value_max,
            expected_roi,
            recommended_actions,
            bundles,
        }
    }

    /// Walks the ranked list in order and admits members while the running
    /// cost stays within budget. Stops at the first overrun rather than
    /// searching for an optimal packing.
    pub fn budget_plan(entries: &[PriorityEntry], budget: f64) -> BudgetPlan {
        let mut admitted = Vec::new();
        let mut total_cost = 0.0;
        let mut expected_value_min = 0.0;
        let mut expected_value_max = 0.0;

        for entry in entries {
            if total_cost + entry.total_cost > budget {
                break;
            }
            total_cost += entry.total_cost;
            expected_value_min += entry.expected_value_min;
            expected_value_max += entry.expected_value_max;
            admitted.push(entry.member_id.clone());
        }

        BudgetPlan {
            budget,
            admitted,
            total_cost,
            expected_value_min,
            expected_value_max,
        }
    }
}
