use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::domain::MemberId;
use super::evaluation::MeasureEvaluationResult;
use super::measures::{MeasureId, MeasureRegistry, MeasureWeight};

/// Per-member rollup across all measures. Derived entirely from the
/// evaluation results; recomputed whenever inputs change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GapProfile {
    pub member_id: MemberId,
    pub total_denominators: usize,
    pub total_numerators: usize,
    pub total_gaps: usize,
    pub gap_measures: Vec<MeasureId>,
    pub triple_weighted_gaps: usize,
    pub has_multiple_gaps: bool,
    pub has_3plus_gaps: bool,
}

/// Per-measure population rollup feeding the equity and rating stages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasureSummary {
    pub measure_id: MeasureId,
    pub denominator: usize,
    pub excluded: usize,
    pub numerator: usize,
    pub gaps: usize,
    /// Denominator minus exclusions.
    pub eligible: usize,
    /// Percentage of the eligible population in the numerator, 0 when the
    /// eligible population is empty.
    pub compliance_rate: f64,
}

impl MeasureSummary {
    pub fn gap_rate(&self) -> f64 {
        if self.eligible == 0 {
            0.0
        } else {
            self.gaps as f64 / self.eligible as f64 * 100.0
        }
    }
}

/// Groups evaluation results by member and folds them into GapProfiles.
/// A pure, order-independent reduction over the result set.
pub struct GapAggregator;

impl GapAggregator {
    pub fn aggregate(
        results: &[MeasureEvaluationResult],
        registry: &MeasureRegistry,
    ) -> Vec<GapProfile> {
        let mut by_member: BTreeMap<&MemberId, Vec<&MeasureEvaluationResult>> = BTreeMap::new();
        for result in results {
            by_member.entry(&result.member_id).or_default().push(result);
        }

        by_member
            .into_iter()
            .map(|(member_id, member_results)| {
                let mut gap_measures: Vec<MeasureId> = member_results
                    .iter()
                    .filter(|result| result.has_gap)
                    .map(|result| result.measure_id)
                    .collect();
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
                    member_id: member_id.clone(),
                    total_denominators: member_results
                        .iter()
                        .filter(|result| result.in_denominator)
                        .count(),
                    total_numerators: member_results
                        .iter()
                        .filter(|result| result.in_numerator)
                        .count(),
                    total_gaps,
                    gap_measures,
                    triple_weighted_gaps,
                    has_multiple_gaps: total_gaps >= 2,
                    has_3plus_gaps: total_gaps >= 3,
                }
            })
            .collect()
    }

    /// Per-measure population summaries in catalog order.
    pub fn summarize(
        results: &[MeasureEvaluationResult],
        registry: &MeasureRegistry,
    ) -> Vec<MeasureSummary> {
        registry
            .definitions()
            .iter()
            .map(|definition| {
                let for_measure: Vec<&MeasureEvaluationResult> = results
                    .iter()
                    .filter(|result| result.measure_id == definition.id)
                    .collect();

                let denominator = for_measure
                    .iter()
                    .filter(|result| result.in_denominator)
                    .count();
                let excluded = for_measure.iter().filter(|result| result.excluded).count();
                let numerator = for_measure
                    .iter()
                    .filter(|result| result.in_numerator)
                    .count();
                let gaps = for_measure.iter().filter(|result| result.has_gap).count();
                let eligible = denominator.saturating_sub(excluded);
                let compliance_rate = if eligible == 0 {
                    0.0
                } else {
                    numerator as f64 / eligible as f64 * 100.0
                };

                MeasureSummary {
                    measure_id: definition.id,
                    denominator,
                    excluded,
                    numerator,
                    gaps,
                    eligible,
                    compliance_rate,
                }
            })
            .collect()
    }
}
