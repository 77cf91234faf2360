use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::workflows::quality::domain::{MemberId, MemberRecord, StratificationVariable};
use crate::workflows::quality::evaluation::MeasureEvaluationResult;
use crate::workflows::quality::measures::{MeasureId, MeasureRegistry};

/// Severity category for a compliance-rate spread, in percentage points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisparityBand {
    Minimal,
    Small,
    Moderate,
    Large,
    Severe,
}

impl DisparityBand {
    pub fn from_magnitude(magnitude_pp: f64) -> Self {
        if magnitude_pp < 5.0 {
            Self::Minimal
        } else if magnitude_pp < 10.0 {
            Self::Small
        } else if magnitude_pp < 20.0 {
            Self::Moderate
        } else if magnitude_pp < 30.0 {
            Self::Large
        } else {
            Self::Severe
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Minimal => "minimal",
            Self::Small => "small",
            Self::Moderate => "moderate",
            Self::Large => "large",
            Self::Severe => "severe",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupRate {
    pub group: String,
    pub eligible: usize,
    pub numerator: usize,
    pub compliance_rate: f64,
}

/// Compliance spread across demographic groups for one (measure,
/// stratification) pair. Groups below the minimum size are dropped before
/// comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisparityRecord {
    pub measure_id: MeasureId,
    pub variable: StratificationVariable,
    pub group_rates: Vec<GroupRate>,
    pub highest_group: Option<String>,
    pub lowest_group: Option<String>,
    pub magnitude_pp: f64,
    pub band: DisparityBand,
    pub has_disparity: bool,
    /// 100 when no disparity, otherwise decays linearly with magnitude.
    pub equity_score: f64,
}

/// Penalty band applied to the portfolio rating when the equity score
/// falls below the tolerated floor. The dollar impacts are configuration
/// constants, not derived figures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EquityPenalty {
    None,
    Moderate,
    Severe,
}

impl EquityPenalty {
    pub fn from_score(score: f64) -> Self {
        if score >= 70.0 {
            Self::None
        } else if score >= 50.0 {
            Self::Moderate
        } else {
            Self::Severe
        }
    }

    pub const fn rating_penalty(self) -> f64 {
        match self {
            Self::None => 0.0,
            Self::Moderate => -0.25,
            Self::Severe => -0.5,
        }
    }

    pub const fn financial_impact(self) -> f64 {
        match self {
            Self::None => 0.0,
            Self::Moderate => 2_500_000.0,
            Self::Severe => 6_000_000.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquityAssessment {
    pub disparities: Vec<DisparityRecord>,
    pub portfolio_score: f64,
    pub penalty: EquityPenalty,
}

/// Measures performance disparities across demographic subgroups and rolls
/// them up into a portfolio equity score with penalty banding.
#[derive(Debug, Clone, Copy)]
pub struct HealthEquityCalculator {
    pub min_group_size: usize,
    pub disparity_threshold_pp: f64,
}

impl Default for HealthEquityCalculator {
    fn default() -> Self {
        Self {
            min_group_size: 30,
            disparity_threshold_pp: 10.0,
        }
    }
}

impl HealthEquityCalculator {
    /// Stratifies one measure's eligible population along one demographic
    /// axis. Members without a recorded value for the axis are left out of
    /// every group.
    pub fn stratify(
        &self,
        measure_id: MeasureId,
        results: &[MeasureEvaluationResult],
        members: &[MemberRecord],
        variable: StratificationVariable,
    ) -> DisparityRecord {
        let by_id: BTreeMap<&MemberId, &MemberRecord> = members
            .iter()
            .map(|member| (&member.member_id, member))
            .collect();

        let mut groups: BTreeMap<String, (usize, usize)> = BTreeMap::new();
        for result in results {
            if result.measure_id != measure_id || !result.in_denominator || result.excluded {
                continue;
            }
            let Some(record) = by_id.get(&result.member_id) else {
                continue;
            };
            let Some(stratum) = record.stratum(variable) else {
                continue;
            };
            let (eligible, numerator) = groups.entry(stratum).or_default();
            *eligible += 1;
            if result.in_numerator {
                *numerator += 1;
            }
        }

        let group_rates: Vec<GroupRate> = groups
            .into_iter()
            .filter(|(_, (eligible, _))| *eligible >= self.min_group_size)
            .map(|(group, (eligible, numerator))| GroupRate {
                group,
                eligible,
                numerator,
                compliance_rate: numerator as f64 / eligible as f64 * 100.0,
            })
            .collect();

        let highest = group_rates
            .iter()
            .max_by(|a, b| a.compliance_rate.total_cmp(&b.compliance_rate));
        let lowest = group_rates
            .iter()
            .min_by(|a, b| a.compliance_rate.total_cmp(&b.compliance_rate));

        let magnitude_pp = match (highest, lowest) {
            (Some(high), Some(low)) => high.compliance_rate - low.compliance_rate,
            _ => 0.0,
        };
        let has_disparity = magnitude_pp >= self.disparity_threshold_pp;
        let equity_score = if has_disparity {
            (100.0 - 2.0 * magnitude_pp).max(0.0)
        } else {
            100.0
        };

        DisparityRecord {
            measure_id,
            variable,
            highest_group: highest.map(|rate| rate.group.clone()),
            lowest_group: lowest.map(|rate| rate.group.clone()),
            group_rates,
            magnitude_pp,
            band: DisparityBand::from_magnitude(magnitude_pp),
            has_disparity,
            equity_score,
        }
    }

    /// Weighted average of the per-comparison scores, weight = measure
    /// weight. An empty disparity set scores a clean 100.
    pub fn score_portfolio(
        &self,
        disparities: &[DisparityRecord],
        registry: &MeasureRegistry,
    ) -> f64 {
        let mut weighted_sum = 0.0;
        let mut weight_total = 0.0;
        for record in disparities {
            let Some(definition) = registry.get(record.measure_id) else {
                continue;
            };
            let weight = definition.weight.factor();
            weighted_sum += record.equity_score * weight;
            weight_total += weight;
        }

        if weight_total == 0.0 {
            100.0
        } else {
            weighted_sum / weight_total
        }
    }

    /// Runs every measure against every stratification axis and bands the
    /// resulting portfolio score.
    pub fn assess(
        &self,
        results: &[MeasureEvaluationResult],
        members: &[MemberRecord],
        registry: &MeasureRegistry,
    ) -> EquityAssessment {
        let mut disparities = Vec::new();
        for definition in registry.definitions() {
            for variable in StratificationVariable::all() {
                disparities.push(self.stratify(definition.id, results, members, variable));
            }
        }

        let portfolio_score = self.score_portfolio(&disparities, registry);
        EquityAssessment {
            disparities,
            portfolio_score,
            penalty: EquityPenalty::from_score(portfolio_score),
        }
    }
}
