use serde::{Deserialize, Serialize};

use crate::workflows::quality::aggregate::{GapProfile, MeasureSummary};
use crate::workflows::quality::measures::{MeasureId, MeasureRegistry, MeasureWeight};

/// Measure-level star band for a compliance rate. A fixed monotonic step
/// table, deliberately simpler than the CMS percentile-cutpoint method.
pub fn measure_stars(compliance_rate: f64) -> f64 {
    if compliance_rate >= 95.0 {
        5.0
    } else if compliance_rate >= 90.0 {
        4.5
    } else if compliance_rate >= 85.0 {
        4.0
    } else if compliance_rate >= 80.0 {
        3.5
    } else if compliance_rate >= 70.0 {
        3.0
    } else if compliance_rate >= 60.0 {
        2.5
    } else if compliance_rate >= 50.0 {
        2.0
    } else {
        1.0
    }
}

/// Bonus rate for an overall weighted star figure. Plans below three stars
/// pay in rather than earn.
pub fn bonus_rate(overall_stars: f64) -> f64 {
    if overall_stars >= 5.0 {
        0.05
    } else if overall_stars >= 4.5 {
        0.045
    } else if overall_stars >= 4.0 {
        0.04
    } else if overall_stars >= 3.5 {
        0.03
    } else if overall_stars >= 3.0 {
        0.015
    } else if overall_stars >= 2.5 {
        -0.01
    } else {
        -0.02
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasureStarEntry {
    pub measure_id: MeasureId,
    pub compliance_rate: f64,
    pub stars: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioRating {
    pub measure_stars: Vec<MeasureStarEntry>,
    /// Weighted average of measure-level stars, weight = measure weight.
    pub overall_stars: f64,
    pub bonus_rate: f64,
    pub bonus_payment: f64,
}

/// How a closure percentage is spread over the measure portfolio. Each
/// strategy is an explicit application rule, not a general optimizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClosureStrategy {
    Uniform,
    TripleWeightedFocus,
    NewMeasureFocus,
    MultiGapFocus,
    Balanced,
}

impl ClosureStrategy {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Uniform => "uniform closure",
            Self::TripleWeightedFocus => "triple-weighted focus",
            Self::NewMeasureFocus => "new-measure focus",
            Self::MultiGapFocus => "multi-gap member focus",
            Self::Balanced => "balanced",
        }
    }

    pub const fn all() -> [ClosureStrategy; 5] {
        [
            Self::Uniform,
            Self::TripleWeightedFocus,
            Self::NewMeasureFocus,
            Self::MultiGapFocus,
            Self::Balanced,
        ]
    }
}

/// One named what-if: the rating and bonus the portfolio would earn if a
/// share of open gaps were closed under the given strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingScenario {
    pub name: String,
    pub strategy: ClosureStrategy,
    pub closure_fraction: f64,
    pub rating: PortfolioRating,
    pub star_delta: f64,
    pub bonus_delta: f64,
}

/// Converts per-measure compliance into a banded star rating and bonus
/// payment, and replays that computation under closure scenarios.
#[derive(Debug, Clone, Copy)]
pub struct StarRatingSimulator {
    pub plan_revenue: f64,
}

impl StarRatingSimulator {
    pub fn new(plan_revenue: f64) -> Self {
        Self { plan_revenue }
    }

    /// Rating of the portfolio as it stands. Measures with an empty
    /// eligible population carry no signal and are left out of the
    /// weighted average.
    pub fn rate(&self, summaries: &[MeasureSummary], registry: &MeasureRegistry) -> PortfolioRating {
        self.rate_with(summaries, registry, |_, summary| summary.compliance_rate)
    }

    fn rate_with<F>(
        &self,
        summaries: &[MeasureSummary],
        registry: &MeasureRegistry,
        compliance: F,
    ) -> PortfolioRating
    where
        F: Fn(MeasureWeight, &MeasureSummary) -> f64,
    {
        let mut entries = Vec::new();
        let mut weighted_stars = 0.0;
        let mut weight_total = 0.0;

        for summary in summaries {
            if summary.eligible == 0 {
                continue;
            }
            let Some(definition) = registry.get(summary.measure_id) else {
                continue;
            };

            let rate = compliance(definition.weight, summary).clamp(0.0, 100.0);
            let stars = measure_stars(rate);
            weighted_stars += stars * definition.weight.factor();
            weight_total += definition.weight.factor();
            entries.push(MeasureStarEntry {
                measure_id: summary.measure_id,
                compliance_rate: rate,
                stars,
            });
        }

        let overall_stars = if weight_total == 0.0 {
            0.0
        } else {
            weighted_stars / weight_total
        };
        let rate = bonus_rate(overall_stars);

        PortfolioRating {
            measure_stars: entries,
            overall_stars,
            bonus_rate: rate,
            bonus_payment: rate * self.plan_revenue,
        }
    }

    /// Replays the rating with `closure_fraction` of each measure's gap
    /// rate recovered, spread according to the strategy, and reports the
    /// deltas against the unclosed baseline.
    pub fn simulate(
        &self,
        summaries: &[MeasureSummary],
        registry: &MeasureRegistry,
        profiles: &[GapProfile],
        strategy: ClosureStrategy,
        closure_fraction: f64,
    ) -> RatingScenario {
        let baseline = self.rate(summaries, registry);
        let closure_fraction = closure_fraction.clamp(0.0, 1.0);

        // Share of all open gaps held by members with two or more gaps,
        // used to scale the multi-gap strategy.
        let total_gaps: usize = profiles.iter().map(|profile| profile.total_gaps).sum();
        let multi_gap_share = if total_gaps == 0 {
            0.0
        } else {
            let multi: usize = profiles
                .iter()
                .filter(|profile| profile.has_multiple_gaps)
                .map(|profile| profile.total_gaps)
                .sum();
            multi as f64 / total_gaps as f64
        };

        let rating = self.rate_with(summaries, registry, |weight, summary| {
            let definition = registry.get(summary.measure_id);
            let triple = weight == MeasureWeight::Triple;
            let new_measure = definition.map(|d| d.new_measure).unwrap_or(false);

            let applied = match strategy {
                ClosureStrategy::Uniform => closure_fraction,
                ClosureStrategy::TripleWeightedFocus => {
                    if triple {
                        closure_fraction
                    } else {
                        0.0
                    }
                }
                ClosureStrategy::NewMeasureFocus => {
                    if new_measure {
                        closure_fraction
                    } else {
                        0.0
                    }
                }
                ClosureStrategy::MultiGapFocus => closure_fraction * multi_gap_share,
                ClosureStrategy::Balanced => {
                    if triple || new_measure {
                        closure_fraction
                    } else {
                        closure_fraction / 2.0
                    }
                }
            };

            (summary.compliance_rate + summary.gap_rate() * applied).min(100.0)
        });

        RatingScenario {
            name: format!(
                "{:.0}% gap closure, {}",
                closure_fraction * 100.0,
                strategy.label()
            ),
            strategy,
            closure_fraction,
            star_delta: rating.overall_stars - baseline.overall_stars,
            bonus_delta: rating.bonus_payment - baseline.bonus_payment,
            rating,
        }
    }

    /// The standard scenario grid: uniform closure at each step, plus every
    /// focused strategy at the middle step.
    pub fn standard_scenarios(
        &self,
        summaries: &[MeasureSummary],
        registry: &MeasureRegistry,
        profiles: &[GapProfile],
    ) -> Vec<RatingScenario> {
        let mut scenarios = Vec::new();
        for fraction in [0.25, 0.5, 0.75, 1.0] {
            scenarios.push(self.simulate(
                summaries,
                registry,
                profiles,
                ClosureStrategy::Uniform,
                fraction,
            ));
        }
        for strategy in ClosureStrategy::all() {
            if strategy == ClosureStrategy::Uniform {
                continue;
            }
            scenarios.push(self.simulate(summaries, registry, profiles, strategy, 0.5));
        }
        scenarios
    }
}
