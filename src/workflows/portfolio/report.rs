use serde::{Deserialize, Serialize};

use super::equity::{EquityAssessment, HealthEquityCalculator};
use super::optimizer::{BudgetPlan, CrossMeasureOptimizer, PriorityEntry};
use super::rating::{PortfolioRating, RatingScenario, StarRatingSimulator};
use crate::workflows::quality::aggregate::{GapAggregator, GapProfile, MeasureSummary};
use crate::workflows::quality::codes::CodeSetRegistry;
use crate::workflows::quality::domain::MeasurementPeriod;
use crate::workflows::quality::measures::MeasureRegistry;
use crate::workflows::quality::population::{evaluate_population, PopulationSnapshot};

/// The full portfolio picture for one measurement-year snapshot: measure
/// rollups, member gap profiles, the ranked intervention list, the equity
/// assessment, and the rating with its closure scenarios.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioReport {
    pub measurement_year: i32,
    pub members_evaluated: usize,
    pub measure_summaries: Vec<MeasureSummary>,
    pub gap_profiles: Vec<GapProfile>,
    pub priorities: Vec<PriorityEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub budget_plan: Option<BudgetPlan>,
    pub equity: EquityAssessment,
    pub current_rating: PortfolioRating,
    pub scenarios: Vec<RatingScenario>,
}

/// Runs the whole pipeline over a pre-loaded snapshot. Evaluation is the
/// only parallel phase; everything downstream folds over its completed
/// result set.
pub fn build_portfolio_report(
    registry: &MeasureRegistry,
    codes: &CodeSetRegistry,
    period: MeasurementPeriod,
    snapshot: &PopulationSnapshot,
    plan_revenue: f64,
    budget: Option<f64>,
) -> PortfolioReport {
    let results = evaluate_population(registry, codes, period, snapshot);

    let gap_profiles = GapAggregator::aggregate(&results, registry);
    let measure_summaries = GapAggregator::summarize(&results, registry);

    let priorities = CrossMeasureOptimizer::score(&gap_profiles, registry, &measure_summaries);
    let budget_plan = budget.map(|ceiling| CrossMeasureOptimizer::budget_plan(&priorities, ceiling));

    let equity = HealthEquityCalculator::default().assess(&results, &snapshot.members, registry);

    let simulator = StarRatingSimulator::new(plan_revenue);
    let current_rating = simulator.rate(&measure_summaries, registry);
    let scenarios = simulator.standard_scenarios(&measure_summaries, registry, &gap_profiles);

    PortfolioReport {
        measurement_year: period.year,
        members_evaluated: snapshot.members.len(),
        measure_summaries,
        gap_profiles,
        priorities,
        budget_plan,
        equity,
        current_rating,
        scenarios,
    }
}
