//! Portfolio-level analytics layered on the per-member evaluation results:
//! intervention prioritization, health-equity disparity scoring, and star
//! rating simulation.

pub mod equity;
pub mod optimizer;
pub mod rating;
pub mod report;

#[cfg(test)]
mod tests;

pub use equity::{
    DisparityBand, DisparityRecord, EquityAssessment, EquityPenalty, GroupRate,
    HealthEquityCalculator,
};
pub use optimizer::{BudgetPlan, CrossMeasureOptimizer, PriorityEntry};
pub use rating::{
    bonus_rate, measure_stars, ClosureStrategy, MeasureStarEntry, PortfolioRating, RatingScenario,
    StarRatingSimulator,
};
pub use report::{build_portfolio_report, PortfolioReport};
