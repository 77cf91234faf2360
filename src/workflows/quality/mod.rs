//! Per-member, per-measure quality evaluation: the code-set registry, the
//! measure catalog, the generic evaluator, and the gap/summary rollups.

pub mod aggregate;
pub mod codes;
pub mod domain;
pub mod evaluation;
pub mod ingest;
pub mod measures;
pub mod population;

#[cfg(test)]
mod tests;

pub use aggregate::{GapAggregator, GapProfile, MeasureSummary};
pub use codes::{CodeSetRegistry, Concept};
pub use domain::{
    ClinicalEvent, EventKind, MeasurementPeriod, MemberEventIndex, MemberId, MemberRecord, Sex,
    StratificationVariable,
};
pub use evaluation::{IneligibilityReason, MeasureEvaluationResult, MeasureEvaluator};
pub use ingest::{SnapshotImportError, SnapshotImporter};
pub use measures::{
    BundleGroup, MeasureDefinition, MeasureId, MeasureRegistry, MeasureWeight, RegistryError,
};
pub use population::{evaluate_population, PopulationSnapshot};
