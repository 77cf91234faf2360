mod pdc;

use serde::{Deserialize, Serialize};

use super::codes::Concept;
use super::domain::{MeasurementPeriod, MemberEventIndex, MemberId, MemberRecord, ResolvedEvent};
use super::measures::{MeasureDefinition, MeasureId, Modality, NumeratorRule};

/// Why a member fell out of the denominator before exclusions were checked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IneligibilityReason {
    /// Missing required member data (e.g. birth date); the member degrades,
    /// the batch does not.
    InsufficientData { missing: String },
    OutsideAgeBand { age: u32 },
    InsufficientEnrollment { days: u32 },
    SexRestricted,
    MissingQualifyingDiagnosis,
    InsufficientQualifyingFills { found: usize },
    NoQualifyingEncounter,
}

/// Outcome for one (member, measure) pair. Produced fresh each run, never
/// mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasureEvaluationResult {
    pub member_id: MemberId,
    pub measure_id: MeasureId,
    pub in_denominator: bool,
    pub excluded: bool,
    pub exclusion_reason: Option<Concept>,
    pub ineligibility_reason: Option<IneligibilityReason>,
    pub in_numerator: bool,
    pub numerator_reason: String,
    pub has_gap: bool,
}

impl MeasureEvaluationResult {
    fn ineligible(
        member_id: MemberId,
        measure_id: MeasureId,
        reason: IneligibilityReason,
    ) -> Self {
        Self {
            member_id,
            measure_id,
            in_denominator: false,
            excluded: false,
            exclusion_reason: None,
            ineligibility_reason: Some(reason),
            in_numerator: false,
            numerator_reason: "not eligible".to_string(),
            has_gap: false,
        }
    }

    /// Excluded members stay counted in the denominator but leave the
    /// eligible population without opening a gap.
    fn excluded(member_id: MemberId, measure_id: MeasureId, reason: Concept) -> Self {
        Self {
            member_id,
            measure_id,
            in_denominator: true,
            excluded: true,
            exclusion_reason: Some(reason),
            ineligibility_reason: None,
            in_numerator: false,
            numerator_reason: format!("excluded: {}", reason.label()),
            has_gap: false,
        }
    }

    fn measured(
        member_id: MemberId,
        measure_id: MeasureId,
        in_numerator: bool,
        numerator_reason: String,
    ) -> Self {
        Self {
            member_id,
            measure_id,
            in_denominator: true,
            excluded: false,
            exclusion_reason: None,
            ineligibility_reason: None,
            in_numerator,
            numerator_reason,
            has_gap: !in_numerator,
        }
    }
}

/// Stateless evaluator applying one measure definition to one member's
/// indexed events: age/enrollment, eligibility, exclusions, then the
/// numerator, short-circuiting at the first failed stage.
pub struct MeasureEvaluator {
    period: MeasurementPeriod,
}

impl MeasureEvaluator {
    pub fn new(period: MeasurementPeriod) -> Self {
        Self { period }
    }

    pub fn period(&self) -> MeasurementPeriod {
        self.period
    }

    pub fn evaluate(
        &self,
        definition: &MeasureDefinition,
        member: &MemberRecord,
        index: &MemberEventIndex,
    ) -> MeasureEvaluationResult {
        let member_id = member.member_id.clone();
        let measure_id = definition.id;
        let eligibility = &definition.eligibility;

        // Stage 1: age and enrollment as of December 31.
        let Some(age) = member.age_at(self.period.end()) else {
            return MeasureEvaluationResult::ineligible(
                member_id,
                measure_id,
                IneligibilityReason::InsufficientData {
                    missing: "birth date".to_string(),
                },
            );
        };
        if age < eligibility.age_min || age > eligibility.age_max {
            return MeasureEvaluationResult::ineligible(
                member_id,
                measure_id,
                IneligibilityReason::OutsideAgeBand { age },
            );
        }
        if member.enrollment_days < eligibility.min_enrollment_days {
            return MeasureEvaluationResult::ineligible(
                member_id,
                measure_id,
                IneligibilityReason::InsufficientEnrollment {
                    days: member.enrollment_days,
                },
            );
        }

        // Stage 2: measure-specific positive criteria.
        if let Some(required_sex) = eligibility.sex {
            if member.sex != required_sex {
                return MeasureEvaluationResult::ineligible(
                    member_id,
                    measure_id,
                    IneligibilityReason::SexRestricted,
                );
            }
        }
        if let Some(diagnosis) = &eligibility.required_diagnosis {
            let window = self.period.lookback_months(diagnosis.lookback_months);
            if !index.any_within(diagnosis.concept, window) {
                return MeasureEvaluationResult::ineligible(
                    member_id,
                    measure_id,
                    IneligibilityReason::MissingQualifyingDiagnosis,
                );
            }
        }
        if let Some(fills) = &eligibility.min_qualifying_fills {
            let found = index.fills_within(fills.concept, self.period.window()).len();
            if found < fills.min_count {
                return MeasureEvaluationResult::ineligible(
                    member_id,
                    measure_id,
                    IneligibilityReason::InsufficientQualifyingFills { found },
                );
            }
        }
        if let Some(encounter) = eligibility.required_encounter {
            if !index.any_within(encounter, self.period.window()) {
                return MeasureEvaluationResult::ineligible(
                    member_id,
                    measure_id,
                    IneligibilityReason::NoQualifyingEncounter,
                );
            }
        }

        // Stage 3: any matching exclusion removes the member from the
        // eligible population; the first match is recorded.
        for exclusion in &definition.exclusions {
            let window = match exclusion.lookback_months {
                Some(months) => self.period.lookback_months(months),
                None => super::domain::DateWindow {
                    start: chrono::NaiveDate::MIN,
                    end: self.period.end(),
                },
            };
            if index.any_within(exclusion.concept, window) {
                return MeasureEvaluationResult::excluded(
                    member_id,
                    measure_id,
                    exclusion.concept,
                );
            }
        }

        // Stage 4: numerator.
        let (in_numerator, reason) = self.check_numerator(&definition.numerator, index);
        MeasureEvaluationResult::measured(member_id, measure_id, in_numerator, reason)
    }

    fn check_numerator(
        &self,
        rule: &NumeratorRule,
        index: &MemberEventIndex,
    ) -> (bool, String) {
        match rule {
            NumeratorRule::QualifyingEvent { modalities } => {
                self.check_qualifying_event(modalities, index)
            }
            NumeratorRule::ResultBelow {
                concept,
                lookback_months,
                threshold,
            } => {
                let window = self.period.lookback_months(*lookback_months);
                let latest = index
                    .events_for(*concept)
                    .iter()
                    .rev()
                    .find(|event| window.contains(event.date) && event.value.is_some());
                match latest {
                    Some(event) => {
                        let value = event.value.unwrap_or(f64::MAX);
                        if value < *threshold {
                            (
                                true,
                                format!(
                                    "{} {:.1} under {:.1} on {}",
                                    concept.label(),
                                    value,
                                    threshold,
                                    event.date
                                ),
                            )
                        } else {
                            (
                                false,
                                format!(
                                    "{} {:.1} not under {:.1}",
                                    concept.label(),
                                    value,
                                    threshold
                                ),
                            )
                        }
                    }
                    None => (false, format!("no {} in window", concept.label())),
                }
            }
            NumeratorRule::AllResultsPresent {
                concepts,
                lookback_months,
            } => {
                let window = self.period.lookback_months(*lookback_months);
                let missing: Vec<&'static str> = concepts
                    .iter()
                    .filter(|concept| !index.any_within(**concept, window))
                    .map(|concept| concept.label())
                    .collect();
                if missing.is_empty() {
                    (true, "all required results present".to_string())
                } else {
                    (false, format!("missing {}", missing.join(", ")))
                }
            }
            NumeratorRule::BloodPressureControl {
                systolic_under,
                diastolic_under,
            } => {
                let window = self.period.window();
                let systolic = latest_value(index, Concept::SystolicReading, window);
                let diastolic = latest_value(index, Concept::DiastolicReading, window);
                match (systolic, diastolic) {
                    (Some(sys), Some(dia)) => {
                        if sys < *systolic_under && dia < *diastolic_under {
                            (true, format!("blood pressure {sys:.0}/{dia:.0} controlled"))
                        } else {
                            (
                                false,
                                format!("blood pressure {sys:.0}/{dia:.0} not controlled"),
                            )
                        }
                    }
                    _ => (false, "no blood pressure reading in year".to_string()),
                }
            }
            NumeratorRule::DaysCovered {
                med_class,
                threshold,
            } => {
                let window = self.period.window();
                let fills = index.fills_within(*med_class, window);
                let pdc = pdc::proportion_of_days_covered(&fills, window);
                if pdc >= *threshold {
                    (true, format!("PDC {pdc:.2} at or above {threshold:.2}"))
                } else {
                    (false, format!("PDC {pdc:.2} below {threshold:.2}"))
                }
            }
        }
    }

    /// The first qualifying event chronologically satisfies the numerator,
    /// regardless of modality preference.
    fn check_qualifying_event(
        &self,
        modalities: &[Modality],
        index: &MemberEventIndex,
    ) -> (bool, String) {
        let mut earliest: Option<&ResolvedEvent> = None;
        for modality in modalities {
            let window = self.period.lookback_months(modality.lookback_months);
            if let Some(event) = index.first_within(modality.concept, window) {
                earliest = match earliest {
                    Some(current) if current.date <= event.date => Some(current),
                    _ => Some(event),
                };
            }
        }

        match earliest {
            Some(event) => (
                true,
                format!("satisfied by {} on {}", event.concept.label(), event.date),
            ),
            None => {
                let wanted: Vec<&'static str> = modalities
                    .iter()
                    .map(|modality| modality.concept.label())
                    .collect();
                (false, format!("no qualifying {} found", wanted.join(" or ")))
            }
        }
    }
}

fn latest_value(
    index: &MemberEventIndex,
    concept: Concept,
    window: super::domain::DateWindow,
) -> Option<f64> {
    index
        .events_for(concept)
        .iter()
        .rev()
        .find(|event| window.contains(event.date) && event.value.is_some())
        .and_then(|event| event.value)
}
