use super::{
    DiagnosisRequirement, EligibilityRule, ExclusionRule, FillRequirement, MeasureDefinition,
    MeasureId, MeasureWeight, Modality, NumeratorRule, ValueRange,
};
use crate::workflows::quality::codes::Concept;
use crate::workflows::quality::measures::BundleGroup;
use crate::workflows::quality::domain::Sex;

const MIN_ENROLLMENT_DAYS: u32 = 270;
const PDC_THRESHOLD: f64 = 0.80;

fn eligibility(age_min: u32, age_max: u32) -> EligibilityRule {
    EligibilityRule {
        age_min,
        age_max,
        sex: None,
        min_enrollment_days: MIN_ENROLLMENT_DAYS,
        required_diagnosis: None,
        min_qualifying_fills: None,
        required_encounter: None,
    }
}

fn diabetes_dx() -> Option<DiagnosisRequirement> {
    Some(DiagnosisRequirement {
        concept: Concept::Diabetes,
        lookback_months: 24,
    })
}

fn hospice_exclusion() -> ExclusionRule {
    ExclusionRule {
        concept: Concept::Hospice,
        lookback_months: Some(12),
    }
}

fn adherence_measure(
    id: MeasureId,
    name: &'static str,
    med_class: Concept,
    value_range: ValueRange,
) -> MeasureDefinition {
    MeasureDefinition {
        id,
        name,
        weight: MeasureWeight::Triple,
        value_range,
        eligibility: EligibilityRule {
            min_qualifying_fills: Some(FillRequirement {
                concept: med_class,
                min_count: 2,
            }),
            ..eligibility(18, 85)
        },
        exclusions: vec![hospice_exclusion()],
        numerator: NumeratorRule::DaysCovered {
            med_class,
            threshold: PDC_THRESHOLD,
        },
        intervention_cost: 28.0,
        closure_probability: 0.50,
        new_measure: false,
        bundle: Some(BundleGroup::PharmacySync),
        recommended_action: "Enroll the member in refill synchronization and 90-day supplies",
    }
}

/// The shipped measure portfolio. Windows, thresholds, and dollar values
/// are fixed configuration; the evaluator never special-cases a measure.
pub(super) fn standard_catalog() -> Vec<MeasureDefinition> {
    vec![
        MeasureDefinition {
            id: MeasureId::Bcs,
            name: "Breast Cancer Screening",
            weight: MeasureWeight::Standard,
            value_range: ValueRange { min: 120.0, max: 260.0 },
            eligibility: EligibilityRule {
                sex: Some(Sex::Female),
                ..eligibility(50, 74)
            },
            exclusions: vec![
                ExclusionRule {
                    concept: Concept::BilateralMastectomy,
                    lookback_months: None,
                },
                hospice_exclusion(),
            ],
            numerator: NumeratorRule::QualifyingEvent {
                modalities: vec![Modality {
                    concept: Concept::Mammogram,
                    lookback_months: 27,
                }],
            },
            intervention_cost: 45.0,
            closure_probability: 0.55,
            new_measure: false,
            bundle: None,
            recommended_action: "Schedule a screening mammogram",
        },
        MeasureDefinition {
            id: MeasureId::Col,
            name: "Colorectal Cancer Screening",
            weight: MeasureWeight::Standard,
            value_range: ValueRange { min: 90.0, max: 210.0 },
            eligibility: eligibility(45, 75),
            exclusions: vec![
                ExclusionRule {
                    concept: Concept::TotalColectomy,
                    lookback_months: None,
                },
                hospice_exclusion(),
            ],
            // Colonoscopy carries a ten-year window; an annual FIT also
            // satisfies the numerator.
            numerator: NumeratorRule::QualifyingEvent {
                modalities: vec![
                    Modality {
                        concept: Concept::Colonoscopy,
                        lookback_months: 120,
                    },
                    Modality {
                        concept: Concept::FitTest,
                        lookback_months: 12,
                    },
                ],
            },
            intervention_cost: 38.0,
            closure_probability: 0.48,
            new_measure: false,
            bundle: None,
            recommended_action: "Mail a FIT kit or schedule a colonoscopy",
        },
        MeasureDefinition {
            id: MeasureId::Cbp,
            name: "Controlling High Blood Pressure",
            weight: MeasureWeight::Triple,
            value_range: ValueRange { min: 220.0, max: 480.0 },
            eligibility: EligibilityRule {
                required_diagnosis: Some(DiagnosisRequirement {
                    concept: Concept::Hypertension,
                    lookback_months: 12,
                }),
                ..eligibility(18, 85)
            },
            exclusions: vec![
                ExclusionRule {
                    concept: Concept::Esrd,
                    lookback_months: None,
                },
                ExclusionRule {
                    concept: Concept::KidneyTransplant,
                    lookback_months: None,
                },
                ExclusionRule {
                    concept: Concept::Pregnancy,
                    lookback_months: Some(12),
                },
                hospice_exclusion(),
            ],
            numerator: NumeratorRule::BloodPressureControl {
                systolic_under: 140.0,
                diastolic_under: 90.0,
            },
            intervention_cost: 60.0,
            closure_probability: 0.42,
            new_measure: false,
            bundle: Some(BundleGroup::PrimaryCareVisit),
            recommended_action: "Book a blood-pressure recheck visit",
        },
        MeasureDefinition {
            id: MeasureId::Hbd,
            name: "Glycemic Status for Patients with Diabetes",
            weight: MeasureWeight::Triple,
            value_range: ValueRange { min: 250.0, max: 520.0 },
            eligibility: EligibilityRule {
                required_diagnosis: diabetes_dx(),
                ..eligibility(18, 75)
            },
            exclusions: vec![
                hospice_exclusion(),
                ExclusionRule {
                    concept: Concept::AdvancedIllness,
                    lookback_months: Some(24),
                },
            ],
            numerator: NumeratorRule::ResultBelow {
                concept: Concept::HbA1cLab,
                lookback_months: 12,
                threshold: 8.0,
            },
            intervention_cost: 55.0,
            closure_probability: 0.40,
            new_measure: false,
            bundle: Some(BundleGroup::LabDraw),
            recommended_action: "Order an HbA1c draw and review therapy intensity",
        },
        MeasureDefinition {
            id: MeasureId::Ked,
            name: "Kidney Health Evaluation for Patients with Diabetes",
            weight: MeasureWeight::Triple,
            value_range: ValueRange { min: 180.0, max: 400.0 },
            eligibility: EligibilityRule {
                required_diagnosis: diabetes_dx(),
                ..eligibility(18, 85)
            },
            exclusions: vec![
                ExclusionRule {
                    concept: Concept::Esrd,
                    lookback_months: None,
                },
                ExclusionRule {
                    concept: Concept::KidneyTransplant,
                    lookback_months: None,
                },
                hospice_exclusion(),
            ],
            numerator: NumeratorRule::AllResultsPresent {
                concepts: vec![Concept::EgfrLab, Concept::UacrLab],
                lookback_months: 12,
            },
            intervention_cost: 32.0,
            closure_probability: 0.58,
            new_measure: true,
            bundle: Some(BundleGroup::LabDraw),
            recommended_action: "Order a combined eGFR and uACR panel",
        },
        MeasureDefinition {
            id: MeasureId::Eed,
            name: "Eye Exam for Patients with Diabetes",
            weight: MeasureWeight::Standard,
            value_range: ValueRange { min: 110.0, max: 240.0 },
            eligibility: EligibilityRule {
                required_diagnosis: diabetes_dx(),
                ..eligibility(18, 75)
            },
            exclusions: vec![hospice_exclusion()],
            numerator: NumeratorRule::QualifyingEvent {
                modalities: vec![Modality {
                    concept: Concept::RetinalExam,
                    lookback_months: 24,
                }],
            },
            intervention_cost: 48.0,
            closure_probability: 0.45,
            new_measure: false,
            bundle: Some(BundleGroup::PrimaryCareVisit),
            recommended_action: "Refer for a dilated retinal exam",
        },
        MeasureDefinition {
            id: MeasureId::Supd,
            name: "Statin Use in Persons with Diabetes",
            weight: MeasureWeight::Standard,
            value_range: ValueRange { min: 140.0, max: 300.0 },
            eligibility: EligibilityRule {
                required_diagnosis: diabetes_dx(),
                ..eligibility(40, 75)
            },
            exclusions: vec![
                ExclusionRule {
                    concept: Concept::Pregnancy,
                    lookback_months: Some(12),
                },
                ExclusionRule {
                    concept: Concept::Esrd,
                    lookback_months: None,
                },
                hospice_exclusion(),
            ],
            numerator: NumeratorRule::QualifyingEvent {
                modalities: vec![Modality {
                    concept: Concept::Statin,
                    lookback_months: 12,
                }],
            },
            intervention_cost: 25.0,
            closure_probability: 0.52,
            new_measure: true,
            bundle: Some(BundleGroup::PharmacySync),
            recommended_action: "Start a moderate-intensity statin",
        },
        MeasureDefinition {
            id: MeasureId::Omw,
            name: "Osteoporosis Management in Women Who Had a Fracture",
            weight: MeasureWeight::Standard,
            value_range: ValueRange { min: 150.0, max: 330.0 },
            eligibility: EligibilityRule {
                sex: Some(Sex::Female),
                required_diagnosis: Some(DiagnosisRequirement {
                    concept: Concept::FragilityFracture,
                    lookback_months: 12,
                }),
                ..eligibility(67, 85)
            },
            exclusions: vec![hospice_exclusion()],
            numerator: NumeratorRule::QualifyingEvent {
                modalities: vec![
                    Modality {
                        concept: Concept::BoneDensityTest,
                        lookback_months: 6,
                    },
                    Modality {
                        concept: Concept::OsteoporosisTherapy,
                        lookback_months: 6,
                    },
                ],
            },
            intervention_cost: 65.0,
            closure_probability: 0.35,
            new_measure: false,
            bundle: None,
            recommended_action: "Order a bone density test or start osteoporosis therapy",
        },
        MeasureDefinition {
            id: MeasureId::Flu,
            name: "Annual Flu Vaccine",
            weight: MeasureWeight::Standard,
            value_range: ValueRange { min: 60.0, max: 140.0 },
            eligibility: EligibilityRule {
                required_encounter: Some(Concept::OfficeVisit),
                ..eligibility(18, 120)
            },
            exclusions: vec![hospice_exclusion()],
            numerator: NumeratorRule::QualifyingEvent {
                modalities: vec![Modality {
                    concept: Concept::FluVaccine,
                    lookback_months: 12,
                }],
            },
            intervention_cost: 12.0,
            closure_probability: 0.60,
            new_measure: false,
            bundle: Some(BundleGroup::PrimaryCareVisit),
            recommended_action: "Offer influenza vaccination at the next visit",
        },
        adherence_measure(
            MeasureId::PdcDiabetes,
            "Medication Adherence for Diabetes Medications",
            Concept::OralDiabetesMed,
            ValueRange { min: 200.0, max: 440.0 },
        ),
        adherence_measure(
            MeasureId::PdcStatins,
            "Medication Adherence for Cholesterol (Statins)",
            Concept::Statin,
            ValueRange { min: 190.0, max: 420.0 },
        ),
        adherence_measure(
            MeasureId::PdcRasa,
            "Medication Adherence for Hypertension (RAS Antagonists)",
            Concept::RasAntagonist,
            ValueRange { min: 190.0, max: 420.0 },
        ),
    ]
}
