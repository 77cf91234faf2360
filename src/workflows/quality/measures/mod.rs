mod catalog;

use serde::{Deserialize, Serialize};

use super::codes::Concept;
use super::domain::Sex;

/// Identifiers for the shipped measure catalog.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum MeasureId {
    Bcs,
    Col,
    Cbp,
    Hbd,
    Ked,
    Eed,
    Supd,
    Omw,
    Flu,
    PdcDiabetes,
    PdcStatins,
    PdcRasa,
}

impl MeasureId {
    pub const fn code(self) -> &'static str {
        match self {
            MeasureId::Bcs => "BCS",
            MeasureId::Col => "COL",
            MeasureId::Cbp => "CBP",
            MeasureId::Hbd => "HBD",
            MeasureId::Ked => "KED",
            MeasureId::Eed => "EED",
            MeasureId::Supd => "SUPD",
            MeasureId::Omw => "OMW",
            MeasureId::Flu => "FLU",
            MeasureId::PdcDiabetes => "PDC-DM",
            MeasureId::PdcStatins => "PDC-STA",
            MeasureId::PdcRasa => "PDC-RASA",
        }
    }
}

/// Standard measures count once in the weighted rating; triple-weighted
/// measures count three times.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeasureWeight {
    Standard,
    Triple,
}

impl MeasureWeight {
    pub const fn factor(self) -> f64 {
        match self {
            MeasureWeight::Standard => 1.0,
            MeasureWeight::Triple => 3.0,
        }
    }
}

/// Annual dollar value attributed to closing one gap, as a range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueRange {
    pub min: f64,
    pub max: f64,
}

/// Positive eligibility criteria applied after the age/enrollment check.
#[derive(Debug, Clone, PartialEq)]
pub struct EligibilityRule {
    pub age_min: u32,
    pub age_max: u32,
    pub sex: Option<Sex>,
    pub min_enrollment_days: u32,
    pub required_diagnosis: Option<DiagnosisRequirement>,
    pub min_qualifying_fills: Option<FillRequirement>,
    pub required_encounter: Option<Concept>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiagnosisRequirement {
    pub concept: Concept,
    pub lookback_months: u32,
}

/// Minimum count of pharmacy fills for a medication class within the
/// measurement year.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FillRequirement {
    pub concept: Concept,
    pub min_count: usize,
}

/// An exclusion condition; `lookback_months: None` means any history.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExclusionRule {
    pub concept: Concept,
    pub lookback_months: Option<u32>,
}

/// One admissible way to satisfy an event-based numerator, with its own
/// lookback window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Modality {
    pub concept: Concept,
    pub lookback_months: u32,
}

/// The measure-specific compliance criterion. Measures are interpreted by
/// one generic evaluator; behavioral differences live entirely in these
/// variants, never in per-measure code paths.
#[derive(Debug, Clone, PartialEq)]
pub enum NumeratorRule {
    /// At least one qualifying event among the modalities; the first one
    /// found chronologically satisfies the numerator.
    QualifyingEvent { modalities: Vec<Modality> },
    /// Most recent lab result within the window must fall under the bound.
    ResultBelow {
        concept: Concept,
        lookback_months: u32,
        threshold: f64,
    },
    /// All listed results must be present within the window (e.g. kidney
    /// health needs both an eGFR and a uACR).
    AllResultsPresent {
        concepts: Vec<Concept>,
        lookback_months: u32,
    },
    /// Most recent systolic and diastolic readings in the measurement year
    /// both under their bounds.
    BloodPressureControl {
        systolic_under: f64,
        diastolic_under: f64,
    },
    /// Proportion of days covered by fills of the class must reach the
    /// threshold over the measurement year.
    DaysCovered { med_class: Concept, threshold: f64 },
}

/// Declarative description of one quality measure. The set of definitions
/// is fixed configuration, loaded and validated once.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasureDefinition {
    pub id: MeasureId,
    pub name: &'static str,
    pub weight: MeasureWeight,
    pub value_range: ValueRange,
    pub eligibility: EligibilityRule,
    pub exclusions: Vec<ExclusionRule>,
    pub numerator: NumeratorRule,
    pub intervention_cost: f64,
    pub closure_probability: f64,
    pub new_measure: bool,
    pub bundle: Option<BundleGroup>,
    pub recommended_action: &'static str,
}

/// Shared clinical resources that let interventions for several measures be
/// delivered together. Enumerated, not inferred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BundleGroup {
    LabDraw,
    PrimaryCareVisit,
    PharmacySync,
}

impl BundleGroup {
    pub const fn label(self) -> &'static str {
        match self {
            BundleGroup::LabDraw => "single lab draw",
            BundleGroup::PrimaryCareVisit => "single primary-care visit",
            BundleGroup::PharmacySync => "pharmacy synchronization",
        }
    }
}

/// A malformed definition is fatal at load: refusing to start beats
/// silently misclassifying a population.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("measure {id}: age_min {min} exceeds age_max {max}")]
    InvalidAgeBand { id: &'static str, min: u32, max: u32 },
    #[error("measure {id}: value range min {min} exceeds max {max}")]
    InvalidValueRange { id: &'static str, min: f64, max: f64 },
    #[error("measure {id}: closure probability {value} outside (0, 1]")]
    InvalidClosureProbability { id: &'static str, value: f64 },
    #[error("measure {id}: days-covered threshold {value} outside (0, 1]")]
    InvalidCoverageThreshold { id: &'static str, value: f64 },
    #[error("measure {id}: event numerator lists no modalities")]
    EmptyModalities { id: &'static str },
    #[error("measure {id}: negative intervention cost {value}")]
    NegativeCost { id: &'static str, value: f64 },
    #[error("duplicate measure definition for {id}")]
    DuplicateMeasure { id: &'static str },
}

/// Read-only measure portfolio, validated at construction.
#[derive(Debug, Clone)]
pub struct MeasureRegistry {
    definitions: Vec<MeasureDefinition>,
}

impl MeasureRegistry {
    /// The shipped twelve-measure catalog.
    pub fn standard() -> Result<Self, RegistryError> {
        Self::from_definitions(catalog::standard_catalog())
    }

    pub fn from_definitions(definitions: Vec<MeasureDefinition>) -> Result<Self, RegistryError> {
        for (position, definition) in definitions.iter().enumerate() {
            validate_definition(definition)?;
            if definitions[..position]
                .iter()
                .any(|earlier| earlier.id == definition.id)
            {
                return Err(RegistryError::DuplicateMeasure {
                    id: definition.id.code(),
                });
            }
        }
        Ok(Self { definitions })
    }

    pub fn definitions(&self) -> &[MeasureDefinition] {
        &self.definitions
    }

    pub fn get(&self, id: MeasureId) -> Option<&MeasureDefinition> {
        self.definitions.iter().find(|definition| definition.id == id)
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

fn validate_definition(definition: &MeasureDefinition) -> Result<(), RegistryError> {
    let id = definition.id.code();
    let eligibility = &definition.eligibility;

    if eligibility.age_min > eligibility.age_max {
        return Err(RegistryError::InvalidAgeBand {
            id,
            min: eligibility.age_min,
            max: eligibility.age_max,
        });
    }

    if definition.value_range.min > definition.value_range.max {
        return Err(RegistryError::InvalidValueRange {
            id,
            min: definition.value_range.min,
            max: definition.value_range.max,
        });
    }

    if !(definition.closure_probability > 0.0 && definition.closure_probability <= 1.0) {
        return Err(RegistryError::InvalidClosureProbability {
            id,
            value: definition.closure_probability,
        });
    }

    if definition.intervention_cost < 0.0 {
        return Err(RegistryError::NegativeCost {
            id,
            value: definition.intervention_cost,
        });
    }

    match &definition.numerator {
        NumeratorRule::QualifyingEvent { modalities } if modalities.is_empty() => {
            return Err(RegistryError::EmptyModalities { id });
        }
        NumeratorRule::DaysCovered { threshold, .. }
            if !(*threshold > 0.0 && *threshold <= 1.0) =>
        {
            return Err(RegistryError::InvalidCoverageThreshold {
                id,
                value: *threshold,
            });
        }
        _ => {}
    }

    Ok(())
}
