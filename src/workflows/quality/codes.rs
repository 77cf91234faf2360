use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Clinical concepts the engine reasons about. Every diagnosis, procedure,
/// lab, and medication code the measures care about maps to exactly one of
/// these; codes outside the table never participate in evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Concept {
    // Qualifying diagnoses
    Diabetes,
    Hypertension,
    FragilityFracture,
    // Exclusion conditions
    Hospice,
    Esrd,
    KidneyTransplant,
    BilateralMastectomy,
    TotalColectomy,
    Pregnancy,
    AdvancedIllness,
    // Screenings, labs, and procedures
    Mammogram,
    Colonoscopy,
    FitTest,
    HbA1cLab,
    EgfrLab,
    UacrLab,
    RetinalExam,
    SystolicReading,
    DiastolicReading,
    BoneDensityTest,
    FluVaccine,
    OfficeVisit,
    // Medication classes (pharmacy fills)
    OralDiabetesMed,
    Statin,
    RasAntagonist,
    OsteoporosisTherapy,
}

impl Concept {
    pub const fn label(self) -> &'static str {
        match self {
            Concept::Diabetes => "diabetes",
            Concept::Hypertension => "hypertension",
            Concept::FragilityFracture => "fragility fracture",
            Concept::Hospice => "hospice care",
            Concept::Esrd => "end-stage renal disease",
            Concept::KidneyTransplant => "kidney transplant",
            Concept::BilateralMastectomy => "bilateral mastectomy",
            Concept::TotalColectomy => "total colectomy",
            Concept::Pregnancy => "pregnancy",
            Concept::AdvancedIllness => "advanced illness",
            Concept::Mammogram => "mammogram",
            Concept::Colonoscopy => "colonoscopy",
            Concept::FitTest => "FIT test",
            Concept::HbA1cLab => "HbA1c result",
            Concept::EgfrLab => "eGFR result",
            Concept::UacrLab => "uACR result",
            Concept::RetinalExam => "retinal exam",
            Concept::SystolicReading => "systolic reading",
            Concept::DiastolicReading => "diastolic reading",
            Concept::BoneDensityTest => "bone density test",
            Concept::FluVaccine => "influenza vaccination",
            Concept::OfficeVisit => "office visit",
            Concept::OralDiabetesMed => "oral diabetes medication",
            Concept::Statin => "statin",
            Concept::RasAntagonist => "RAS antagonist",
            Concept::OsteoporosisTherapy => "osteoporosis therapy",
        }
    }
}

/// Normalize a raw code or medication name for table lookup: strip BOM,
/// trim, lowercase, and collapse internal whitespace. Mirrors how codes
/// arrive from claims extracts with inconsistent casing and padding.
pub(crate) fn normalize_code(raw: &str) -> String {
    raw.trim_start_matches('\u{feff}')
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_ascii_lowercase()
}

/// Static code/name -> concept lookup built once at load. Matching is exact
/// on the normalized token; there is no substring scanning at evaluation
/// time.
#[derive(Debug, Clone)]
pub struct CodeSetRegistry {
    by_code: HashMap<String, Concept>,
}

impl CodeSetRegistry {
    /// The standard table covering the shipped measure catalog: ICD-10
    /// diagnoses, CPT/HCPCS procedures, LOINC labs, and medication names.
    pub fn standard() -> Self {
        let mut registry = Self {
            by_code: HashMap::new(),
        };

        registry.insert_all(
            Concept::Diabetes,
            &["E10.9", "E11.9", "E11.65", "E11.8", "E13.9"],
        );
        registry.insert_all(Concept::Hypertension, &["I10", "I11.9", "I12.9"]);
        registry.insert_all(
            Concept::FragilityFracture,
            &["M80.08XA", "S22.000A", "S52.501A", "S72.001A"],
        );

        registry.insert_all(Concept::Hospice, &["Z51.5", "G9473"]);
        registry.insert_all(Concept::Esrd, &["N18.6", "Z99.2"]);
        registry.insert_all(Concept::KidneyTransplant, &["Z94.0"]);
        registry.insert_all(Concept::BilateralMastectomy, &["Z90.13"]);
        registry.insert_all(Concept::TotalColectomy, &["Z90.49", "0DTE0ZZ"]);
        registry.insert_all(Concept::Pregnancy, &["Z33.1", "O09.90"]);
        registry.insert_all(Concept::AdvancedIllness, &["G30.9", "K72.90"]);

        registry.insert_all(Concept::Mammogram, &["77065", "77066", "77067"]);
        registry.insert_all(Concept::Colonoscopy, &["44388", "45378", "45380"]);
        registry.insert_all(Concept::FitTest, &["82274", "G0328"]);
        registry.insert_all(Concept::HbA1cLab, &["83036", "4548-4", "17856-6"]);
        registry.insert_all(Concept::EgfrLab, &["33914-3", "48642-3"]);
        registry.insert_all(Concept::UacrLab, &["9318-7", "14959-1"]);
        registry.insert_all(Concept::RetinalExam, &["92227", "92228", "92250", "2022F"]);
        registry.insert_all(Concept::SystolicReading, &["8480-6"]);
        registry.insert_all(Concept::DiastolicReading, &["8462-4"]);
        registry.insert_all(Concept::BoneDensityTest, &["77080", "77081"]);
        registry.insert_all(Concept::FluVaccine, &["90686", "90688", "G0008"]);
        registry.insert_all(Concept::OfficeVisit, &["99213", "99214", "99395", "99396"]);

        registry.insert_all(
            Concept::OralDiabetesMed,
            &[
                "metformin",
                "glipizide",
                "glimepiride",
                "sitagliptin",
                "empagliflozin",
                "pioglitazone",
            ],
        );
        registry.insert_all(
            Concept::Statin,
            &[
                "atorvastatin",
                "simvastatin",
                "rosuvastatin",
                "pravastatin",
                "lovastatin",
            ],
        );
        registry.insert_all(
            Concept::RasAntagonist,
            &[
                "lisinopril",
                "enalapril",
                "benazepril",
                "losartan",
                "valsartan",
                "olmesartan",
            ],
        );
        registry.insert_all(
            Concept::OsteoporosisTherapy,
            &[
                "alendronate",
                "risedronate",
                "ibandronate",
                "zoledronic acid",
                "denosumab",
            ],
        );

        registry
    }

    fn insert_all(&mut self, concept: Concept, codes: &[&str]) {
        for code in codes {
            self.by_code.insert(normalize_code(code), concept);
        }
    }

    /// Resolve a raw code or medication name. Unknown codes return `None`
    /// and simply never contribute to any population.
    pub fn resolve(&self, raw: &str) -> Option<Concept> {
        self.by_code.get(&normalize_code(raw)).copied()
    }

    pub fn len(&self) -> usize {
        self.by_code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_code.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_codes_case_insensitively() {
        let registry = CodeSetRegistry::standard();
        assert_eq!(registry.resolve("e11.9"), Some(Concept::Diabetes));
        assert_eq!(registry.resolve("  Z51.5 "), Some(Concept::Hospice));
        assert_eq!(registry.resolve("ATORVASTATIN"), Some(Concept::Statin));
    }

    #[test]
    fn resolves_multi_token_medication_names() {
        let registry = CodeSetRegistry::standard();
        assert_eq!(
            registry.resolve("Zoledronic  Acid"),
            Some(Concept::OsteoporosisTherapy)
        );
    }

    #[test]
    fn unknown_codes_resolve_to_none() {
        let registry = CodeSetRegistry::standard();
        assert_eq!(registry.resolve("X99.99"), None);
        assert_eq!(registry.resolve(""), None);
    }

    #[test]
    fn normalize_strips_bom_and_collapses_whitespace() {
        assert_eq!(normalize_code("\u{feff} Zoledronic   Acid "), "zoledronic acid");
    }
}
