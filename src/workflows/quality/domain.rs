use std::collections::BTreeMap;

use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use super::codes::{CodeSetRegistry, Concept};

/// Opaque member identifier. Raw PII never appears in engine outputs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MemberId(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sex {
    Female,
    Male,
    Unknown,
}

/// Demographic snapshot for one member, immutable for a measurement year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberRecord {
    pub member_id: MemberId,
    pub birth_date: Option<NaiveDate>,
    pub enrollment_days: u32,
    pub sex: Sex,
    pub race_ethnicity: Option<String>,
    pub language: Option<String>,
    pub sdoh_flags: Vec<String>,
}

impl MemberRecord {
    /// Age as of December 31 of the measurement year, or `None` when the
    /// birth date is missing.
    pub fn age_at(&self, year_end: NaiveDate) -> Option<u32> {
        let birth = self.birth_date?;
        let mut age = year_end.year() - birth.year();
        if (year_end.month(), year_end.day()) < (birth.month(), birth.day()) {
            age -= 1;
        }
        u32::try_from(age).ok()
    }

    /// The member's bucket for a stratification variable, if recorded.
    pub fn stratum(&self, variable: StratificationVariable) -> Option<String> {
        match variable {
            StratificationVariable::RaceEthnicity => self.race_ethnicity.clone(),
            StratificationVariable::Language => self.language.clone(),
            StratificationVariable::SdohRisk => Some(if self.sdoh_flags.is_empty() {
                "no recorded risk".to_string()
            } else {
                "sdoh risk present".to_string()
            }),
        }
    }
}

/// Demographic/SDOH axes the equity calculator stratifies over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StratificationVariable {
    RaceEthnicity,
    Language,
    SdohRisk,
}

impl StratificationVariable {
    pub const fn label(self) -> &'static str {
        match self {
            Self::RaceEthnicity => "race/ethnicity",
            Self::Language => "preferred language",
            Self::SdohRisk => "SDOH risk",
        }
    }

    pub const fn all() -> [StratificationVariable; 3] {
        [Self::RaceEthnicity, Self::Language, Self::SdohRisk]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Claim,
    PharmacyFill,
    LabResult,
}

/// One claim line, pharmacy fill, or lab result. Append-only per year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClinicalEvent {
    pub member_id: MemberId,
    pub kind: EventKind,
    pub code: String,
    pub date: NaiveDate,
    pub value: Option<f64>,
    pub days_supply: Option<u32>,
}

/// Inclusive date window used for lookbacks and the measurement year.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}

/// The measurement year all windows anchor to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeasurementPeriod {
    pub year: i32,
}

impl MeasurementPeriod {
    pub fn new(year: i32) -> Self {
        Self { year }
    }

    pub fn start(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, 1, 1).expect("January 1 exists for every year")
    }

    pub fn end(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, 12, 31).expect("December 31 exists for every year")
    }

    pub fn window(&self) -> DateWindow {
        DateWindow {
            start: self.start(),
            end: self.end(),
        }
    }

    pub fn days(&self) -> i64 {
        (self.end() - self.start()).num_days() + 1
    }

    /// Window ending December 31 and reaching back the given number of
    /// months (27-month mammogram lookback, 120-month colonoscopy, ...).
    pub fn lookback_months(&self, months: u32) -> DateWindow {
        let end = self.end();
        let start = end
            .checked_sub_months(Months::new(months))
            .unwrap_or(NaiveDate::MIN);
        DateWindow { start, end }
    }
}

/// One event after code resolution, carried inside the per-member index.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedEvent {
    pub concept: Concept,
    pub kind: EventKind,
    pub date: NaiveDate,
    pub value: Option<f64>,
    pub days_supply: Option<u32>,
}

/// Per-member event index grouped by concept, date ascending. Built once
/// before evaluation so no measure rescans the raw event table.
#[derive(Debug, Clone, Default)]
pub struct MemberEventIndex {
    by_concept: BTreeMap<Concept, Vec<ResolvedEvent>>,
}

impl MemberEventIndex {
    pub fn build<'a, I>(registry: &CodeSetRegistry, events: I) -> Self
    where
        I: IntoIterator<Item = &'a ClinicalEvent>,
    {
        let mut by_concept: BTreeMap<Concept, Vec<ResolvedEvent>> = BTreeMap::new();
        for event in events {
            let Some(concept) = registry.resolve(&event.code) else {
                continue;
            };
            by_concept.entry(concept).or_default().push(ResolvedEvent {
                concept,
                kind: event.kind,
                date: event.date,
                value: event.value,
                days_supply: event.days_supply,
            });
        }

        for events in by_concept.values_mut() {
            events.sort_by_key(|event| event.date);
        }

        Self { by_concept }
    }

    pub fn events_for(&self, concept: Concept) -> &[ResolvedEvent] {
        self.by_concept
            .get(&concept)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn first_within(&self, concept: Concept, window: DateWindow) -> Option<&ResolvedEvent> {
        self.events_for(concept)
            .iter()
            .find(|event| window.contains(event.date))
    }

    pub fn latest_within(&self, concept: Concept, window: DateWindow) -> Option<&ResolvedEvent> {
        self.events_for(concept)
            .iter()
            .rev()
            .find(|event| window.contains(event.date))
    }

    pub fn count_within(&self, concept: Concept, window: DateWindow) -> usize {
        self.events_for(concept)
            .iter()
            .filter(|event| window.contains(event.date))
            .count()
    }

    pub fn any_within(&self, concept: Concept, window: DateWindow) -> bool {
        self.first_within(concept, window).is_some()
    }

    /// `(fill_date, days_supply)` pairs for a medication class within the
    /// window, defaulting absent day counts to zero.
    pub fn fills_within(&self, concept: Concept, window: DateWindow) -> Vec<(NaiveDate, u32)> {
        self.events_for(concept)
            .iter()
            .filter(|event| event.kind == EventKind::PharmacyFill && window.contains(event.date))
            .map(|event| (event.date, event.days_supply.unwrap_or(0)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member(birth: Option<NaiveDate>) -> MemberRecord {
        MemberRecord {
            member_id: MemberId("m-1".to_string()),
            birth_date: birth,
            enrollment_days: 365,
            sex: Sex::Female,
            race_ethnicity: Some("hispanic".to_string()),
            language: None,
            sdoh_flags: vec!["housing".to_string()],
        }
    }

    #[test]
    fn age_counts_birthday_not_yet_reached() {
        let year_end = NaiveDate::from_ymd_opt(2025, 12, 31).unwrap();
        let born_jan = member(NaiveDate::from_ymd_opt(1960, 1, 15));
        assert_eq!(born_jan.age_at(year_end), Some(65));

        // A December 31 birthday lands exactly on year end.
        let born_dec31 = member(NaiveDate::from_ymd_opt(1960, 12, 31));
        assert_eq!(born_dec31.age_at(year_end), Some(65));
    }

    #[test]
    fn age_is_none_without_birth_date() {
        let year_end = NaiveDate::from_ymd_opt(2025, 12, 31).unwrap();
        assert_eq!(member(None).age_at(year_end), None);
    }

    #[test]
    fn stratum_reports_sdoh_presence() {
        let record = member(NaiveDate::from_ymd_opt(1970, 6, 1));
        assert_eq!(
            record.stratum(StratificationVariable::SdohRisk).as_deref(),
            Some("sdoh risk present")
        );
        assert_eq!(record.stratum(StratificationVariable::Language), None);
    }

    #[test]
    fn lookback_window_reaches_into_prior_years() {
        let period = MeasurementPeriod::new(2025);
        let window = period.lookback_months(27);
        assert_eq!(window.end, NaiveDate::from_ymd_opt(2025, 12, 31).unwrap());
        assert_eq!(window.start, NaiveDate::from_ymd_opt(2023, 9, 30).unwrap());
    }

    #[test]
    fn index_sorts_events_and_drops_unknown_codes() {
        let registry = CodeSetRegistry::standard();
        let member_id = MemberId("m-1".to_string());
        let events = vec![
            ClinicalEvent {
                member_id: member_id.clone(),
                kind: EventKind::LabResult,
                code: "4548-4".to_string(),
                date: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
                value: Some(7.2),
                days_supply: None,
            },
            ClinicalEvent {
                member_id: member_id.clone(),
                kind: EventKind::LabResult,
                code: "4548-4".to_string(),
                date: NaiveDate::from_ymd_opt(2025, 2, 1).unwrap(),
                value: Some(8.9),
                days_supply: None,
            },
            ClinicalEvent {
                member_id,
                kind: EventKind::Claim,
                code: "not-a-code".to_string(),
                date: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
                value: None,
                days_supply: None,
            },
        ];

        let index = MemberEventIndex::build(&registry, &events);
        let a1c = index.events_for(Concept::HbA1cLab);
        assert_eq!(a1c.len(), 2);
        assert!(a1c[0].date < a1c[1].date);
        assert!(index.events_for(Concept::OfficeVisit).is_empty());
    }
}
