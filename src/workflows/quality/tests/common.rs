use chrono::NaiveDate;

use crate::workflows::quality::codes::CodeSetRegistry;
use crate::workflows::quality::domain::{
    ClinicalEvent, EventKind, MeasurementPeriod, MemberEventIndex, MemberId, MemberRecord, Sex,
};
use crate::workflows::quality::evaluation::MeasureEvaluator;
use crate::workflows::quality::measures::MeasureRegistry;

pub(super) fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

pub(super) fn period() -> MeasurementPeriod {
    MeasurementPeriod::new(2025)
}

pub(super) fn evaluator() -> MeasureEvaluator {
    MeasureEvaluator::new(period())
}

pub(super) fn registry() -> MeasureRegistry {
    MeasureRegistry::standard().expect("standard catalog loads")
}

pub(super) fn codes() -> CodeSetRegistry {
    CodeSetRegistry::standard()
}

pub(super) fn member(id: &str, sex: Sex, birth: Option<NaiveDate>) -> MemberRecord {
    MemberRecord {
        member_id: MemberId(id.to_string()),
        birth_date: birth,
        enrollment_days: 365,
        sex,
        race_ethnicity: Some("white".to_string()),
        language: Some("english".to_string()),
        sdoh_flags: Vec::new(),
    }
}

pub(super) fn claim(id: &str, code: &str, date: NaiveDate) -> ClinicalEvent {
    ClinicalEvent {
        member_id: MemberId(id.to_string()),
        kind: EventKind::Claim,
        code: code.to_string(),
        date,
        value: None,
        days_supply: None,
    }
}

pub(super) fn fill(id: &str, medication: &str, date: NaiveDate, days_supply: u32) -> ClinicalEvent {
    ClinicalEvent {
        member_id: MemberId(id.to_string()),
        kind: EventKind::PharmacyFill,
        code: medication.to_string(),
        date,
        value: None,
        days_supply: Some(days_supply),
    }
}

pub(super) fn lab(id: &str, loinc: &str, date: NaiveDate, value: Option<f64>) -> ClinicalEvent {
    ClinicalEvent {
        member_id: MemberId(id.to_string()),
        kind: EventKind::LabResult,
        code: loinc.to_string(),
        date,
        value,
        days_supply: None,
    }
}

pub(super) fn index_for(events: &[ClinicalEvent]) -> MemberEventIndex {
    MemberEventIndex::build(&codes(), events)
}

/// Twelve contiguous 30-day fills starting January 1.
pub(super) fn monthly_fills(id: &str, medication: &str) -> Vec<ClinicalEvent> {
    let mut events = Vec::new();
    let mut day = date(2025, 1, 1);
    for _ in 0..12 {
        events.push(fill(id, medication, day, 30));
        day = day
            .checked_add_days(chrono::Days::new(30))
            .expect("valid date");
    }
    events
}
