use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Deserializer};
use std::io::Read;

use super::normalizer::normalize_field;
use crate::workflows::quality::domain::{
    ClinicalEvent, EventKind, MemberId, MemberRecord, Sex,
};

pub(crate) fn parse_members<R: Read>(reader: R) -> Result<Vec<MemberRecord>, csv::Error> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut members = Vec::new();

    for record in csv_reader.deserialize::<MemberRow>() {
        let row = record?;
        members.push(row.into_member());
    }

    Ok(members)
}

pub(crate) fn parse_claims<R: Read>(reader: R) -> Result<Vec<ClinicalEvent>, csv::Error> {
    parse_events::<ClaimRow, R>(reader)
}

pub(crate) fn parse_pharmacy<R: Read>(reader: R) -> Result<Vec<ClinicalEvent>, csv::Error> {
    parse_events::<PharmacyRow, R>(reader)
}

pub(crate) fn parse_labs<R: Read>(reader: R) -> Result<Vec<ClinicalEvent>, csv::Error> {
    parse_events::<LabRow, R>(reader)
}

fn parse_events<Row, R>(reader: R) -> Result<Vec<ClinicalEvent>, csv::Error>
where
    Row: EventRow + for<'de> Deserialize<'de>,
    R: Read,
{
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut events = Vec::new();

    for record in csv_reader.deserialize::<Row>() {
        let row = record?;
        if let Some(event) = row.into_event() {
            events.push(event);
        }
    }

    Ok(events)
}

trait EventRow {
    /// `None` when the row carries no usable service date; such rows are
    /// skipped rather than failing the import.
    fn into_event(self) -> Option<ClinicalEvent>;
}

#[derive(Debug, Deserialize)]
struct MemberRow {
    #[serde(rename = "Member ID")]
    member_id: String,
    #[serde(rename = "Birth Date", default, deserialize_with = "empty_string_as_none")]
    birth_date: Option<String>,
    #[serde(rename = "Enrollment Days", default)]
    enrollment_days: Option<u32>,
    #[serde(rename = "Sex", default, deserialize_with = "empty_string_as_none")]
    sex: Option<String>,
    #[serde(
        rename = "Race/Ethnicity",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    race_ethnicity: Option<String>,
    #[serde(rename = "Language", default, deserialize_with = "empty_string_as_none")]
    language: Option<String>,
    #[serde(
        rename = "SDOH Flags",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    sdoh_flags: Option<String>,
}

impl MemberRow {
    fn into_member(self) -> MemberRecord {
        let sex = match self.sex.as_deref().map(str::trim) {
            Some(value) if value.eq_ignore_ascii_case("f") || value.eq_ignore_ascii_case("female") => {
                Sex::Female
            }
            Some(value) if value.eq_ignore_ascii_case("m") || value.eq_ignore_ascii_case("male") => {
                Sex::Male
            }
            _ => Sex::Unknown,
        };

        // Pipe-separated flags, e.g. "housing|transportation".
        let sdoh_flags = self
            .sdoh_flags
            .as_deref()
            .map(|raw| {
                raw.split('|')
                    .map(normalize_field)
                    .filter(|flag| !flag.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        MemberRecord {
            member_id: MemberId(normalize_field(&self.member_id)),
            birth_date: self.birth_date.as_deref().and_then(parse_date),
            enrollment_days: self.enrollment_days.unwrap_or(0),
            sex,
            race_ethnicity: self.race_ethnicity.map(|value| normalize_field(&value)),
            language: self.language.map(|value| normalize_field(&value)),
            sdoh_flags,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ClaimRow {
    #[serde(rename = "Member ID")]
    member_id: String,
    #[serde(rename = "Code")]
    code: String,
    #[serde(rename = "Service Date", default, deserialize_with = "empty_string_as_none")]
    service_date: Option<String>,
}

impl EventRow for ClaimRow {
    fn into_event(self) -> Option<ClinicalEvent> {
        let date = self.service_date.as_deref().and_then(parse_date)?;
        Some(ClinicalEvent {
            member_id: MemberId(normalize_field(&self.member_id)),
            kind: EventKind::Claim,
            code: normalize_field(&self.code),
            date,
            value: None,
            days_supply: None,
        })
    }
}

#[derive(Debug, Deserialize)]
struct PharmacyRow {
    #[serde(rename = "Member ID")]
    member_id: String,
    #[serde(rename = "Medication")]
    medication: String,
    #[serde(rename = "Fill Date", default, deserialize_with = "empty_string_as_none")]
    fill_date: Option<String>,
    #[serde(rename = "Days Supply", default)]
    days_supply: Option<u32>,
}

impl EventRow for PharmacyRow {
    fn into_event(self) -> Option<ClinicalEvent> {
        let date = self.fill_date.as_deref().and_then(parse_date)?;
        Some(ClinicalEvent {
            member_id: MemberId(normalize_field(&self.member_id)),
            kind: EventKind::PharmacyFill,
            code: normalize_field(&self.medication),
            date,
            value: None,
            days_supply: self.days_supply,
        })
    }
}

#[derive(Debug, Deserialize)]
struct LabRow {
    #[serde(rename = "Member ID")]
    member_id: String,
    #[serde(rename = "LOINC")]
    loinc: String,
    #[serde(rename = "Test Date", default, deserialize_with = "empty_string_as_none")]
    test_date: Option<String>,
    #[serde(rename = "Result Value", default)]
    result_value: Option<f64>,
}

impl EventRow for LabRow {
    fn into_event(self) -> Option<ClinicalEvent> {
        let date = self.test_date.as_deref().and_then(parse_date)?;
        Some(ClinicalEvent {
            member_id: MemberId(normalize_field(&self.member_id)),
            kind: EventKind::LabResult,
            code: normalize_field(&self.loinc),
            date,
            value: self.result_value,
            days_supply: None,
        })
    }
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}

/// Extracts carry either plain dates or RFC 3339 timestamps.
fn parse_date(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.naive_utc().date());
    }

    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d").ok()
}

#[cfg(test)]
pub(crate) fn parse_date_for_tests(value: &str) -> Option<NaiveDate> {
    parse_date(value)
}
