//! FHIR `Encounter` wire model and translation helpers.
//!
//! Only the elements used for ED-visit classification are modelled: `class`, `type`,
//! `period.start` and `reasonCode`. Both the R4 shape of `class` (a single `Coding`) and the R5
//! shape (an array of `CodeableConcept`) are accepted.

use crate::codeable::{CodeableConceptWire, CodingWire};
use crate::{check_resource_type, from_json_str, from_json_value, FhirResult};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Public domain-level types
// ============================================================================

/// Domain-level carrier for the parts of an encounter the risk engine reads.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncounterData {
    /// Logical id of the resource, when present.
    pub id: Option<String>,

    /// `class` codes (one for R4, possibly several for R5).
    pub class_codes: Vec<String>,

    /// `class` display strings.
    pub class_displays: Vec<String>,

    /// Every `type[].coding[].code` value.
    pub type_codes: Vec<String>,

    /// `period.start`, or `None` when absent or unparseable.
    pub period_start: Option<DateTime<Utc>>,

    /// `reasonCode[]` text, falling back to coding displays.
    pub reason_text: Vec<String>,
}

// ============================================================================
// Public Encounter operations
// ============================================================================

/// Encounter resource operations.
///
/// This is a zero-sized type used for namespacing encounter-related operations.
pub struct Encounter;

impl Encounter {
    /// Parse an encounter resource from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`crate::FhirError`] if:
    /// - the JSON does not match the wire schema (the message names the failing path),
    /// - `resourceType` is present and is not `"Encounter"`.
    pub fn parse(json_text: &str) -> FhirResult<EncounterData> {
        let wire: EncounterWire = from_json_str(json_text, "Encounter")?;
        wire_to_domain(wire)
    }

    /// Translate an already-parsed JSON value into an [`EncounterData`].
    ///
    /// # Errors
    ///
    /// Same conditions as [`Encounter::parse`].
    pub fn from_value(value: &serde_json::Value) -> FhirResult<EncounterData> {
        let wire: EncounterWire = from_json_value(value, "Encounter")?;
        wire_to_domain(wire)
    }
}

/// Parse a FHIR `dateTime`/`instant` into UTC.
///
/// Accepts RFC 3339 timestamps, zone-less `YYYY-MM-DDThh:mm[:ss]` (read as UTC), and the partial
/// forms `YYYY-MM-DD`, `YYYY-MM` and `YYYY` (read as the start of that period). Anything else is
/// `None`.
pub fn parse_fhir_datetime(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(naive.and_utc());
        }
    }

    let date = match text.len() {
        10 => NaiveDate::parse_from_str(text, "%Y-%m-%d").ok(),
        7 => NaiveDate::parse_from_str(&format!("{text}-01"), "%Y-%m-%d").ok(),
        4 => NaiveDate::parse_from_str(&format!("{text}-01-01"), "%Y-%m-%d").ok(),
        _ => None,
    }?;

    date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc())
}

// ============================================================================
// Wire types (internal)
// ============================================================================

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
struct EncounterWire {
    #[serde(rename = "resourceType", skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub class: Option<EncounterClassWire>,

    #[serde(
        rename = "type",
        default,
        deserialize_with = "crate::vec_or_null",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub type_: Vec<CodeableConceptWire>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub period: Option<PeriodWire>,

    #[serde(
        rename = "reasonCode",
        default,
        deserialize_with = "crate::vec_or_null",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub reason_code: Vec<CodeableConceptWire>,
}

/// `Encounter.class`: a `Coding` in R4, `CodeableConcept[]` in R5.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(untagged)]
enum EncounterClassWire {
    Coding(CodingWire),
    Concepts(Vec<CodeableConceptWire>),
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
struct PeriodWire {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
}

// ============================================================================
// Helper functions (internal)
// ============================================================================

fn wire_to_domain(wire: EncounterWire) -> FhirResult<EncounterData> {
    check_resource_type(wire.resource_type.as_deref(), "Encounter")?;

    let class_codings: Vec<CodingWire> = match wire.class {
        Some(EncounterClassWire::Coding(coding)) => vec![coding],
        Some(EncounterClassWire::Concepts(concepts)) => {
            concepts.into_iter().flat_map(|c| c.coding).collect()
        }
        None => Vec::new(),
    };

    let non_blank = |s: Option<String>| s.filter(|v| !v.trim().is_empty());

    let class_codes = class_codings
        .iter()
        .filter_map(|c| non_blank(c.code.clone()))
        .collect();
    let class_displays = class_codings
        .into_iter()
        .filter_map(|c| non_blank(c.display))
        .collect();

    let type_codes = wire
        .type_
        .iter()
        .flat_map(|t| t.codes())
        .map(str::to_string)
        .collect();

    let period_start = wire
        .period
        .and_then(|p| p.start)
        .as_deref()
        .and_then(parse_fhir_datetime);

    let reason_text = wire
        .reason_code
        .iter()
        .filter_map(|r| r.label())
        .map(|l| l.into_string())
        .collect();

    Ok(EncounterData {
        id: wire.id,
        class_codes,
        class_displays,
        type_codes,
        period_start,
        reason_text,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FhirError;
    use chrono::TimeZone;

    #[test]
    fn parses_r4_encounter() {
        let input = r#"{
  "resourceType": "Encounter",
  "id": "enc-1",
  "status": "finished",
  "class": {"system": "http://terminology.hl7.org/CodeSystem/v3-ActCode", "code": "EMER", "display": "emergency"},
  "type": [{"coding": [{"code": "50849002", "display": "Emergency room admission"}]}],
  "period": {"start": "2026-03-01T10:15:00Z", "end": "2026-03-01T14:00:00Z"},
  "reasonCode": [{"text": "Chest pain"}]
}"#;

        let data = Encounter::parse(input).expect("parse encounter");
        assert_eq!(data.id.as_deref(), Some("enc-1"));
        assert_eq!(data.class_codes, vec!["EMER"]);
        assert_eq!(data.class_displays, vec!["emergency"]);
        assert_eq!(data.type_codes, vec!["50849002"]);
        assert_eq!(
            data.period_start,
            Some(Utc.with_ymd_and_hms(2026, 3, 1, 10, 15, 0).unwrap())
        );
        assert_eq!(data.reason_text, vec!["Chest pain"]);
    }

    #[test]
    fn parses_r5_class_array() {
        let input = r#"{"resourceType":"Encounter","class":[{"coding":[{"code":"AMB"}]},{"coding":[{"code":"EMER"}]}]}"#;
        let data = Encounter::parse(input).expect("parse encounter");
        assert_eq!(data.class_codes, vec!["AMB", "EMER"]);
    }

    #[test]
    fn unparseable_start_becomes_none() {
        let input = r#"{"resourceType":"Encounter","period":{"start":"last tuesday"}}"#;
        let data = Encounter::parse(input).expect("parse encounter");
        assert!(data.period_start.is_none());
    }

    #[test]
    fn minimal_encounter_has_no_signal() {
        let data = Encounter::parse("{}").expect("parse empty encounter");
        assert_eq!(data, EncounterData::default());
    }

    #[test]
    fn rejects_other_resource_type() {
        let err = Encounter::parse(r#"{"resourceType":"Condition"}"#).expect_err("wrong type");
        match err {
            FhirError::InvalidInput(msg) => {
                assert!(msg.contains("Encounter"));
                assert!(msg.contains("Condition"));
            }
            other => panic!("expected InvalidInput error, got {other:?}"),
        }
    }

    #[test]
    fn wrong_type_reports_path() {
        let err = Encounter::parse(r#"{"type":[{"coding":"EMER"}]}"#).expect_err("wrong shape");
        match err {
            FhirError::Translation(msg) => assert!(msg.contains("type"), "{msg}"),
            other => panic!("expected Translation error, got {other:?}"),
        }
    }

    #[test]
    fn parses_partial_dates() {
        let midnight = |y, m, d| Some(Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap());
        assert_eq!(parse_fhir_datetime("2025-07-04"), midnight(2025, 7, 4));
        assert_eq!(parse_fhir_datetime("2025-07"), midnight(2025, 7, 1));
        assert_eq!(parse_fhir_datetime("2025"), midnight(2025, 1, 1));
        assert_eq!(
            parse_fhir_datetime("2025-07-04T09:30:00"),
            Some(Utc.with_ymd_and_hms(2025, 7, 4, 9, 30, 0).unwrap())
        );
        assert_eq!(
            parse_fhir_datetime("2025-07-04T09:30:00+02:00"),
            Some(Utc.with_ymd_and_hms(2025, 7, 4, 7, 30, 0).unwrap())
        );
        assert!(parse_fhir_datetime("").is_none());
        assert!(parse_fhir_datetime("2025-13-01").is_none());
    }
}
