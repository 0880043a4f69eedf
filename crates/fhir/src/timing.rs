//! FHIR `Timing` wire model and translation helpers.
//!
//! `Timing` appears inside `Dosage.timing`. The schedule resolver reads `repeat.when`,
//! `repeat.timeOfDay`, `repeat.frequency`/`period`/`periodUnit`, and the coded shorthand in
//! `code.coding[].code` (for example `BID`).

use crate::codeable::CodeableConceptWire;
use crate::{from_json_str, from_json_value, FhirResult};
use serde::{Deserialize, Serialize};

/// Domain-level carrier for a dosing `Timing`.
///
/// Values are passed through as written; interpretation belongs to the schedule resolver.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TimingData {
    /// `repeat.when` day-period codes (for example `MORN`, `HS`, `AC`).
    pub when: Vec<String>,

    /// `repeat.timeOfDay` entries (`hh:mm:ss`).
    pub time_of_day: Vec<String>,

    /// `repeat.frequency`.
    pub frequency: Option<u32>,

    /// `repeat.period`.
    pub period: Option<f64>,

    /// `repeat.periodUnit` (`s`, `min`, `h`, `d`, `wk`, `mo`, `a`).
    pub period_unit: Option<String>,

    /// `code.coding[].code` values (for example `BID`, `QHS`).
    pub codes: Vec<String>,
}

impl TimingData {
    /// True when no element that could yield a schedule is present.
    pub fn is_empty(&self) -> bool {
        self.when.is_empty()
            && self.time_of_day.is_empty()
            && self.frequency.is_none()
            && self.codes.is_empty()
    }
}

/// Timing datatype operations.
pub struct Timing;

impl Timing {
    /// Parse a `Timing` datatype from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`crate::FhirError::Translation`] if the JSON does not match the wire schema.
    pub fn parse(json_text: &str) -> FhirResult<TimingData> {
        let wire: TimingWire = from_json_str(json_text, "Timing")?;
        Ok(wire.into())
    }

    /// Translate an already-parsed JSON value into a [`TimingData`].
    ///
    /// # Errors
    ///
    /// Same conditions as [`Timing::parse`].
    pub fn from_value(value: &serde_json::Value) -> FhirResult<TimingData> {
        let wire: TimingWire = from_json_value(value, "Timing")?;
        Ok(wire.into())
    }
}

// ============================================================================
// Wire types (crate-internal: also embedded in Dosage)
// ============================================================================

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub(crate) struct TimingWire {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repeat: Option<TimingRepeatWire>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<CodeableConceptWire>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub(crate) struct TimingRepeatWire {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequency: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub period: Option<f64>,

    #[serde(rename = "periodUnit", skip_serializing_if = "Option::is_none")]
    pub period_unit: Option<String>,

    #[serde(
        rename = "timeOfDay",
        default,
        deserialize_with = "crate::vec_or_null",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub time_of_day: Vec<String>,

    #[serde(
        default,
        deserialize_with = "crate::vec_or_null",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub when: Vec<String>,
}

impl From<TimingWire> for TimingData {
    fn from(wire: TimingWire) -> Self {
        let codes: Vec<String> = wire
            .code
            .as_ref()
            .map(|c| c.codes().map(str::to_string).collect())
            .unwrap_or_default();
        let repeat = wire.repeat.unwrap_or_default();

        TimingData {
            when: repeat.when,
            time_of_day: repeat.time_of_day,
            frequency: repeat.frequency,
            period: repeat.period,
            period_unit: repeat.period_unit,
            codes,
        }
    }
}
