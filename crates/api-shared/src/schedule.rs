//! Dosage schedule request/response types.

use carewatch_core::{
    format_for_display, is_complex_schedule, ClockTime, CoreError, CoreResult, MedicationData,
    ScheduleResolution,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Parse `"HH:MM"` strings into clock times.
///
/// # Errors
///
/// Returns [`carewatch_core::CoreError::ClockTime`] for the first malformed entry.
pub fn parse_schedule(times: &[String]) -> CoreResult<Vec<ClockTime>> {
    times
        .iter()
        .map(|t| t.trim().parse::<ClockTime>().map_err(CoreError::from))
        .collect()
}

fn render(times: &[ClockTime]) -> Vec<String> {
    times.iter().map(ToString::to_string).collect()
}

fn display(times: &[ClockTime]) -> Vec<String> {
    times.iter().copied().map(format_for_display).collect()
}

/// Free-text dosage instruction.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ScheduleTextReq {
    pub text: String,
}

/// Schedule resolved from free text.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleTextRes {
    /// `FIXED`, `PRN` or `UNRECOGNIZED`.
    pub kind: String,
    pub times: Vec<String>,
    pub display: Vec<String>,

    /// Name of the matching rule, if any.
    pub rule: Option<String>,
}

impl From<ScheduleResolution> for ScheduleTextRes {
    fn from(resolution: ScheduleResolution) -> Self {
        let kind = match resolution.kind {
            carewatch_core::ScheduleKind::Fixed => "FIXED",
            carewatch_core::ScheduleKind::Prn => "PRN",
            carewatch_core::ScheduleKind::Unrecognized => "UNRECOGNIZED",
        };
        Self {
            kind: kind.into(),
            times: render(&resolution.times),
            display: display(&resolution.times),
            rule: resolution.rule.map(str::to_string),
        }
    }
}

/// Schedule resolved from a structured FHIR `Timing`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ScheduleTimingRes {
    pub times: Vec<String>,
    pub display: Vec<String>,
}

impl From<&[ClockTime]> for ScheduleTimingRes {
    fn from(times: &[ClockTime]) -> Self {
        Self {
            times: render(times),
            display: display(times),
        }
    }
}

/// Combined schedule of a `MedicationRequest`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct MedicationScheduleRes {
    pub name: Option<String>,
    pub times: Vec<String>,
    pub display: Vec<String>,
    pub complex: bool,
}

impl MedicationScheduleRes {
    pub fn new(medication: &MedicationData, times: &[ClockTime]) -> Self {
        Self {
            name: medication.primary_name().map(ToString::to_string),
            times: render(times),
            display: display(times),
            complex: is_complex_schedule(times),
        }
    }
}

/// A schedule to assess for complexity.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ComplexityReq {
    /// `"HH:MM"` entries.
    pub schedule: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ComplexityRes {
    pub complex: bool,
    pub doses: usize,
}
