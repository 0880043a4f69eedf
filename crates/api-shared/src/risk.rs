//! Risk summary request/response types.

use carewatch_core::{ClinicalHistory, CoreResult, RiskSummary};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

/// Patient history to summarise.
///
/// Either a FHIR searchset `bundle`, separate resource arrays, or both (they are merged).
/// Missing `referenceTime` means "now" as seen by the front end.
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RiskSummaryReq {
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub bundle: Option<Value>,

    #[serde(default)]
    #[schema(value_type = Option<Vec<Object>>)]
    pub encounters: Option<Value>,

    #[serde(default)]
    #[schema(value_type = Option<Vec<Object>>)]
    pub conditions: Option<Value>,

    #[serde(default)]
    #[schema(value_type = Option<Vec<Object>>)]
    pub medications: Option<Value>,

    #[serde(default)]
    pub reference_time: Option<DateTime<Utc>>,
}

impl RiskSummaryReq {
    /// Build the clinical history described by this request.
    ///
    /// Individual resources that fail to translate are counted in
    /// [`ClinicalHistory::skipped_entries`]; only a malformed bundle is an error.
    pub fn history(&self) -> CoreResult<ClinicalHistory> {
        let mut history = match &self.bundle {
            Some(bundle) => fhir::Bundle::from_value(bundle)?,
            None => ClinicalHistory::default(),
        };

        let null = Value::Null;
        history.extend(ClinicalHistory::from_values(
            self.encounters.as_ref().unwrap_or(&null),
            self.conditions.as_ref().unwrap_or(&null),
            self.medications.as_ref().unwrap_or(&null),
        ));
        Ok(history)
    }
}

/// A patient's ED-utilisation risk summary.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RiskSummaryRes {
    pub ed_visit_count_12_months: u32,
    pub ed_visit_count_24_months: u32,

    /// `LOW`, `MEDIUM` or `HIGH`.
    pub risk_tier: String,

    pub chronic_conditions: Vec<String>,
    pub has_high_risk_medication: bool,
    pub flagged_medications: Vec<String>,

    /// Whether any ED visit is on record at all, regardless of date.
    pub has_ed_history: bool,

    /// Resources that could not be read and were left out.
    pub skipped_entries: usize,
}

impl RiskSummaryRes {
    pub fn new(summary: RiskSummary, history: &ClinicalHistory) -> Self {
        Self {
            ed_visit_count_12_months: summary.ed_visit_count_12_months,
            ed_visit_count_24_months: summary.ed_visit_count_24_months,
            risk_tier: summary.risk_tier.to_string(),
            chronic_conditions: summary.chronic_conditions,
            has_high_risk_medication: summary.has_high_risk_medication,
            flagged_medications: summary.flagged_medications,
            has_ed_history: carewatch_core::has_ed_history(&history.encounters),
            skipped_entries: history.skipped_entries,
        }
    }
}
