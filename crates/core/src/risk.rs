//! Emergency-department utilisation risk.
//!
//! Turns a patient's encounters, conditions and medication requests into a [`RiskSummary`]:
//! ED visit counts over 12 and 24 months, a LOW/MEDIUM/HIGH tier, the chronic-condition list,
//! and any high-risk medications.
//!
//! Everything here is pure. Time-windowed counts take an explicit `reference_time`; callers
//! decide what "now" means.
//!
//! ## ED classification
//!
//! An encounter is an ED visit when the text formed from its class code, class display and
//! every `type[].coding[].code` matches `emergency|ED|ER|urgent`, case-insensitively, anywhere in
//! the text. The match is knowingly over-inclusive: `EMER` matches through `ER`, urgent-care
//! encounters match through `urgent`, and codes that merely contain `ed`/`er` also match. This is
//! kept as-is so counts agree with the client application.

use crate::config::CoreConfig;
use crate::constants::{
    ED_WINDOW_LONG_MONTHS, ED_WINDOW_SHORT_MONTHS, HIGH_RISK_VISITS_12_MONTHS,
    HIGH_RISK_VISITS_24_MONTHS, MEDIUM_RISK_VISITS_12_MONTHS, MEDIUM_RISK_VISITS_24_MONTHS,
};
use crate::CoreError;
use chrono::{DateTime, Months, Utc};
use fhir::{ClinicalHistory, ConditionData, EncounterData, MedicationData};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::{Arc, LazyLock};

static ED_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)emergency|ED|ER|urgent").expect("valid ED pattern"));

static HIGH_RISK_MEDICATION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)fentanyl|oxycodone|morphine|opioid").expect("valid medication pattern")
});

/// Discrete ED-utilisation risk tier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskTier {
    Low,
    Medium,
    High,
}

impl std::fmt::Display for RiskTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            RiskTier::Low => "LOW",
            RiskTier::Medium => "MEDIUM",
            RiskTier::High => "HIGH",
        })
    }
}

/// Which threshold table turns visit counts into a tier.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RiskConvention {
    /// HIGH if `count12 >= 4 || count24 >= 8`; MEDIUM if `count12 >= 2 || count24 >= 4`.
    #[default]
    DualWindow,
    /// HIGH if `count12 >= 4`; MEDIUM if `count12 >= 2`. The 24-month count is ignored.
    ///
    /// For callers that only have one window's worth of data.
    TwelveMonthOnly,
}

impl RiskConvention {
    /// Map visit counts to a tier. Rows are evaluated top-down; first match wins.
    pub fn tier(self, count_12_months: u32, count_24_months: u32) -> RiskTier {
        match self {
            RiskConvention::DualWindow => {
                if count_12_months >= HIGH_RISK_VISITS_12_MONTHS
                    || count_24_months >= HIGH_RISK_VISITS_24_MONTHS
                {
                    RiskTier::High
                } else if count_12_months >= MEDIUM_RISK_VISITS_12_MONTHS
                    || count_24_months >= MEDIUM_RISK_VISITS_24_MONTHS
                {
                    RiskTier::Medium
                } else {
                    RiskTier::Low
                }
            }
            RiskConvention::TwelveMonthOnly => {
                if count_12_months >= HIGH_RISK_VISITS_12_MONTHS {
                    RiskTier::High
                } else if count_12_months >= MEDIUM_RISK_VISITS_12_MONTHS {
                    RiskTier::Medium
                } else {
                    RiskTier::Low
                }
            }
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            RiskConvention::DualWindow => "dual-window",
            RiskConvention::TwelveMonthOnly => "twelve-month-only",
        }
    }
}

impl std::fmt::Display for RiskConvention {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RiskConvention {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dual-window" | "dual" => Ok(RiskConvention::DualWindow),
            "twelve-month-only" | "12-month" | "single" => Ok(RiskConvention::TwelveMonthOnly),
            other => Err(CoreError::InvalidConfig(format!(
                "unknown risk convention '{other}' (expected 'dual-window' or 'twelve-month-only')"
            ))),
        }
    }
}

/// Risk evidence for one patient. Recomputed on every call; never stored.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskSummary {
    pub ed_visit_count_12_months: u32,
    pub ed_visit_count_24_months: u32,
    pub risk_tier: RiskTier,

    /// Distinct condition labels in order of first appearance. Case is preserved.
    pub chronic_conditions: Vec<String>,

    pub has_high_risk_medication: bool,

    /// Display names of the medications that matched the high-risk keywords.
    pub flagged_medications: Vec<String>,
}

/// Whether an encounter counts as an ED visit. See the module docs for the matching rule.
pub fn classify_ed_encounter(encounter: &EncounterData) -> bool {
    let text = encounter
        .class_codes
        .iter()
        .chain(&encounter.class_displays)
        .chain(&encounter.type_codes)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(" ");

    ED_PATTERN.is_match(&text)
}

/// Number of ED visits starting at or after `reference_time - window_months`.
///
/// Encounters without a parseable start are left out. Visits dated after `reference_time` are
/// still counted.
pub fn count_ed_visits(
    encounters: &[EncounterData],
    reference_time: DateTime<Utc>,
    window_months: u32,
) -> u32 {
    let cutoff = reference_time
        .checked_sub_months(Months::new(window_months))
        .unwrap_or(DateTime::<Utc>::MIN_UTC);

    let count = encounters
        .iter()
        .filter(|e| matches!(e.period_start, Some(start) if start >= cutoff))
        .filter(|e| classify_ed_encounter(e))
        .count();

    u32::try_from(count).unwrap_or(u32::MAX)
}

/// Whether any encounter classifies as an ED visit, dated or not.
pub fn has_ed_history(encounters: &[EncounterData]) -> bool {
    encounters.iter().any(classify_ed_encounter)
}

/// Map 12- and 24-month visit counts to a tier with the dual-window table.
pub fn compute_risk_tier(count_12_months: u32, count_24_months: u32) -> RiskTier {
    RiskConvention::DualWindow.tier(count_12_months, count_24_months)
}

/// Build a [`RiskSummary`] with the dual-window convention.
pub fn summarize(
    encounters: &[EncounterData],
    conditions: &[ConditionData],
    medications: &[MedicationData],
    reference_time: DateTime<Utc>,
) -> RiskSummary {
    summarize_with(
        RiskConvention::DualWindow,
        encounters,
        conditions,
        medications,
        reference_time,
    )
}

/// Build a [`RiskSummary`] with an explicit tier convention.
pub fn summarize_with(
    convention: RiskConvention,
    encounters: &[EncounterData],
    conditions: &[ConditionData],
    medications: &[MedicationData],
    reference_time: DateTime<Utc>,
) -> RiskSummary {
    let count_12 = count_ed_visits(encounters, reference_time, ED_WINDOW_SHORT_MONTHS);
    let count_24 = count_ed_visits(encounters, reference_time, ED_WINDOW_LONG_MONTHS);
    let risk_tier = convention.tier(count_12, count_24);

    let mut chronic_conditions: Vec<String> = Vec::new();
    for label in conditions.iter().filter_map(|c| c.label.as_ref()) {
        if !chronic_conditions.iter().any(|seen| seen == label.as_str()) {
            chronic_conditions.push(label.as_str().to_string());
        }
    }

    let flagged_medications: Vec<String> = medications
        .iter()
        .filter(|m| is_high_risk_medication(m))
        .filter_map(|m| m.primary_name())
        .map(|name| name.as_str().to_string())
        .collect();

    tracing::debug!(
        count_12,
        count_24,
        ?risk_tier,
        %convention,
        flagged = flagged_medications.len(),
        "computed ED risk summary"
    );

    RiskSummary {
        ed_visit_count_12_months: count_12,
        ed_visit_count_24_months: count_24,
        risk_tier,
        chronic_conditions,
        has_high_risk_medication: !flagged_medications.is_empty(),
        flagged_medications,
    }
}

/// Whether any of a medication's names contains a high-risk keyword.
pub fn is_high_risk_medication(medication: &MedicationData) -> bool {
    medication
        .names
        .iter()
        .any(|name| HIGH_RISK_MEDICATION_PATTERN.is_match(name.as_str()))
}

/// Risk summaries under the configured convention.
#[derive(Clone, Debug)]
pub struct RiskService {
    cfg: Arc<CoreConfig>,
}

impl RiskService {
    pub fn new(cfg: Arc<CoreConfig>) -> Self {
        Self { cfg }
    }

    /// Summarise a patient's history as of `reference_time`.
    pub fn summarize(&self, history: &ClinicalHistory, reference_time: DateTime<Utc>) -> RiskSummary {
        if history.skipped_entries > 0 {
            tracing::warn!(
                skipped = history.skipped_entries,
                "some clinical resources could not be read and were left out of the risk summary"
            );
        }

        summarize_with(
            self.cfg.risk_convention(),
            &history.encounters,
            &history.conditions,
            &history.medications,
            reference_time,
        )
    }
}
