//! Dosage schedule resolution.
//!
//! Three input shapes are normalised into the same output, a sorted and de-duplicated list of
//! [`ClockTime`]s at which a dose is due each day:
//! - free-text instructions ("Take 1 tablet BID", "at 9:00 PM", "as needed"); see [`text`]
//! - structured FHIR `Timing` (`repeat.when`, `repeat.timeOfDay`, frequency per day, coded
//!   shorthand); see [`timing`]
//! - a whole `MedicationRequest`, which combines the two per dosage instruction
//!
//! An empty schedule means "no fixed times". The flat functions do not say whether that is
//! because the medication is taken as needed or because nothing was recognised;
//! [`text::resolve_text`] keeps the distinction.

pub mod text;
pub mod timing;

pub use text::{resolve_schedule_from_text, resolve_text, text_rule_names};
pub use timing::resolve_schedule_from_timing;

use carewatch_types::ClockTime;
use fhir::MedicationData;
use serde::Serialize;

/// Why a schedule has the times it has.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScheduleKind {
    /// At least one fixed daily time.
    Fixed,
    /// Taken as needed; deliberately no fixed times.
    Prn,
    /// Nothing in the input was recognised.
    Unrecognized,
}

/// A resolved schedule together with how it was reached.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ScheduleResolution {
    pub kind: ScheduleKind,
    pub times: Vec<ClockTime>,

    /// Name of the rule that produced the result, when one did.
    pub rule: Option<&'static str>,
}

/// Common pharmacy frequency abbreviations and their fixed daily times.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrequencyCode {
    Bid,
    Tid,
    Qid,
    Q6h,
    Q8h,
    Q12h,
    Qd,
    Qhs,
}

impl FrequencyCode {
    /// Parse a coded abbreviation such as `BID` or `DAILY`. Case-insensitive.
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_ascii_uppercase().as_str() {
            "BID" => Some(FrequencyCode::Bid),
            "TID" => Some(FrequencyCode::Tid),
            "QID" => Some(FrequencyCode::Qid),
            "Q6H" => Some(FrequencyCode::Q6h),
            "Q8H" => Some(FrequencyCode::Q8h),
            "Q12H" => Some(FrequencyCode::Q12h),
            "QD" | "DAILY" => Some(FrequencyCode::Qd),
            "QHS" => Some(FrequencyCode::Qhs),
            _ => None,
        }
    }

    /// Default daily times. `Qd` resolves to the morning slot here; free text may pick another.
    pub fn times(self) -> &'static [ClockTime] {
        match self {
            FrequencyCode::Bid => TWICE_DAILY,
            FrequencyCode::Tid => THREE_TIMES_DAILY,
            FrequencyCode::Qid => FOUR_TIMES_DAILY,
            FrequencyCode::Q6h => EVERY_6_HOURS,
            FrequencyCode::Q8h => EVERY_8_HOURS,
            FrequencyCode::Q12h => EVERY_12_HOURS,
            FrequencyCode::Qd => ONCE_DAILY,
            FrequencyCode::Qhs => BEDTIME,
        }
    }
}

pub(crate) const MORNING: ClockTime = ClockTime::hm(8, 0);
pub(crate) const NOON: ClockTime = ClockTime::hm(12, 0);
pub(crate) const AFTERNOON: ClockTime = ClockTime::hm(14, 0);
pub(crate) const EVENING: ClockTime = ClockTime::hm(18, 0);
pub(crate) const NIGHT: ClockTime = ClockTime::hm(21, 0);

pub(crate) const ONCE_DAILY: &[ClockTime] = &[MORNING];
pub(crate) const TWICE_DAILY: &[ClockTime] = &[MORNING, ClockTime::hm(20, 0)];
pub(crate) const THREE_TIMES_DAILY: &[ClockTime] = &[MORNING, AFTERNOON, ClockTime::hm(20, 0)];
pub(crate) const FOUR_TIMES_DAILY: &[ClockTime] =
    &[MORNING, NOON, ClockTime::hm(17, 0), NIGHT];
pub(crate) const EVERY_6_HOURS: &[ClockTime] = &[
    ClockTime::hm(6, 0),
    NOON,
    EVENING,
    ClockTime::MIDNIGHT,
];
pub(crate) const EVERY_8_HOURS: &[ClockTime] =
    &[ClockTime::hm(6, 0), AFTERNOON, ClockTime::hm(22, 0)];
pub(crate) const EVERY_12_HOURS: &[ClockTime] = &[MORNING, ClockTime::hm(20, 0)];
pub(crate) const BEDTIME: &[ClockTime] = &[NIGHT];

pub(crate) const BEFORE_MEALS: &[ClockTime] = &[
    ClockTime::hm(7, 30),
    ClockTime::hm(11, 30),
    ClockTime::hm(17, 30),
];
pub(crate) const WITH_MEALS: &[ClockTime] = &[MORNING, NOON, EVENING];
pub(crate) const AFTER_MEALS: &[ClockTime] = &[
    ClockTime::hm(8, 30),
    ClockTime::hm(12, 30),
    ClockTime::hm(18, 30),
];

/// Daily times for "N doses per day".
///
/// 1 to 4 use the fixed pharmacy table. Larger N are spread from 08:00 every `floor(24 / N)`
/// hours (at least one hour), capped at [`MAX_GENERATED_DAILY_DOSES`] entries. Zero yields no
/// times.
///
/// [`MAX_GENERATED_DAILY_DOSES`]: crate::constants::MAX_GENERATED_DAILY_DOSES
pub fn times_per_day(doses: u32) -> Vec<ClockTime> {
    use crate::constants::MAX_GENERATED_DAILY_DOSES;

    match doses {
        0 => Vec::new(),
        1 => ONCE_DAILY.to_vec(),
        2 => TWICE_DAILY.to_vec(),
        3 => THREE_TIMES_DAILY.to_vec(),
        4 => FOUR_TIMES_DAILY.to_vec(),
        n => {
            let interval = (24 / n).max(1);
            (0..n.min(MAX_GENERATED_DAILY_DOSES))
                .map(|i| ClockTime::from_hour(8 + i * interval))
                .collect()
        }
    }
}

/// Sort ascending and drop repeats.
pub(crate) fn normalize(mut times: Vec<ClockTime>) -> Vec<ClockTime> {
    times.sort_unstable();
    times.dedup();
    times
}

/// Resolve the daily schedule for a whole medication request.
///
/// Each dosage instruction contributes its structured `timing` result when that is non-empty,
/// otherwise its free-text result. Contributions are merged.
pub fn resolve_medication_schedule(medication: &MedicationData) -> Vec<ClockTime> {
    let mut times = Vec::new();
    for dosage in &medication.dosages {
        let from_timing = dosage
            .timing
            .as_ref()
            .filter(|timing| !timing.is_empty())
            .map(resolve_schedule_from_timing)
            .unwrap_or_default();

        if !from_timing.is_empty() {
            times.extend(from_timing);
        } else if let Some(text) = dosage.text.as_deref() {
            times.extend(resolve_schedule_from_text(text));
        }
    }
    normalize(times)
}
