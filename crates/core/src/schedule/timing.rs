//! Structured FHIR `Timing` resolution.
//!
//! Every recognised element contributes times and the result is their union:
//! - `repeat.when` day-period codes, including the meal sub-codes (`ACM`, `PCV`, `C`, ...) and
//!   dotted refinements such as `MORN.early`, which resolve to their parent period
//! - `repeat.timeOfDay` literal times, truncated to minutes
//! - `repeat.frequency` per day, only for a one-day period
//! - `code.coding[].code` shorthand (`BID`, `QHS`, ...)
//!
//! Unknown codes and malformed times are skipped.

use super::{
    normalize, times_per_day, FrequencyCode, AFTERNOON, AFTER_MEALS, BEFORE_MEALS, EVENING,
    MORNING, NIGHT, NOON, WITH_MEALS,
};
use carewatch_types::ClockTime;
use fhir::TimingData;

/// Resolve a structured `Timing` to sorted, de-duplicated daily times.
pub fn resolve_schedule_from_timing(timing: &TimingData) -> Vec<ClockTime> {
    let mut times = Vec::new();

    for code in &timing.when {
        match when_code_times(code) {
            Some(slots) => times.extend_from_slice(slots),
            None => tracing::debug!(code = %code, "ignoring unknown timing.repeat.when code"),
        }
    }

    for literal in &timing.time_of_day {
        match literal.trim().parse::<ClockTime>() {
            Ok(time) => times.push(time),
            Err(err) => tracing::debug!(value = %literal, error = %err, "ignoring timeOfDay"),
        }
    }

    if let Some(doses) = daily_frequency(timing) {
        times.extend(times_per_day(doses));
    }

    times.extend(
        timing
            .codes
            .iter()
            .filter_map(|code| FrequencyCode::from_code(code))
            .flat_map(|code| code.times().iter().copied()),
    );

    normalize(times)
}

/// Times for one `repeat.when` code.
///
/// `CD` and `CV` are placed at the evening and afternoon slots respectively, matching the
/// clinic's existing schedules rather than their FHIR meal meaning.
fn when_code_times(code: &str) -> Option<&'static [ClockTime]> {
    const BREAKFAST_BEFORE: &[ClockTime] = &[ClockTime::hm(7, 30)];
    const LUNCH_BEFORE: &[ClockTime] = &[ClockTime::hm(11, 30)];
    const DINNER_BEFORE: &[ClockTime] = &[ClockTime::hm(17, 30)];
    const BREAKFAST_AFTER: &[ClockTime] = &[ClockTime::hm(8, 30)];
    const LUNCH_AFTER: &[ClockTime] = &[ClockTime::hm(12, 30)];
    const DINNER_AFTER: &[ClockTime] = &[ClockTime::hm(18, 30)];

    let base = code.trim().split('.').next().unwrap_or_default();
    let slots: &'static [ClockTime] = match base.to_ascii_uppercase().as_str() {
        "MORN" | "CM" => &[MORNING],
        "NOON" => &[NOON],
        "AFT" | "CV" => &[AFTERNOON],
        "EVE" | "CD" => &[EVENING],
        "NIGHT" | "HS" => &[NIGHT],
        "AC" => BEFORE_MEALS,
        "PC" => AFTER_MEALS,
        "C" => WITH_MEALS,
        "ACM" => BREAKFAST_BEFORE,
        "ACD" => LUNCH_BEFORE,
        "ACV" => DINNER_BEFORE,
        "PCM" => BREAKFAST_AFTER,
        "PCD" => LUNCH_AFTER,
        "PCV" => DINNER_AFTER,
        _ => return None,
    };
    Some(slots)
}

/// Doses per day when the repeat describes `frequency` per single day, 1 to 4.
fn daily_frequency(timing: &TimingData) -> Option<u32> {
    let per_day = timing
        .period_unit
        .as_deref()
        .is_some_and(|unit| unit.trim().eq_ignore_ascii_case("d"));
    let single_period = timing.period.map_or(true, |p| (p - 1.0).abs() < f64::EPSILON);

    timing
        .frequency
        .filter(|f| per_day && single_period && (1..=4).contains(f))
}
