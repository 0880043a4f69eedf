//! Free-text dosage instruction parsing.
//!
//! Instructions are matched against an ordered table of rules ([`TEXT_RULES`]). Rules are tried
//! top to bottom on the lower-cased text and the first one that produces an outcome wins:
//!
//! | # | rule             | example                     | result                         |
//! |---|------------------|-----------------------------|--------------------------------|
//! | 1 | `clock-times`    | "at 9:00 PM", "at 7am"      | every stated time              |
//! | 2 | `frequency-code` | "BID", "q8h", "daily"       | fixed table                    |
//! | 3 | `meal-relative`  | "after dinner", "bedtime"   | one time per phrase            |
//! | 4 | `as-needed`      | "prn", "as needed"          | empty, terminal                |
//! | 5 | `every-n-hours`  | "every 4 hours"             | up to 4 times from 06:00       |
//! | 6 | `times-per-day`  | "3 times a day"             | [`super::times_per_day`]       |
//!
//! Because the order is fixed, "every 6 hours as needed" is PRN (rule 4 runs before rule 5)
//! while "q6h prn" is a fixed q6h schedule (rule 2 runs first).

use super::{
    normalize, times_per_day, FrequencyCode, ScheduleKind, ScheduleResolution, AFTER_MEALS,
    BEFORE_MEALS, EVENING, MORNING, NIGHT, NOON, WITH_MEALS,
};
use crate::constants::MAX_INTERVAL_DOSES;
use carewatch_types::ClockTime;
use regex::Regex;
use std::sync::LazyLock;

/// What a matching rule decided.
enum RuleOutcome {
    Times(Vec<ClockTime>),
    AsNeeded,
}

/// One entry of the cascade: a name for tracing/testing and the matcher itself.
struct TextRule {
    name: &'static str,
    apply: fn(&str) -> Option<RuleOutcome>,
}

/// The cascade, in priority order.
static TEXT_RULES: [TextRule; 6] = [
    TextRule {
        name: "clock-times",
        apply: explicit_clock_times,
    },
    TextRule {
        name: "frequency-code",
        apply: frequency_code,
    },
    TextRule {
        name: "meal-relative",
        apply: meal_relative,
    },
    TextRule {
        name: "as-needed",
        apply: as_needed,
    },
    TextRule {
        name: "every-n-hours",
        apply: every_n_hours,
    },
    TextRule {
        name: "times-per-day",
        apply: n_times_per_day,
    },
];

/// Names of the cascade rules in the order they are tried.
pub fn text_rule_names() -> Vec<&'static str> {
    TEXT_RULES.iter().map(|rule| rule.name).collect()
}

/// Resolve free text to a schedule, keeping track of why it came out that way.
pub fn resolve_text(text: &str) -> ScheduleResolution {
    let lowered = text.to_lowercase();

    for rule in &TEXT_RULES {
        match (rule.apply)(&lowered) {
            Some(RuleOutcome::Times(times)) => {
                tracing::debug!(rule = rule.name, "dosage text matched");
                return ScheduleResolution {
                    kind: ScheduleKind::Fixed,
                    times: normalize(times),
                    rule: Some(rule.name),
                };
            }
            Some(RuleOutcome::AsNeeded) => {
                tracing::debug!(rule = rule.name, "dosage text is as-needed");
                return ScheduleResolution {
                    kind: ScheduleKind::Prn,
                    times: Vec::new(),
                    rule: Some(rule.name),
                };
            }
            None => {}
        }
    }

    ScheduleResolution {
        kind: ScheduleKind::Unrecognized,
        times: Vec::new(),
        rule: None,
    }
}

/// Resolve free text to sorted, de-duplicated daily times.
///
/// Empty when the text is PRN or unrecognised; use [`resolve_text`] to tell them apart.
pub fn resolve_schedule_from_text(text: &str) -> Vec<ClockTime> {
    resolve_text(text).times
}

// ============================================================================
// Rule 1: explicit clock times
// ============================================================================

static CLOCK_TIME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bat\s+(\d{1,2})(?:[:.]([0-5]\d))?(?:\s*(a\.?m\.?|p\.?m\.?))?")
        .expect("valid clock-time pattern")
});

/// Words that turn "at 10" into a dose amount rather than a time.
const DOSE_UNITS: &[&str] = &[
    "mg", "mcg", "ug", "g", "ml", "iu", "mmol", "unit", "units", "tab", "tabs", "tablet",
    "tablets", "cap", "caps", "capsule", "capsules", "puff", "puffs", "drop", "drops",
];

/// Whether the text following a clock-time match makes it something else.
///
/// "at 10mg" and "at 123" run straight into more letters or digits. "at 10 mg" has no
/// meridiem and is followed by a dose unit.
fn is_dose_amount(rest: &str, has_meridiem: bool) -> bool {
    if rest.starts_with(|c: char| c.is_ascii_alphanumeric() || c == ':') {
        return true;
    }
    if has_meridiem {
        return false;
    }
    let word: String = rest
        .trim_start()
        .chars()
        .take_while(char::is_ascii_alphabetic)
        .collect();
    DOSE_UNITS.contains(&word.as_str())
}

fn explicit_clock_times(text: &str) -> Option<RuleOutcome> {
    let times: Vec<ClockTime> = CLOCK_TIME
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let meridiem = caps.get(3);
            if is_dose_amount(&text[whole.end()..], meridiem.is_some()) {
                return None;
            }
            let mut hour: u32 = caps.get(1)?.as_str().parse().ok()?;
            let minute: u32 = caps.get(2).map_or(Ok(0), |m| m.as_str().parse()).ok()?;
            match meridiem.map(|m| m.as_str().starts_with('p')) {
                Some(true) if hour < 12 => hour += 12,
                Some(false) if hour == 12 => hour = 0,
                _ => {}
            }
            ClockTime::new(hour, minute).ok()
        })
        .collect();

    (!times.is_empty()).then_some(RuleOutcome::Times(times))
}

// ============================================================================
// Rule 2: frequency abbreviations
// ============================================================================

static FREQUENCY_PATTERNS: LazyLock<Vec<(FrequencyCode, Regex)>> = LazyLock::new(|| {
    [
        (
            FrequencyCode::Bid,
            r"\bbid\b|\bb\.i\.d\b|\btwice\s+(?:a|per|each)\s+day\b|\btwice\s+daily\b",
        ),
        (FrequencyCode::Tid, r"\btid\b|\bt\.i\.d\b"),
        (FrequencyCode::Qid, r"\bqid\b|\bq\.i\.d\b"),
        (FrequencyCode::Q6h, r"\bq\s*6\s*h(?:rs?|ours?)?\b"),
        (FrequencyCode::Q8h, r"\bq\s*8\s*h(?:rs?|ours?)?\b"),
        (FrequencyCode::Q12h, r"\bq\s*12\s*h(?:rs?|ours?)?\b"),
        (
            FrequencyCode::Qd,
            r"\bqd\b|\bq\.d\b|\bdaily\b|\bonce\s+(?:a|per)\s+day\b|\bevery\s+day\b",
        ),
    ]
    .into_iter()
    .map(|(code, pattern)| (code, Regex::new(pattern).expect("valid frequency pattern")))
    .collect()
});

/// Time-of-day keywords that place a once-daily dose, in priority order.
static ONCE_DAILY_SLOTS: LazyLock<Vec<(Regex, ClockTime)>> = LazyLock::new(|| {
    [
        (r"\bmorning\b|\bbreakfast\b", MORNING),
        (r"\bevening\b|\bdinner\b|\bsupper\b", EVENING),
        (r"\bbedtime\b|\bnight\b", NIGHT),
        (r"\bnoon\b|\blunch\b", NOON),
    ]
    .into_iter()
    .map(|(pattern, time)| (Regex::new(pattern).expect("valid slot pattern"), time))
    .collect()
});

fn frequency_code(text: &str) -> Option<RuleOutcome> {
    let (code, _) = FREQUENCY_PATTERNS.iter().find(|(code, pattern)| {
        // "3 times daily" belongs to the times-per-day rule, not once-daily.
        pattern.is_match(text) && !(*code == FrequencyCode::Qd && TIMES_PER_DAY.is_match(text))
    })?;

    let times = match code {
        FrequencyCode::Qd => vec![once_daily_slot(text)],
        other => other.times().to_vec(),
    };
    Some(RuleOutcome::Times(times))
}

fn once_daily_slot(text: &str) -> ClockTime {
    ONCE_DAILY_SLOTS
        .iter()
        .find(|(pattern, _)| pattern.is_match(text))
        .map_or(MORNING, |(_, time)| *time)
}

// ============================================================================
// Rule 3: meal-relative phrases
// ============================================================================

static MEAL_PHRASES: LazyLock<Vec<(Regex, &'static [ClockTime])>> = LazyLock::new(|| {
    const BEFORE_BREAKFAST: &[ClockTime] = &[ClockTime::hm(7, 30)];
    const WITH_BREAKFAST: &[ClockTime] = &[MORNING];
    const AFTER_BREAKFAST: &[ClockTime] = &[ClockTime::hm(8, 30)];
    const BEFORE_LUNCH: &[ClockTime] = &[ClockTime::hm(11, 30)];
    const WITH_LUNCH: &[ClockTime] = &[NOON];
    const AFTER_LUNCH: &[ClockTime] = &[ClockTime::hm(12, 30)];
    const BEFORE_DINNER: &[ClockTime] = &[ClockTime::hm(17, 30)];
    const WITH_DINNER: &[ClockTime] = &[EVENING];
    const AFTER_DINNER: &[ClockTime] = &[ClockTime::hm(18, 30)];
    const AT_BEDTIME: &[ClockTime] = &[NIGHT];

    let phrases: [(&str, &'static [ClockTime]); 13] = [
        (r"\bbefore\s+breakfast\b", BEFORE_BREAKFAST),
        (r"\b(?:with|at)\s+breakfast\b", WITH_BREAKFAST),
        (r"\bafter\s+breakfast\b", AFTER_BREAKFAST),
        (r"\bbefore\s+lunch\b", BEFORE_LUNCH),
        (r"\b(?:with|at)\s+lunch\b", WITH_LUNCH),
        (r"\bafter\s+lunch\b", AFTER_LUNCH),
        (r"\bbefore\s+(?:dinner|supper)\b", BEFORE_DINNER),
        (r"\b(?:with|at)\s+(?:dinner|supper)\b", WITH_DINNER),
        (r"\bafter\s+(?:dinner|supper)\b", AFTER_DINNER),
        (r"\bbedtime\b|\bbefore\s+bed\b", AT_BEDTIME),
        (r"\bbefore\s+(?:meals|each\s+meal)\b", BEFORE_MEALS),
        (r"\bwith\s+(?:meals|each\s+meal)\b", WITH_MEALS),
        (r"\bafter\s+(?:meals|each\s+meal)\b", AFTER_MEALS),
    ];

    phrases
        .into_iter()
        .map(|(pattern, times)| (Regex::new(pattern).expect("valid meal pattern"), times))
        .collect()
});

fn meal_relative(text: &str) -> Option<RuleOutcome> {
    let times: Vec<ClockTime> = MEAL_PHRASES
        .iter()
        .filter(|(pattern, _)| pattern.is_match(text))
        .flat_map(|(_, times)| times.iter().copied())
        .collect();

    (!times.is_empty()).then_some(RuleOutcome::Times(times))
}

// ============================================================================
// Rule 4: as needed
// ============================================================================

static AS_NEEDED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bprn\b|\bp\.r\.n\b|as needed|when needed|if needed").expect("valid PRN pattern")
});

fn as_needed(text: &str) -> Option<RuleOutcome> {
    AS_NEEDED.is_match(text).then_some(RuleOutcome::AsNeeded)
}

// ============================================================================
// Rule 5: every N hours
// ============================================================================

static EVERY_N_HOURS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bevery\s+(\d{1,2})\s*(?:hours?|hrs?|h)\b").expect("valid interval pattern")
});

fn every_n_hours(text: &str) -> Option<RuleOutcome> {
    let hours: u32 = EVERY_N_HOURS
        .captures(text)?
        .get(1)?
        .as_str()
        .parse()
        .ok()
        .filter(|h| (1..=24).contains(h))?;

    let times = (0..MAX_INTERVAL_DOSES)
        .map(|i| ClockTime::from_hour(6 + i * hours))
        .collect();
    Some(RuleOutcome::Times(times))
}

// ============================================================================
// Rule 6: N times a day
// ============================================================================

static TIMES_PER_DAY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(\d{1,2}|one|two|three|four|five|six|seven|eight)\s*(?:times?|x)\s*(?:(?:a|per|each)\s+day\b|daily\b)",
    )
    .expect("valid times-per-day pattern")
});

fn n_times_per_day(text: &str) -> Option<RuleOutcome> {
    let count = TIMES_PER_DAY.captures(text)?.get(1)?.as_str();
    let doses = match count {
        "one" => 1,
        "two" => 2,
        "three" => 3,
        "four" => 4,
        "five" => 5,
        "six" => 6,
        "seven" => 7,
        "eight" => 8,
        digits => digits.parse::<u32>().ok()?,
    };

    let times = times_per_day(doses);
    (!times.is_empty()).then_some(RuleOutcome::Times(times))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolve(text: &str) -> Vec<String> {
        resolve_schedule_from_text(text)
            .iter()
            .map(ToString::to_string)
            .collect()
    }

    #[test]
    fn rule_order_is_fixed() {
        assert_eq!(
            text_rule_names(),
            vec![
                "clock-times",
                "frequency-code",
                "meal-relative",
                "as-needed",
                "every-n-hours",
                "times-per-day",
            ]
        );
    }

    #[test]
    fn bid() {
        assert_eq!(resolve("Take 1 tablet BID"), ["08:00", "20:00"]);
        assert_eq!(resolve("1 tab b.i.d. with food"), ["08:00", "20:00"]);
        assert_eq!(resolve("Take twice daily"), ["08:00", "20:00"]);
    }

    #[test]
    fn other_frequency_codes() {
        assert_eq!(resolve("TID"), ["08:00", "14:00", "20:00"]);
        assert_eq!(resolve("qid"), ["08:00", "12:00", "17:00", "21:00"]);
        assert_eq!(resolve("1 cap q6h"), ["00:00", "06:00", "12:00", "18:00"]);
        assert_eq!(resolve("q 8 hrs"), ["06:00", "14:00", "22:00"]);
        assert_eq!(resolve("Q12H"), ["08:00", "20:00"]);
    }

    #[test]
    fn frequency_codes_need_word_boundaries() {
        assert!(resolve("morbid obesity diet").is_empty());
    }

    #[test]
    fn once_daily_picks_time_of_day() {
        assert_eq!(resolve("Take once a day"), ["08:00"]);
        assert_eq!(resolve("Take daily in the evening"), ["18:00"]);
        assert_eq!(resolve("One tablet daily with supper"), ["18:00"]);
        assert_eq!(resolve("daily at night"), ["21:00"]);
        assert_eq!(resolve("qd with lunch"), ["12:00"]);
        assert_eq!(resolve("daily with breakfast"), ["08:00"]);
    }

    #[test]
    fn explicit_times_win() {
        assert_eq!(resolve("Take at 9:00 PM"), ["21:00"]);
        assert_eq!(resolve("Take BID at 7am and at 7pm"), ["07:00", "19:00"]);
        assert_eq!(resolve("at 12 am"), ["00:00"]);
        assert_eq!(resolve("at 12:30 p.m."), ["12:30"]);
        assert_eq!(resolve("at 14:15"), ["14:15"]);
        assert_eq!(resolve("Take at 7.30 pm"), ["19:30"]);
        assert_eq!(resolve("at 8.15am and at 8"), ["08:00", "08:15"]);
    }

    #[test]
    fn explicit_times_ignore_doses_and_bad_hours() {
        assert_eq!(resolve("Take at 10mg BID"), ["08:00", "20:00"]);
        assert!(resolve("at 25:00").is_empty());
        assert!(resolve("at 123").is_empty());

        let resolution = resolve_text("Take 1 tablet at 10 mg dose");
        assert_eq!(resolution.kind, ScheduleKind::Unrecognized);
        assert!(resolution.times.is_empty());
        assert_eq!(resolve("at 2 tablets twice daily"), ["08:00", "20:00"]);
    }

    #[test]
    fn meal_relative_phrases() {
        assert_eq!(resolve("Take before breakfast"), ["07:30"]);
        assert_eq!(resolve("after lunch"), ["12:30"]);
        assert_eq!(
            resolve("Take with breakfast and after dinner"),
            ["08:00", "18:30"]
        );
        assert_eq!(resolve("at bedtime"), ["21:00"]);
        assert_eq!(resolve("before supper"), ["17:30"]);
        assert_eq!(resolve("after meals"), ["08:30", "12:30", "18:30"]);
    }

    #[test]
    fn as_needed_is_empty_and_tagged() {
        assert!(resolve("Take as needed for pain").is_empty());
        let resolution = resolve_text("Take as needed for pain");
        assert_eq!(resolution.kind, ScheduleKind::Prn);
        assert_eq!(resolution.rule, Some("as-needed"));
    }

    #[test]
    fn as_needed_beats_interval_but_not_codes() {
        assert_eq!(resolve_text("every 6 hours as needed").kind, ScheduleKind::Prn);
        assert_eq!(resolve("q6h prn"), ["00:00", "06:00", "12:00", "18:00"]);
    }

    #[test]
    fn every_n_hours() {
        assert_eq!(resolve("every 4 hours"), ["06:00", "10:00", "14:00", "18:00"]);
        assert_eq!(resolve("every 12 hours"), ["06:00", "18:00"]);
        assert_eq!(resolve("every 24 hrs"), ["06:00"]);
        assert_eq!(resolve("every 10 hours"), ["02:00", "06:00", "12:00", "16:00"]);
        assert!(resolve("every 0 hours").is_empty());
    }

    #[test]
    fn n_times_a_day() {
        assert_eq!(resolve("Take 3 times a day"), ["08:00", "14:00", "20:00"]);
        assert_eq!(resolve("2 times per day"), ["08:00", "20:00"]);
        assert_eq!(resolve("three times daily"), ["08:00", "14:00", "20:00"]);
        assert_eq!(resolve("4x a day"), ["08:00", "12:00", "17:00", "21:00"]);
        assert_eq!(
            resolve("6 times a day"),
            ["00:00", "04:00", "08:00", "12:00", "16:00", "20:00"]
        );
        assert!(resolve("0 times a day").is_empty());
        assert_eq!(resolve("Take 1 time a day"), ["08:00"]);
        assert_eq!(resolve("one time daily"), ["08:00"]);
    }

    #[test]
    fn unrecognised_text() {
        let resolution = resolve_text("Apply a thin layer to the affected area");
        assert_eq!(resolution.kind, ScheduleKind::Unrecognized);
        assert!(resolution.times.is_empty());
        assert_eq!(resolution.rule, None);
        assert_eq!(resolve_text("").kind, ScheduleKind::Unrecognized);
    }

    #[test]
    fn resolution_is_stable() {
        for text in ["Take 1 tablet BID", "every 8 hours", "with meals", "at 6 pm and at 6 am"] {
            assert_eq!(resolve_schedule_from_text(text), resolve_schedule_from_text(text));
        }
    }
}
