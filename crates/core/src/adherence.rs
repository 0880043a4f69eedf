//! Adherence support calculations over resolved daily schedules.
//!
//! All functions work on wall-clock times of day. Callers pass "now" explicitly; nothing here
//! reads the system clock.
//!
//! Overdue detection is date-naive: a dose scheduled for 23:50 checked at 00:10 the next day is
//! treated as a future dose, not a 20-minute-late one.

use crate::constants::{
    COMPLEX_SCHEDULE_INTERVAL_TOLERANCE_MINUTES, COMPLEX_SCHEDULE_MAX_DOSES,
};
use crate::CoreConfig;
use carewatch_types::ClockTime;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// The next dose due from a schedule.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NextDose {
    pub time: ClockTime,

    /// False when every dose today has passed and this is tomorrow's first dose.
    pub is_today: bool,
}

/// A recorded dose outcome.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DoseEvent {
    pub scheduled_time: ClockTime,
    pub taken: bool,
    pub recorded_at: DateTime<Utc>,
}

/// Render a time as `h:mm AM/PM` (for example `8:00 AM`, `12:00 AM` for midnight).
pub fn format_for_display(time: ClockTime) -> String {
    let hour = time.hour();
    let suffix = if hour < 12 { "AM" } else { "PM" };
    let display_hour = match hour % 12 {
        0 => 12,
        h => h,
    };
    format!("{display_hour}:{:02} {suffix}", time.minute())
}

/// The first scheduled time strictly after `now`, or tomorrow's first dose.
///
/// `None` only for an empty schedule. The schedule need not be sorted.
pub fn next_dose_time(schedule: &[ClockTime], now: ClockTime) -> Option<NextDose> {
    if let Some(time) = schedule.iter().copied().filter(|t| *t > now).min() {
        return Some(NextDose {
            time,
            is_today: true,
        });
    }

    schedule.iter().copied().min().map(|time| NextDose {
        time,
        is_today: false,
    })
}

/// True when `scheduled` is earlier than `now` by more than `grace_minutes`.
///
/// Future times are never overdue.
pub fn is_overdue(scheduled: ClockTime, now: ClockTime, grace_minutes: u32) -> bool {
    let scheduled = scheduled.minutes_since_midnight();
    let now = now.minutes_since_midnight();
    now > scheduled && now - scheduled > grace_minutes
}

/// Sorted, de-duplicated entries of `schedule` that are overdue at `now`.
pub fn overdue_doses_with_grace(
    schedule: &[ClockTime],
    now: ClockTime,
    grace_minutes: u32,
) -> Vec<ClockTime> {
    let mut overdue: Vec<ClockTime> = schedule
        .iter()
        .copied()
        .filter(|t| is_overdue(*t, now, grace_minutes))
        .collect();
    overdue.sort_unstable();
    overdue.dedup();
    overdue
}

/// Percentage of doses taken, rounded to the nearest whole number.
///
/// With no recorded doses at all the rate is 100: nothing was missed.
pub fn adherence_rate(taken: u32, missed: u32) -> u8 {
    let total = u64::from(taken) + u64::from(missed);
    if total == 0 {
        return 100;
    }

    let rate = (100.0 * taken as f64 / total as f64).round();
    rate.clamp(0.0, 100.0) as u8
}

/// Adherence rate over recorded dose events.
pub fn adherence_from_events(events: &[DoseEvent]) -> u8 {
    let taken = events.iter().filter(|e| e.taken).count();
    let missed = events.len() - taken;
    adherence_rate(saturating_u32(taken), saturating_u32(missed))
}

fn saturating_u32(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

/// True when a schedule is hard to follow.
///
/// A schedule is complex when it has more than three doses, or when any gap between
/// consecutive doses differs from the mean gap by more than an hour. Gaps are measured within
/// the day; the overnight gap back to the first dose is not considered.
pub fn is_complex_schedule(schedule: &[ClockTime]) -> bool {
    if schedule.len() > COMPLEX_SCHEDULE_MAX_DOSES {
        return true;
    }

    let mut sorted = schedule.to_vec();
    sorted.sort_unstable();

    let intervals: Vec<f64> = sorted
        .windows(2)
        .map(|pair| f64::from(pair[1].minutes_since_midnight() - pair[0].minutes_since_midnight()))
        .collect();
    if intervals.is_empty() {
        return false;
    }

    let mean = intervals.iter().sum::<f64>() / intervals.len() as f64;
    intervals
        .iter()
        .any(|interval| (interval - mean).abs() > COMPLEX_SCHEDULE_INTERVAL_TOLERANCE_MINUTES)
}

/// Adherence checks that depend on configuration.
#[derive(Clone, Debug)]
pub struct AdherenceService {
    cfg: Arc<CoreConfig>,
}

impl AdherenceService {
    pub fn new(cfg: Arc<CoreConfig>) -> Self {
        Self { cfg }
    }

    /// [`is_overdue`] with the configured grace period.
    pub fn is_overdue(&self, scheduled: ClockTime, now: ClockTime) -> bool {
        is_overdue(scheduled, now, self.cfg.overdue_grace_minutes())
    }

    /// Scheduled times from `schedule` that are overdue at `now`.
    pub fn overdue_doses(&self, schedule: &[ClockTime], now: ClockTime) -> Vec<ClockTime> {
        overdue_doses_with_grace(schedule, now, self.cfg.overdue_grace_minutes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::risk::RiskConvention;
    use chrono::TimeZone;

    fn t(text: &str) -> ClockTime {
        text.parse().expect("valid clock time")
    }

    fn times(texts: &[&str]) -> Vec<ClockTime> {
        texts.iter().map(|s| t(s)).collect()
    }

    #[test]
    fn display_format() {
        assert_eq!(format_for_display(t("00:00")), "12:00 AM");
        assert_eq!(format_for_display(t("08:05")), "8:05 AM");
        assert_eq!(format_for_display(t("12:00")), "12:00 PM");
        assert_eq!(format_for_display(t("21:30")), "9:30 PM");
        assert_eq!(format_for_display(t("23:59")), "11:59 PM");
    }

    #[test]
    fn next_dose_later_today() {
        let schedule = times(&["08:00", "20:00"]);
        assert_eq!(
            next_dose_time(&schedule, t("10:00")),
            Some(NextDose {
                time: t("20:00"),
                is_today: true
            })
        );
    }

    #[test]
    fn next_dose_is_strictly_after_now() {
        let schedule = times(&["08:00", "20:00"]);
        let next = next_dose_time(&schedule, t("08:00")).expect("next dose");
        assert_eq!(next.time, t("20:00"));
        assert!(next.is_today);
    }

    #[test]
    fn next_dose_rolls_to_tomorrow() {
        let schedule = times(&["20:00", "08:00"]);
        assert_eq!(
            next_dose_time(&schedule, t("21:00")),
            Some(NextDose {
                time: t("08:00"),
                is_today: false
            })
        );
    }

    #[test]
    fn next_dose_of_empty_schedule() {
        assert_eq!(next_dose_time(&[], t("12:00")), None);
    }

    #[test]
    fn overdue_respects_grace() {
        assert!(!is_overdue(t("08:00"), t("08:30"), 30));
        assert!(is_overdue(t("08:00"), t("08:31"), 30));
        assert!(is_overdue(t("08:00"), t("08:01"), 0));
    }

    #[test]
    fn future_doses_are_never_overdue() {
        assert!(!is_overdue(t("20:00"), t("08:00"), 0));
        assert!(!is_overdue(t("08:00"), t("08:00"), 0));
        assert!(!is_overdue(t("23:50"), t("00:10"), 0));
    }

    #[test]
    fn adherence_rates() {
        assert_eq!(adherence_rate(0, 0), 100);
        assert_eq!(adherence_rate(3, 1), 75);
        assert_eq!(adherence_rate(0, 5), 0);
        assert_eq!(adherence_rate(2, 1), 67);
        assert_eq!(adherence_rate(1, 2), 33);
        assert_eq!(adherence_rate(1, 7), 13);
        assert_eq!(adherence_rate(u32::MAX, 0), 100);
    }

    #[test]
    fn adherence_over_events() {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).single().expect("valid date");
        let events = vec![
            DoseEvent {
                scheduled_time: t("08:00"),
                taken: true,
                recorded_at: at,
            },
            DoseEvent {
                scheduled_time: t("20:00"),
                taken: false,
                recorded_at: at,
            },
            DoseEvent {
                scheduled_time: t("08:00"),
                taken: true,
                recorded_at: at,
            },
            DoseEvent {
                scheduled_time: t("20:00"),
                taken: true,
                recorded_at: at,
            },
        ];
        assert_eq!(adherence_from_events(&events), 75);
        assert_eq!(adherence_from_events(&[]), 100);
    }

    #[test]
    fn dose_event_json_shape() {
        let json = r#"{"scheduledTime":"08:00","taken":true,"recordedAt":"2024-03-01T08:05:00Z"}"#;
        let event: DoseEvent = serde_json::from_str(json).expect("deserialize");
        assert_eq!(event.scheduled_time, t("08:00"));
        assert!(event.taken);
    }

    #[test]
    fn complexity() {
        assert!(!is_complex_schedule(&[]));
        assert!(!is_complex_schedule(&times(&["08:00"])));
        assert!(!is_complex_schedule(&times(&["08:00", "20:00"])));
        assert!(!is_complex_schedule(&times(&["08:00", "14:00", "20:00"])));
        assert!(is_complex_schedule(&times(&["08:00", "12:00", "17:00", "21:00"])));
        assert!(is_complex_schedule(&times(&["07:00", "08:00", "20:00"])));
        assert!(!is_complex_schedule(&times(&["20:00", "08:00", "14:30"])));
    }

    #[test]
    fn overdue_doses_sorted_and_deduplicated() {
        let schedule = times(&["20:00", "12:00", "08:00", "12:00"]);
        assert_eq!(
            overdue_doses_with_grace(&schedule, t("12:20"), 10),
            times(&["08:00", "12:00"])
        );
        assert_eq!(
            overdue_doses_with_grace(&schedule, t("12:20"), 30),
            times(&["08:00"])
        );
        assert!(overdue_doses_with_grace(&[], t("23:59"), 0).is_empty());
    }

    #[test]
    fn service_uses_configured_grace() {
        let cfg = CoreConfig::new(90, RiskConvention::DualWindow).expect("valid config");
        let service = AdherenceService::new(Arc::new(cfg));
        assert!(!service.is_overdue(t("08:00"), t("09:00")));
        assert!(service.is_overdue(t("08:00"), t("09:31")));

        let overdue = service.overdue_doses(&times(&["14:00", "08:00", "08:00"]), t("12:00"));
        assert_eq!(overdue, times(&["08:00"]));
    }
}
