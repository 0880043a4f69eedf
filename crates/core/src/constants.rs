//! Constants used throughout the CareWatch core crate.
//!
//! Thresholds and windows live here so the risk tables stay auditable in one place.

/// Short ED look-back window, in months.
pub const ED_WINDOW_SHORT_MONTHS: u32 = 12;

/// Long ED look-back window, in months.
pub const ED_WINDOW_LONG_MONTHS: u32 = 24;

/// 12-month ED visits at or above which the tier is HIGH.
pub const HIGH_RISK_VISITS_12_MONTHS: u32 = 4;

/// 24-month ED visits at or above which the tier is HIGH (dual-window convention).
pub const HIGH_RISK_VISITS_24_MONTHS: u32 = 8;

/// 12-month ED visits at or above which the tier is MEDIUM.
pub const MEDIUM_RISK_VISITS_12_MONTHS: u32 = 2;

/// 24-month ED visits at or above which the tier is MEDIUM (dual-window convention).
pub const MEDIUM_RISK_VISITS_24_MONTHS: u32 = 4;

/// Minutes past a scheduled dose before it counts as overdue.
pub const DEFAULT_OVERDUE_GRACE_MINUTES: u32 = 30;

/// Upper bound accepted for a configured grace period (one day).
pub const MAX_OVERDUE_GRACE_MINUTES: u32 = 24 * 60;

/// Schedules with more entries than this are complex regardless of spacing.
pub const COMPLEX_SCHEDULE_MAX_DOSES: usize = 3;

/// Allowed deviation of any dosing interval from the mean interval, in minutes.
pub const COMPLEX_SCHEDULE_INTERVAL_TOLERANCE_MINUTES: f64 = 60.0;

/// Cap on generated doses for "N times a day" with large N.
pub const MAX_GENERATED_DAILY_DOSES: u32 = 6;

/// Cap on generated doses for "every N hours".
pub const MAX_INTERVAL_DOSES: u32 = 4;

/// Default address for the REST server when none is configured.
pub const DEFAULT_REST_ADDR: &str = "0.0.0.0:3000";
