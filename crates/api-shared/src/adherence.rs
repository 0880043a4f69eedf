//! Adherence request/response types.

use carewatch_core::{format_for_display, ClockTime, CoreResult, DoseEvent, NextDose};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Next-dose lookup. `now` defaults to the current UTC time of day.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct NextDoseReq {
    pub schedule: Vec<String>,
    #[serde(default)]
    pub now: Option<String>,
}

/// The next dose, or all-`null` for an empty schedule.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NextDoseRes {
    pub time: Option<String>,
    pub display: Option<String>,
    pub is_today: Option<bool>,
}

impl From<Option<NextDose>> for NextDoseRes {
    fn from(next: Option<NextDose>) -> Self {
        match next {
            Some(next) => Self {
                time: Some(next.time.to_string()),
                display: Some(format_for_display(next.time)),
                is_today: Some(next.is_today),
            },
            None => Self::default(),
        }
    }
}

/// Overdue check for every entry of a schedule.
///
/// `graceMinutes` falls back to the server's configured grace period.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OverdueReq {
    pub schedule: Vec<String>,
    #[serde(default)]
    pub now: Option<String>,
    #[serde(default)]
    pub grace_minutes: Option<u32>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OverdueRes {
    pub overdue: Vec<String>,
    pub grace_minutes: u32,
}

/// A recorded dose outcome as sent over the wire.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DoseEventDto {
    pub scheduled_time: String,
    pub taken: bool,
    pub recorded_at: DateTime<Utc>,
}

impl DoseEventDto {
    pub fn to_event(&self) -> CoreResult<DoseEvent> {
        Ok(DoseEvent {
            scheduled_time: self.scheduled_time.trim().parse::<ClockTime>()?,
            taken: self.taken,
            recorded_at: self.recorded_at,
        })
    }
}

/// Adherence rate from counts, from recorded events, or both (added together).
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdherenceRateReq {
    #[serde(default)]
    pub taken: u32,
    #[serde(default)]
    pub missed: u32,
    #[serde(default)]
    pub events: Vec<DoseEventDto>,
}

impl AdherenceRateReq {
    /// Combined `(taken, missed)` counts.
    pub fn counts(&self) -> CoreResult<(u32, u32)> {
        let mut taken = self.taken;
        let mut missed = self.missed;
        for dto in &self.events {
            if dto.to_event()?.taken {
                taken = taken.saturating_add(1);
            } else {
                missed = missed.saturating_add(1);
            }
        }
        Ok((taken, missed))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AdherenceRateRes {
    /// 0 to 100. 100 when nothing has been recorded.
    pub rate: u8,
    pub taken: u32,
    pub missed: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn next_dose_response_shapes() {
        let next = NextDose {
            time: ClockTime::hm(20, 0),
            is_today: true,
        };
        let res = NextDoseRes::from(Some(next));
        assert_eq!(res.time.as_deref(), Some("20:00"));
        assert_eq!(res.display.as_deref(), Some("8:00 PM"));
        assert_eq!(res.is_today, Some(true));

        assert_eq!(NextDoseRes::from(None), NextDoseRes::default());
    }

    #[test]
    fn counts_combine_totals_and_events() {
        let req: AdherenceRateReq = serde_json::from_value(json!({
            "taken": 2,
            "events": [
                {"scheduledTime": "08:00", "taken": true, "recordedAt": "2026-10-15T08:02:00Z"},
                {"scheduledTime": "20:00", "taken": false, "recordedAt": "2026-10-15T21:00:00Z"}
            ]
        }))
        .expect("request");
        assert_eq!(req.counts().expect("counts"), (3, 1));
    }

    #[test]
    fn bad_event_time_is_an_error() {
        let req = AdherenceRateReq {
            events: vec![DoseEventDto {
                scheduled_time: "noon".into(),
                taken: true,
                recorded_at: Utc::now(),
            }],
            ..AdherenceRateReq::default()
        };
        assert!(req.counts().is_err());
    }
}
