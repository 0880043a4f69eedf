//! # API Shared
//!
//! Shared utilities and definitions for CareWatch front ends.
//!
//! Contains:
//! - Request/response types with OpenAPI schemas (`risk`, `schedule`, `adherence`)
//! - Conversions between those types and `carewatch-core` values
//! - Shared services like `HealthService`
//!
//! Used by `api-rest` and the `carewatch` CLI so both speak the same JSON.

pub mod adherence;
pub mod health;
pub mod risk;
pub mod schedule;

pub use adherence::{
    AdherenceRateReq, AdherenceRateRes, DoseEventDto, NextDoseReq, NextDoseRes, OverdueReq,
    OverdueRes,
};
pub use health::{HealthRes, HealthService};
pub use risk::{RiskSummaryReq, RiskSummaryRes};
pub use schedule::{
    parse_schedule, ComplexityReq, ComplexityRes, MedicationScheduleRes, ScheduleTextReq,
    ScheduleTextRes, ScheduleTimingRes,
};
