//! # CareWatch Core
//!
//! Core clinical logic for CareWatch.
//!
//! This crate contains pure computations over already-parsed FHIR data:
//! - ED-utilisation risk classification (`risk`)
//! - Dosage schedule resolution from free text and structured `Timing` (`schedule`)
//! - Adherence support: next dose, overdue checks, adherence rate, complexity (`adherence`)
//!
//! **No API concerns**: HTTP servers, CLI parsing and environment handling belong in `api-rest`,
//! `api-shared`, `cli` and the run binary. Nothing here performs I/O or reads the clock.

pub mod adherence;
pub mod config;
pub mod constants;
pub mod error;
pub mod risk;
pub mod schedule;

pub use config::CoreConfig;
pub use error::{CoreError, CoreResult};

pub use adherence::{
    adherence_from_events, adherence_rate, format_for_display, is_complex_schedule, is_overdue,
    next_dose_time, overdue_doses_with_grace, AdherenceService, DoseEvent, NextDose,
};
pub use risk::{
    classify_ed_encounter, compute_risk_tier, count_ed_visits, has_ed_history, summarize,
    summarize_with, RiskConvention, RiskService, RiskSummary, RiskTier,
};
pub use schedule::{
    resolve_medication_schedule, resolve_schedule_from_text, resolve_schedule_from_timing,
    resolve_text, ScheduleKind, ScheduleResolution,
};

// Re-export the value types callers need to build inputs.
pub use carewatch_types::{ClockTime, Label};
pub use fhir::{ClinicalHistory, ConditionData, EncounterData, MedicationData, TimingData};
