//! # API REST
//!
//! REST API implementation for CareWatch.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON bodies, CORS, status codes)
//!
//! Uses `api-shared` for request/response types and `carewatch-core` for the computations.
//! The router is built by [`router`] so that the standalone binary, the workspace's
//! `carewatch-run` binary and the tests all serve the same endpoints.

#![warn(rust_2018_idioms)]

use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use chrono::{Timelike, Utc};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use api_shared::{
    parse_schedule, AdherenceRateReq, AdherenceRateRes, ComplexityReq, ComplexityRes,
    DoseEventDto, HealthRes, HealthService, MedicationScheduleRes, NextDoseReq, NextDoseRes,
    OverdueReq, OverdueRes, RiskSummaryReq, RiskSummaryRes, ScheduleTextReq, ScheduleTextRes,
    ScheduleTimingRes,
};
use carewatch_core::{
    adherence_rate, constants::MAX_OVERDUE_GRACE_MINUTES, is_complex_schedule, next_dose_time,
    overdue_doses_with_grace, resolve_medication_schedule, resolve_schedule_from_timing,
    resolve_text, AdherenceService, ClockTime, CoreConfig, RiskService,
};

type ApiError = (StatusCode, &'static str);

/// Application state for the REST API server
///
/// Holds the configured core services shared by every request handler.
#[derive(Clone)]
pub struct AppState {
    cfg: Arc<CoreConfig>,
    risk_service: RiskService,
    adherence_service: AdherenceService,
}

impl AppState {
    pub fn new(cfg: Arc<CoreConfig>) -> Self {
        Self {
            risk_service: RiskService::new(cfg.clone()),
            adherence_service: AdherenceService::new(cfg.clone()),
            cfg,
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        risk_summary,
        schedule_text,
        schedule_timing,
        schedule_medication,
        schedule_complexity,
        next_dose,
        overdue,
        rate,
    ),
    components(schemas(
        HealthRes,
        RiskSummaryReq,
        RiskSummaryRes,
        ScheduleTextReq,
        ScheduleTextRes,
        ScheduleTimingRes,
        MedicationScheduleRes,
        ComplexityReq,
        ComplexityRes,
        NextDoseReq,
        NextDoseRes,
        OverdueReq,
        OverdueRes,
        DoseEventDto,
        AdherenceRateReq,
        AdherenceRateRes,
    ))
)]
pub struct ApiDoc;

/// Build the REST router with OpenAPI docs and permissive CORS.
pub fn router(cfg: Arc<CoreConfig>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/risk/summary", post(risk_summary))
        .route("/schedule/text", post(schedule_text))
        .route("/schedule/timing", post(schedule_timing))
        .route("/schedule/medication", post(schedule_medication))
        .route("/schedule/complexity", post(schedule_complexity))
        .route("/adherence/next-dose", post(next_dose))
        .route("/adherence/overdue", post(overdue))
        .route("/adherence/rate", post(rate))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(AppState::new(cfg))
}

/// Current UTC time of day.
fn clock_now() -> ClockTime {
    let now = Utc::now();
    ClockTime::from_minutes(now.hour() * 60 + now.minute())
}

/// Parse an optional `"HH:MM"` value, defaulting to the current time of day.
fn now_or_current(now: Option<&str>) -> Result<ClockTime, ApiError> {
    match now {
        Some(text) => text.trim().parse().map_err(|e| {
            tracing::error!("Invalid now value: {:?}", e);
            (StatusCode::BAD_REQUEST, "Invalid now time")
        }),
        None => Ok(clock_now()),
    }
}

fn schedule_from(times: &[String]) -> Result<Vec<ClockTime>, ApiError> {
    parse_schedule(times).map_err(|e| {
        tracing::error!("Invalid schedule: {:?}", e);
        (StatusCode::BAD_REQUEST, "Invalid schedule time")
    })
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for the REST API
///
/// Used for monitoring and load balancer health checks.
#[axum::debug_handler]
async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthService::check_health())
}

#[utoipa::path(
    post,
    path = "/risk/summary",
    request_body = RiskSummaryReq,
    responses(
        (status = 200, description = "Risk summary", body = RiskSummaryRes),
        (status = 400, description = "Bad request")
    )
)]
/// Summarise a patient's ED-utilisation risk
///
/// Accepts a FHIR searchset bundle and/or separate resource arrays. Resources that cannot be
/// read are skipped and counted; only a malformed bundle is rejected.
///
/// # Errors
/// Returns `400 Bad Request` if:
/// - `bundle` is present but is not a FHIR Bundle.
#[axum::debug_handler]
async fn risk_summary(
    State(state): State<AppState>,
    Json(req): Json<RiskSummaryReq>,
) -> Result<Json<RiskSummaryRes>, ApiError> {
    let history = match req.history() {
        Ok(history) => history,
        Err(e) => {
            tracing::error!("Risk summary input error: {:?}", e);
            return Err((StatusCode::BAD_REQUEST, "Invalid FHIR bundle"));
        }
    };

    let reference_time = req.reference_time.unwrap_or_else(Utc::now);
    let summary = state.risk_service.summarize(&history, reference_time);
    Ok(Json(RiskSummaryRes::new(summary, &history)))
}

#[utoipa::path(
    post,
    path = "/schedule/text",
    request_body = ScheduleTextReq,
    responses(
        (status = 200, description = "Resolved schedule", body = ScheduleTextRes)
    )
)]
/// Resolve a free-text dosage instruction to daily times
///
/// Never fails: unrecognised text yields `UNRECOGNIZED` with no times.
#[axum::debug_handler]
async fn schedule_text(
    State(_state): State<AppState>,
    Json(req): Json<ScheduleTextReq>,
) -> Json<ScheduleTextRes> {
    Json(resolve_text(&req.text).into())
}

#[utoipa::path(
    post,
    path = "/schedule/timing",
    request_body = serde_json::Value,
    responses(
        (status = 200, description = "Resolved schedule", body = ScheduleTimingRes),
        (status = 400, description = "Bad request")
    )
)]
/// Resolve a FHIR `Timing` datatype to daily times
///
/// # Errors
/// Returns `400 Bad Request` if:
/// - the body does not match the `Timing` shape.
#[axum::debug_handler]
async fn schedule_timing(
    State(_state): State<AppState>,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<ScheduleTimingRes>, ApiError> {
    match fhir::Timing::from_value(&body) {
        Ok(timing) => {
            let times = resolve_schedule_from_timing(&timing);
            Ok(Json(times.as_slice().into()))
        }
        Err(e) => {
            tracing::error!("Timing translation error: {:?}", e);
            Err((StatusCode::BAD_REQUEST, "Invalid FHIR Timing"))
        }
    }
}

#[utoipa::path(
    post,
    path = "/schedule/medication",
    request_body = serde_json::Value,
    responses(
        (status = 200, description = "Combined medication schedule", body = MedicationScheduleRes),
        (status = 400, description = "Bad request")
    )
)]
/// Resolve every dosage instruction of a FHIR `MedicationRequest`
///
/// # Errors
/// Returns `400 Bad Request` if:
/// - the body is not a `MedicationRequest`.
#[axum::debug_handler]
async fn schedule_medication(
    State(_state): State<AppState>,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<MedicationScheduleRes>, ApiError> {
    match fhir::MedicationRequest::from_value(&body) {
        Ok(medication) => {
            let times = resolve_medication_schedule(&medication);
            Ok(Json(MedicationScheduleRes::new(&medication, &times)))
        }
        Err(e) => {
            tracing::error!("MedicationRequest translation error: {:?}", e);
            Err((StatusCode::BAD_REQUEST, "Invalid FHIR MedicationRequest"))
        }
    }
}

#[utoipa::path(
    post,
    path = "/schedule/complexity",
    request_body = ComplexityReq,
    responses(
        (status = 200, description = "Complexity flag", body = ComplexityRes),
        (status = 400, description = "Bad request")
    )
)]
/// Flag a schedule that is hard to follow (too many doses or uneven gaps)
///
/// # Errors
/// Returns `400 Bad Request` if any schedule time is malformed.
#[axum::debug_handler]
async fn schedule_complexity(
    State(_state): State<AppState>,
    Json(req): Json<ComplexityReq>,
) -> Result<Json<ComplexityRes>, ApiError> {
    let schedule = schedule_from(&req.schedule)?;
    Ok(Json(ComplexityRes {
        complex: is_complex_schedule(&schedule),
        doses: schedule.len(),
    }))
}

#[utoipa::path(
    post,
    path = "/adherence/next-dose",
    request_body = NextDoseReq,
    responses(
        (status = 200, description = "Next dose", body = NextDoseRes),
        (status = 400, description = "Bad request")
    )
)]
/// Find the next dose due after `now`
///
/// # Errors
/// Returns `400 Bad Request` if:
/// - any schedule entry or `now` is not an `HH:MM` time.
#[axum::debug_handler]
async fn next_dose(
    State(_state): State<AppState>,
    Json(req): Json<NextDoseReq>,
) -> Result<Json<NextDoseRes>, ApiError> {
    let schedule = schedule_from(&req.schedule)?;
    let now = now_or_current(req.now.as_deref())?;
    Ok(Json(next_dose_time(&schedule, now).into()))
}

#[utoipa::path(
    post,
    path = "/adherence/overdue",
    request_body = OverdueReq,
    responses(
        (status = 200, description = "Overdue doses", body = OverdueRes),
        (status = 400, description = "Bad request")
    )
)]
/// List the scheduled doses that are overdue at `now`
///
/// Uses the configured grace period unless the request supplies one.
///
/// # Errors
/// Returns `400 Bad Request` if:
/// - any time is malformed, or
/// - `graceMinutes` exceeds one day.
#[axum::debug_handler]
async fn overdue(
    State(state): State<AppState>,
    Json(req): Json<OverdueReq>,
) -> Result<Json<OverdueRes>, ApiError> {
    let schedule = schedule_from(&req.schedule)?;
    let now = now_or_current(req.now.as_deref())?;

    let (overdue, grace_minutes) = match req.grace_minutes {
        Some(grace) if grace > MAX_OVERDUE_GRACE_MINUTES => {
            tracing::error!("Grace period out of range: {}", grace);
            return Err((StatusCode::BAD_REQUEST, "Grace period exceeds one day"));
        }
        Some(grace) => (overdue_doses_with_grace(&schedule, now, grace), grace),
        None => (
            state.adherence_service.overdue_doses(&schedule, now),
            state.cfg.overdue_grace_minutes(),
        ),
    };

    Ok(Json(OverdueRes {
        overdue: overdue.iter().map(ToString::to_string).collect(),
        grace_minutes,
    }))
}

#[utoipa::path(
    post,
    path = "/adherence/rate",
    request_body = AdherenceRateReq,
    responses(
        (status = 200, description = "Adherence rate", body = AdherenceRateRes),
        (status = 400, description = "Bad request")
    )
)]
/// Compute an adherence percentage
///
/// With nothing recorded the rate is 100.
#[axum::debug_handler]
async fn rate(
    State(_state): State<AppState>,
    Json(req): Json<AdherenceRateReq>,
) -> Result<Json<AdherenceRateRes>, ApiError> {
    let (taken, missed) = req.counts().map_err(|e| {
        tracing::error!("Invalid dose event: {:?}", e);
        (StatusCode::BAD_REQUEST, "Invalid dose event")
    })?;

    Ok(Json(AdherenceRateRes {
        rate: adherence_rate(taken, missed),
        taken,
        missed,
    }))
}
