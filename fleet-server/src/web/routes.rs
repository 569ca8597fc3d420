//! HTTP route handlers.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
};

use crate::domain::{BusId, DateRange, DepotId};
use crate::engine::{EngineError, MassOptions, RunOptions};
use crate::store::TransitStore;

use super::dto::*;
use super::state::AppState;

/// Create the application router.
pub fn create_router<S: TransitStore + 'static>(state: AppState<S>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/schedule/run", post(schedule_run))
        .route("/schedule/bus/:bus_id", post(schedule_bus))
        .route("/schedule/preview", get(preview))
        .route("/schedule/mass", post(mass_schedule))
        .route("/schedule/stop", post(stop_run))
        .route("/schedule/status", get(run_state))
        .route("/schedule/clear", delete(clear_schedule))
        .route("/continuous/start", post(continuous_start))
        .route("/continuous/stop", post(continuous_stop))
        .route("/continuous/status", get(continuous_status))
        .with_state(state)
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// Parse and validate a date range from request fields.
fn parse_range(start: chrono::NaiveDate, end: chrono::NaiveDate) -> Result<DateRange, AppError> {
    DateRange::new(start, end).map_err(|e| AppError::BadRequest {
        message: e.to_string(),
    })
}

/// Run the multi-day orchestrator.
async fn schedule_run<S: TransitStore + 'static>(
    State(state): State<AppState<S>>,
    Json(req): Json<RunRequest>,
) -> Result<Json<RunSummaryResponse>, AppError> {
    let range = parse_range(req.start_date, req.end_date)?;
    let scope = req.depot_id.map(DepotId::new);
    let options = RunOptions {
        dry_run: req.dry_run,
    };

    let summary = state
        .scheduler
        .schedule_all(scope.as_ref(), &range, options)
        .await?;
    Ok(Json(summary.into()))
}

/// Schedule a single bus over a date range.
async fn schedule_bus<S: TransitStore + 'static>(
    State(state): State<AppState<S>>,
    Path(bus_id): Path<String>,
    Json(req): Json<BusRunRequest>,
) -> Result<Json<BusRunResponse>, AppError> {
    let range = parse_range(req.start_date, req.end_date)?;
    let outcome = state
        .scheduler
        .schedule_bus(&BusId::new(bus_id), &range, RunOptions::default())
        .await?;
    Ok(Json(outcome.into()))
}

/// Dry-run preview: counts only, no writes.
async fn preview<S: TransitStore + 'static>(
    State(state): State<AppState<S>>,
    Query(req): Query<PreviewQuery>,
) -> Result<Json<RunSummaryResponse>, AppError> {
    let range = parse_range(req.start_date, req.end_date)?;
    let scope = req.depot_id.map(DepotId::new);
    let summary = state.scheduler.preview(scope.as_ref(), &range).await?;
    Ok(Json(summary.into()))
}

/// Single-date bulk scheduling across depots.
async fn mass_schedule<S: TransitStore + 'static>(
    State(state): State<AppState<S>>,
    Json(req): Json<MassRequest>,
) -> Result<Json<MassResponse>, AppError> {
    let mut options = MassOptions::for_date(req.date);
    if let Some(depot_ids) = req.depot_ids {
        options.depots = depot_ids.into_iter().map(DepotId::new).collect();
    }
    if let Some(v) = req.max_trips_per_route {
        options.max_trips_per_route = v;
    }
    if let Some(v) = req.max_trips_per_bus {
        options.max_trips_per_bus = v;
    }
    if let Some(v) = req.time_gap_minutes {
        options.time_gap_minutes = v;
    }
    if let Some(v) = req.auto_assign_crew {
        options.auto_assign_crew = v;
    }
    if let Some(v) = req.auto_assign_buses {
        options.auto_assign_buses = v;
    }

    let outcome = state.scheduler.mass_schedule(&options).await?;
    Ok(Json(outcome.into()))
}

/// Request a cooperative stop of the active run.
async fn stop_run<S: TransitStore + 'static>(
    State(state): State<AppState<S>>,
) -> Json<StopResponse> {
    let stopping = state.scheduler.control().request_stop();
    Json(StopResponse { stopping })
}

/// Current engine run state.
async fn run_state<S: TransitStore + 'static>(
    State(state): State<AppState<S>>,
) -> Json<RunStateResponse> {
    Json(RunStateResponse {
        state: state.scheduler.control().state().to_string(),
    })
}

/// Delete scheduled trips in a date range.
async fn clear_schedule<S: TransitStore + 'static>(
    State(state): State<AppState<S>>,
    Json(req): Json<ClearRequest>,
) -> Result<Json<ClearResponse>, AppError> {
    let range = parse_range(req.start_date, req.end_date)?;
    let depot = req.depot_id.map(DepotId::new);
    let deleted = state.scheduler.clear(&range, depot.as_ref()).await?;
    Ok(Json(ClearResponse { deleted }))
}

/// Start the periodic driver.
async fn continuous_start<S: TransitStore + 'static>(
    State(state): State<AppState<S>>,
) -> Json<ContinuousStatusResponse> {
    state.continuous.start();
    Json(state.continuous.status().into())
}

/// Stop the periodic driver.
async fn continuous_stop<S: TransitStore + 'static>(
    State(state): State<AppState<S>>,
) -> Json<ContinuousStatusResponse> {
    state.continuous.stop();
    Json(state.continuous.status().into())
}

/// Periodic driver status.
async fn continuous_status<S: TransitStore + 'static>(
    State(state): State<AppState<S>>,
) -> Json<ContinuousStatusResponse> {
    Json(state.continuous.status().into())
}

/// Application error responses.
#[derive(Debug)]
pub enum AppError {
    BadRequest { message: String },
    NotFound { message: String },
    Conflict { message: String },
    Internal { message: String },
}

impl From<EngineError> for AppError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Validation(message) => AppError::BadRequest { message },
            EngineError::BusNotFound(_) => AppError::NotFound {
                message: err.to_string(),
            },
            EngineError::RunInProgress => AppError::Conflict {
                message: err.to_string(),
            },
            EngineError::Store(_) => AppError::Internal {
                message: err.to_string(),
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::BadRequest { message } => (StatusCode::BAD_REQUEST, message),
            AppError::NotFound { message } => (StatusCode::NOT_FOUND, message),
            AppError::Conflict { message } => (StatusCode::CONFLICT, message),
            AppError::Internal { message } => (StatusCode::INTERNAL_SERVER_ERROR, message),
        };

        tracing::error!(status = %status, %message, "request failed");

        let body = Json(ErrorResponse { error: message });
        (status, body).into_response()
    }
}
