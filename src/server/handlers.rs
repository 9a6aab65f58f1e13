use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, MutexGuard};
use std::time::Instant;

use crate::location::{Coordinates, LocationRecord, PostalCode};
use crate::session::{BatchOutcome, Session, SessionSummary};
use crate::zones::Zone;

use super::state::AppState;

// ─── Error response ──────────────────────────────────────────────

#[derive(Serialize)]
struct ApiErrorBody {
    error: String,
    code: u16,
}

#[derive(Debug)]
pub struct ApiError(StatusCode, String);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiErrorBody {
            error: self.1,
            code: self.0.as_u16(),
        };
        (self.0, Json(body)).into_response()
    }
}

fn api_error(status: StatusCode, msg: impl Into<String>) -> ApiError {
    ApiError(status, msg.into())
}

fn lock_session(state: &AppState) -> Result<MutexGuard<'_, Session>, ApiError> {
    state
        .session
        .lock()
        .map_err(|_| api_error(StatusCode::INTERNAL_SERVER_ERROR, "session state poisoned"))
}

// ─── GET /api/locations ──────────────────────────────────────────

pub async fn list_locations(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<LocationRecord>>, ApiError> {
    let session = lock_session(&state)?;
    Ok(Json(session.records().to_vec()))
}

// ─── POST /api/locations ─────────────────────────────────────────

#[derive(Deserialize)]
pub struct AddRequest {
    pub ceps: String,
}

#[derive(Serialize)]
pub struct OutcomeBody {
    pub input: String,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record: Option<LocationRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl From<BatchOutcome> for OutcomeBody {
    fn from(outcome: BatchOutcome) -> Self {
        match outcome.result {
            Ok(record) => Self {
                input: outcome.input,
                status: "added",
                record: Some(record),
                message: None,
            },
            Err(e) => Self {
                input: outcome.input,
                status: e.kind(),
                record: None,
                message: Some(e.to_string()),
            },
        }
    }
}

#[derive(Serialize)]
pub struct AddResponse {
    pub results: Vec<OutcomeBody>,
    pub count: usize,
}

pub async fn add_locations(
    State(state): State<Arc<AppState>>,
    Json(body): Json<AddRequest>,
) -> Result<Json<AddResponse>, ApiError> {
    let start = Instant::now();

    // Resolution does blocking HTTP; keep it off the async workers.
    let worker = Arc::clone(&state);
    let input = body.ceps.clone();
    let (outcomes, count) = tokio::task::spawn_blocking(move || {
        let mut session = lock_session(&worker)?;
        let outcomes = session
            .add_batch(&input)
            .map_err(|e| api_error(StatusCode::BAD_REQUEST, e.to_string()))?;
        let count = session.records().len();
        Ok::<_, ApiError>((outcomes, count))
    })
    .await
    .map_err(|e| api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))??;

    let added = outcomes.iter().filter(|o| o.result.is_ok()).count();
    tracing::info!(
        "POST /api/locations -> {}/{} added ({:.1}ms)",
        added,
        outcomes.len(),
        start.elapsed().as_secs_f64() * 1000.0,
    );

    Ok(Json(AddResponse {
        results: outcomes.into_iter().map(OutcomeBody::from).collect(),
        count,
    }))
}

// ─── DELETE /api/locations/{index} ───────────────────────────────

pub async fn remove_location(
    State(state): State<Arc<AppState>>,
    Path(index): Path<usize>,
) -> Result<Json<LocationRecord>, ApiError> {
    let mut session = lock_session(&state)?;
    let removed = session.remove(index).ok_or_else(|| {
        api_error(StatusCode::NOT_FOUND, format!("no location at index {}", index))
    })?;
    tracing::info!("DELETE /api/locations/{} -> {}", index, removed.postal_code);
    Ok(Json(removed))
}

// ─── GET /api/summary ────────────────────────────────────────────

pub async fn summary(State(state): State<Arc<AppState>>) -> Result<Json<SessionSummary>, ApiError> {
    let session = lock_session(&state)?;
    Ok(Json(session.summary()))
}

// ─── GET /api/classify ───────────────────────────────────────────

#[derive(Deserialize)]
pub struct ClassifyQuery {
    pub cep: Option<String>,
    pub neighborhood: Option<String>,
    pub city: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

#[derive(Serialize)]
pub struct ClassifyResponse {
    pub postal_code: String,
    pub zone: Zone,
}

pub async fn classify(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ClassifyQuery>,
) -> Result<Json<ClassifyResponse>, ApiError> {
    let raw = params.cep.as_deref().unwrap_or("");
    let cep = PostalCode::parse(raw).map_err(|e| api_error(StatusCode::BAD_REQUEST, e.to_string()))?;

    let coords = Coordinates {
        lat: params.lat.unwrap_or_default(),
        lon: params.lon.unwrap_or_default(),
    };

    let zone = state.classifier.classify(
        cep.as_str(),
        params.neighborhood.as_deref().unwrap_or(""),
        params.city.as_deref().unwrap_or(""),
        coords,
    );

    Ok(Json(ClassifyResponse {
        postal_code: cep.hyphenated(),
        zone,
    }))
}
