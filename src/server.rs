//! Web server module for Tally.
//!
//! JSON API over the [`Warehouse`]: register services and metrics, record
//! events with measurements, and report a metric's values over a period.

use axum::{
    Json, Router,
    extract::{Path, Query, State, rejection::JsonRejection, rejection::QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    LatencyUnit,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::entity::{Event, Measurement, Metric, MetricRow, Service, TimeRange, Timestamp};
use crate::storage::StorageError;
use crate::warehouse::Warehouse;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub warehouse: Warehouse,
}

/// Health check response.
#[derive(Serialize)]
struct HealthResponse {
    status: String,
}

/// Body of `POST /services`.
#[derive(Debug, Deserialize)]
pub struct CreateServiceRequest {
    pub slug: String,
    pub details: String,
}

/// Body of `POST /metrics`.
#[derive(Debug, Deserialize)]
pub struct CreateMetricRequest {
    pub slug: String,
    pub metric_type: String,
    pub details: String,
}

/// Body of `POST /events`.
#[derive(Debug, Deserialize)]
pub struct CreateEventRequest {
    pub service_id: i64,
    /// Defaults to the time the request is handled.
    #[serde(default)]
    pub time_stamp: Option<Timestamp>,
    #[serde(default)]
    pub metrics: Vec<Measurement>,
}

#[derive(Debug, Serialize)]
struct CreateEventResponse {
    event: Event,
    metrics: Vec<Measurement>,
}

/// Query parameters of `GET /events`.
///
/// `start` and `end` are RFC 3339. A `+hh:mm` offset must be sent
/// percent-encoded (`%2B07:00`), since a bare `+` decodes to a space; the
/// `Z` form needs no escaping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportParams {
    pub service_id: i64,
    pub metric_id: i64,
    pub start: Timestamp,
    pub end: Timestamp,
}

#[derive(Debug, Serialize)]
struct ReportResponse {
    request: ReportParams,
    report: Vec<MetricRow>,
}

// =============================================================================
// Errors
// =============================================================================

/// Handler failure rendered as `{"error": "..."}`.
#[derive(Debug)]
pub enum ApiError {
    /// Malformed request before reaching the warehouse.
    BadRequest(String),
    /// Failure reported by the warehouse.
    Storage(StorageError),
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        Self::Storage(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Storage(StorageError::Validation(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Storage(StorageError::NotFound(_)) => StatusCode::NOT_FOUND,
            Self::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            Self::BadRequest(msg) => msg.clone(),
            Self::Storage(err) => err.to_string(),
        };

        if status.is_server_error() {
            tracing::error!(%status, error = %message, "Request failed");
        } else {
            tracing::warn!(%status, error = %message, "Request rejected");
        }

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

// =============================================================================
// Router
// =============================================================================

/// Create the Axum router with all routes.
pub fn create_router(state: AppState) -> Router {
    let app_state = Arc::new(state);

    let trace = TraceLayer::new_for_http()
        .make_span_with(|req: &axum::http::Request<_>| {
            let req_id = req
                .headers()
                .get("x-request-id")
                .and_then(|v| v.to_str().ok())
                .unwrap_or("-");
            tracing::info_span!(
                "http_request",
                method = %req.method(),
                uri = %req.uri(),
                req_id
            )
        })
        .on_request(DefaultOnRequest::new().level(Level::INFO))
        .on_response(
            DefaultOnResponse::new()
                .level(Level::INFO)
                .latency_unit(LatencyUnit::Millis),
        );

    Router::new()
        .route("/healthz", get(healthz_handler))
        .route("/services", post(create_service_handler))
        .route("/services/{id}", get(find_service_handler))
        .route("/metrics", post(create_metric_handler))
        .route("/metrics/{id}", get(find_metric_handler))
        .route("/events", post(create_event_handler).get(report_handler))
        .layer(CorsLayer::permissive())
        .layer(trace)
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .with_state(app_state)
}

// =============================================================================
// Handlers
// =============================================================================

/// Liveness probe.
async fn healthz_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

async fn create_service_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateServiceRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Service>)> {
    let Json(req) = payload?;
    let service = state
        .warehouse
        .create_service(Service::new(req.slug, req.details))
        .await?;
    Ok((StatusCode::CREATED, Json(service)))
}

async fn find_service_handler(
    State(state): State<Arc<AppState>>,
    Path(service_id): Path<i64>,
) -> ApiResult<Json<Service>> {
    Ok(Json(state.warehouse.find_service(service_id).await?))
}

async fn create_metric_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateMetricRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Metric>)> {
    let Json(req) = payload?;
    let metric = Metric {
        metric_id: 0,
        slug: req.slug,
        metric_type: req.metric_type,
        details: req.details,
    };
    let metric = state.warehouse.create_metric(metric).await?;
    Ok((StatusCode::CREATED, Json(metric)))
}

async fn find_metric_handler(
    State(state): State<Arc<AppState>>,
    Path(metric_id): Path<i64>,
) -> ApiResult<Json<Metric>> {
    Ok(Json(state.warehouse.find_metric(metric_id).await?))
}

/// Create an event and attach its measurements.
async fn create_event_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateEventRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<CreateEventResponse>)> {
    let Json(req) = payload?;
    let event = match req.time_stamp {
        Some(ts) => Event::at(req.service_id, ts),
        None => Event::new(req.service_id),
    };

    let event = state.warehouse.create_event(event).await?;
    state
        .warehouse
        .attach_measurements(event.event_id, &req.metrics)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateEventResponse {
            event,
            metrics: req.metrics,
        }),
    ))
}

/// Values of one metric for one service over `[start, end)`.
///
/// See [`ReportParams`] for how offsets are written in the query string.
async fn report_handler(
    State(state): State<Arc<AppState>>,
    params: Result<Query<ReportParams>, QueryRejection>,
) -> ApiResult<Json<ReportResponse>> {
    let Query(params) = params?;
    let range = TimeRange::new(params.start, params.end);
    if range.is_empty() {
        return Err(ApiError::BadRequest("invalid period".to_string()));
    }

    state.warehouse.find_service(params.service_id).await?;
    let metric = state.warehouse.find_metric(params.metric_id).await?;
    let report = state
        .warehouse
        .query_range(params.service_id, range, &metric)
        .await?;

    Ok(Json(ReportResponse {
        request: params,
        report,
    }))
}
