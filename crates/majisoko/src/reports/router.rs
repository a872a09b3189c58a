use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::{GeoPoint, ReportStatus, ReportType};
use super::repository::ReportRepository;
use super::service::{ReportError, ReportService};
use crate::identity::{ReportId, UserId};
use crate::notify::NotificationPublisher;
use crate::store::{ReputationLedger, StoreError};

#[derive(Debug, Deserialize)]
pub struct FileReportRequest {
    pub reporter: UserId,
    pub report_type: ReportType,
    pub location: GeoPoint,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ResolveRequest {
    pub admin: UserId,
    pub resolution: String,
}

#[derive(Debug, Deserialize)]
pub struct AdvanceRequest {
    pub status: ReportStatus,
}

/// Router builder exposing the report endpoints.
pub fn report_router<R, N, L>(service: Arc<ReportService<R, N, L>>) -> Router
where
    R: ReportRepository + 'static,
    N: NotificationPublisher + 'static,
    L: ReputationLedger + 'static,
{
    Router::new()
        .route("/api/v1/reports", post(file_handler::<R, N, L>))
        .route("/api/v1/reports/:report_id", get(get_handler::<R, N, L>))
        .route(
            "/api/v1/reports/:report_id/status",
            post(advance_handler::<R, N, L>),
        )
        .route(
            "/api/v1/reports/:report_id/resolve",
            post(resolve_handler::<R, N, L>),
        )
        .with_state(service)
}

async fn file_handler<R, N, L>(
    State(service): State<Arc<ReportService<R, N, L>>>,
    axum::Json(request): axum::Json<FileReportRequest>,
) -> Response
where
    R: ReportRepository + 'static,
    N: NotificationPublisher + 'static,
    L: ReputationLedger + 'static,
{
    if !(-90.0..=90.0).contains(&request.location.latitude)
        || !(-180.0..=180.0).contains(&request.location.longitude)
    {
        let payload = json!({
            "error": "location is outside coordinate bounds",
        });
        return (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response();
    }

    match service.file(
        request.reporter,
        request.report_type,
        request.location,
        request.description,
    ) {
        Ok(record) => (StatusCode::CREATED, axum::Json(record.view())).into_response(),
        Err(error) => error_response(error),
    }
}

async fn get_handler<R, N, L>(
    State(service): State<Arc<ReportService<R, N, L>>>,
    Path(report_id): Path<String>,
) -> Response
where
    R: ReportRepository + 'static,
    N: NotificationPublisher + 'static,
    L: ReputationLedger + 'static,
{
    match service.get(&ReportId(report_id)) {
        Ok(record) => (StatusCode::OK, axum::Json(record.view())).into_response(),
        Err(error) => error_response(error),
    }
}

async fn advance_handler<R, N, L>(
    State(service): State<Arc<ReportService<R, N, L>>>,
    Path(report_id): Path<String>,
    axum::Json(request): axum::Json<AdvanceRequest>,
) -> Response
where
    R: ReportRepository + 'static,
    N: NotificationPublisher + 'static,
    L: ReputationLedger + 'static,
{
    match service.advance(&ReportId(report_id), request.status) {
        Ok(record) => (StatusCode::OK, axum::Json(record.view())).into_response(),
        Err(error) => error_response(error),
    }
}

async fn resolve_handler<R, N, L>(
    State(service): State<Arc<ReportService<R, N, L>>>,
    Path(report_id): Path<String>,
    axum::Json(request): axum::Json<ResolveRequest>,
) -> Response
where
    R: ReportRepository + 'static,
    N: NotificationPublisher + 'static,
    L: ReputationLedger + 'static,
{
    match service.resolve(&ReportId(report_id), request.admin, request.resolution) {
        Ok(record) => (StatusCode::OK, axum::Json(record.view())).into_response(),
        Err(error) => error_response(error),
    }
}

fn error_response(error: ReportError) -> Response {
    match error {
        error @ (ReportError::DuplicateReport
        | ReportError::AlreadyResolved
        | ReportError::InvalidStatusChange { .. }
        | ReportError::Store(StoreError::Conflict)
        | ReportError::Store(StoreError::VersionConflict)) => {
            let payload = json!({
                "error": error.to_string(),
            });
            (StatusCode::CONFLICT, axum::Json(payload)).into_response()
        }
        ReportError::Store(StoreError::NotFound) => {
            let payload = json!({
                "error": "report not found",
            });
            (StatusCode::NOT_FOUND, axum::Json(payload)).into_response()
        }
        other => {
            let payload = json!({
                "error": other.to_string(),
            });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}
