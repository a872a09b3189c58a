use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;

use super::domain::{AlertActor, AlertType, ScoutProfile};
use super::repository::AlertRepository;
use super::service::{AlertError, AlertService};
use crate::identity::{AlertId, ZoneId};
use crate::notify::NotificationPublisher;
use crate::store::{ReputationLedger, StoreError};

#[derive(Debug, Deserialize)]
pub struct PostAlertRequest {
    pub zone: ZoneId,
    pub scout: ScoutProfile,
    pub alert_type: AlertType,
    pub eta: Option<DateTime<Utc>>,
    pub duration_minutes: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct FeedbackRequest {
    pub accurate: bool,
}

#[derive(Debug, Deserialize)]
pub struct CancelAlertRequest {
    pub actor: AlertActor,
}

/// Router builder exposing the alert endpoints.
pub fn alert_router<R, N, L>(service: Arc<AlertService<R, N, L>>) -> Router
where
    R: AlertRepository + 'static,
    N: NotificationPublisher + 'static,
    L: ReputationLedger + 'static,
{
    Router::new()
        .route("/api/v1/alerts", post(post_handler::<R, N, L>))
        .route("/api/v1/alerts/:alert_id", get(get_handler::<R, N, L>))
        .route(
            "/api/v1/alerts/:alert_id/feedback",
            post(feedback_handler::<R, N, L>),
        )
        .route(
            "/api/v1/alerts/:alert_id/cancel",
            post(cancel_handler::<R, N, L>),
        )
        .route(
            "/api/v1/alerts/zone/:zone_id",
            get(zone_handler::<R, N, L>),
        )
        .with_state(service)
}

async fn post_handler<R, N, L>(
    State(service): State<Arc<AlertService<R, N, L>>>,
    axum::Json(request): axum::Json<PostAlertRequest>,
) -> Response
where
    R: AlertRepository + 'static,
    N: NotificationPublisher + 'static,
    L: ReputationLedger + 'static,
{
    match service.post(
        request.zone,
        &request.scout,
        request.alert_type,
        request.eta,
        request.duration_minutes,
    ) {
        Ok(record) => (StatusCode::CREATED, axum::Json(record.view())).into_response(),
        Err(error) => error_response(error),
    }
}

async fn get_handler<R, N, L>(
    State(service): State<Arc<AlertService<R, N, L>>>,
    Path(alert_id): Path<String>,
) -> Response
where
    R: AlertRepository + 'static,
    N: NotificationPublisher + 'static,
    L: ReputationLedger + 'static,
{
    match service.get(&AlertId(alert_id)) {
        Ok(record) => (StatusCode::OK, axum::Json(record.view())).into_response(),
        Err(error) => error_response(error),
    }
}

async fn feedback_handler<R, N, L>(
    State(service): State<Arc<AlertService<R, N, L>>>,
    Path(alert_id): Path<String>,
    axum::Json(request): axum::Json<FeedbackRequest>,
) -> Response
where
    R: AlertRepository + 'static,
    N: NotificationPublisher + 'static,
    L: ReputationLedger + 'static,
{
    match service.submit_feedback(&AlertId(alert_id), request.accurate) {
        Ok(record) => (StatusCode::OK, axum::Json(record.view())).into_response(),
        Err(error) => error_response(error),
    }
}

async fn cancel_handler<R, N, L>(
    State(service): State<Arc<AlertService<R, N, L>>>,
    Path(alert_id): Path<String>,
    axum::Json(request): axum::Json<CancelAlertRequest>,
) -> Response
where
    R: AlertRepository + 'static,
    N: NotificationPublisher + 'static,
    L: ReputationLedger + 'static,
{
    match service.cancel(&AlertId(alert_id), &request.actor) {
        Ok(record) => (StatusCode::OK, axum::Json(record.view())).into_response(),
        Err(error) => error_response(error),
    }
}

async fn zone_handler<R, N, L>(
    State(service): State<Arc<AlertService<R, N, L>>>,
    Path(zone_id): Path<String>,
) -> Response
where
    R: AlertRepository + 'static,
    N: NotificationPublisher + 'static,
    L: ReputationLedger + 'static,
{
    match service.zone_feed(&ZoneId(zone_id)) {
        Ok(records) => {
            let views: Vec<_> = records.iter().map(|record| record.view()).collect();
            (StatusCode::OK, axum::Json(views)).into_response()
        }
        Err(error) => error_response(error),
    }
}

fn error_response(error: AlertError) -> Response {
    match error {
        AlertError::ScoutNotVerified => {
            let payload = json!({
                "error": error.to_string(),
            });
            (StatusCode::FORBIDDEN, axum::Json(payload)).into_response()
        }
        error @ (AlertError::AlertClosed { .. }
        | AlertError::Store(StoreError::Conflict)
        | AlertError::Store(StoreError::VersionConflict)) => {
            let payload = json!({
                "error": error.to_string(),
            });
            (StatusCode::CONFLICT, axum::Json(payload)).into_response()
        }
        AlertError::Forbidden(message) => {
            let payload = json!({
                "error": message,
            });
            (StatusCode::FORBIDDEN, axum::Json(payload)).into_response()
        }
        AlertError::Store(StoreError::NotFound) => {
            let payload = json!({
                "error": "alert not found",
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
