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

use super::domain::{OrderActor, OrderStatus, PaymentProvider, VendorSnapshot};
use super::pricing::{LineItemRequest, PricingError};
use super::repository::OrderRepository;
use super::service::{OrderError, OrderService, PaymentOutcome};
use crate::identity::{OrderId, UserId};
use crate::notify::NotificationPublisher;
use crate::store::{ReputationLedger, StoreError};

#[derive(Debug, Deserialize)]
pub struct PlaceOrderRequest {
    pub customer: UserId,
    pub vendor: VendorSnapshot,
    pub items: Vec<LineItemRequest>,
}

#[derive(Debug, Deserialize)]
pub struct ActorRequest {
    pub actor: OrderActor,
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: OrderStatus,
}

#[derive(Debug, Deserialize)]
pub struct PaymentRequest {
    pub provider: PaymentProvider,
    pub outcome: PaymentOutcome,
}

#[derive(Debug, Deserialize)]
pub struct CancelRequest {
    pub actor: OrderActor,
    pub reason: String,
}

#[derive(Debug, Deserialize)]
pub struct RateRequest {
    pub actor: OrderActor,
    pub score: u8,
    pub comment: Option<String>,
}

/// Router builder exposing the order lifecycle endpoints.
pub fn order_router<R, N, L>(service: Arc<OrderService<R, N, L>>) -> Router
where
    R: OrderRepository + 'static,
    N: NotificationPublisher + 'static,
    L: ReputationLedger + 'static,
{
    Router::new()
        .route("/api/v1/orders", post(place_handler::<R, N, L>))
        .route("/api/v1/orders/:order_id", get(get_handler::<R, N, L>))
        .route(
            "/api/v1/orders/:order_id/accept",
            post(accept_handler::<R, N, L>),
        )
        .route(
            "/api/v1/orders/:order_id/payment",
            post(payment_handler::<R, N, L>),
        )
        .route(
            "/api/v1/orders/:order_id/status",
            post(status_handler::<R, N, L>),
        )
        .route(
            "/api/v1/orders/:order_id/confirm",
            post(confirm_handler::<R, N, L>),
        )
        .route(
            "/api/v1/orders/:order_id/cancel",
            post(cancel_handler::<R, N, L>),
        )
        .route(
            "/api/v1/orders/:order_id/rate",
            post(rate_handler::<R, N, L>),
        )
        .with_state(service)
}

async fn place_handler<R, N, L>(
    State(service): State<Arc<OrderService<R, N, L>>>,
    axum::Json(request): axum::Json<PlaceOrderRequest>,
) -> Response
where
    R: OrderRepository + 'static,
    N: NotificationPublisher + 'static,
    L: ReputationLedger + 'static,
{
    if request.items.is_empty() || request.items.iter().any(|item| item.quantity == 0) {
        let payload = json!({
            "error": "each order line needs a product and a quantity of at least 1",
        });
        return (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response();
    }

    match service.place(request.customer, &request.vendor, &request.items) {
        Ok(record) => {
            (StatusCode::CREATED, axum::Json(record.status_view())).into_response()
        }
        Err(error) => error_response(error),
    }
}

async fn get_handler<R, N, L>(
    State(service): State<Arc<OrderService<R, N, L>>>,
    Path(order_id): Path<String>,
) -> Response
where
    R: OrderRepository + 'static,
    N: NotificationPublisher + 'static,
    L: ReputationLedger + 'static,
{
    match service.get(&OrderId(order_id)) {
        Ok(record) => (StatusCode::OK, axum::Json(record.status_view())).into_response(),
        Err(error) => error_response(error),
    }
}

async fn accept_handler<R, N, L>(
    State(service): State<Arc<OrderService<R, N, L>>>,
    Path(order_id): Path<String>,
    axum::Json(request): axum::Json<ActorRequest>,
) -> Response
where
    R: OrderRepository + 'static,
    N: NotificationPublisher + 'static,
    L: ReputationLedger + 'static,
{
    match service.accept(&OrderId(order_id), &request.actor) {
        Ok(record) => (StatusCode::OK, axum::Json(record.status_view())).into_response(),
        Err(error) => error_response(error),
    }
}

async fn payment_handler<R, N, L>(
    State(service): State<Arc<OrderService<R, N, L>>>,
    Path(order_id): Path<String>,
    axum::Json(request): axum::Json<PaymentRequest>,
) -> Response
where
    R: OrderRepository + 'static,
    N: NotificationPublisher + 'static,
    L: ReputationLedger + 'static,
{
    match service.record_payment(&OrderId(order_id), request.provider, request.outcome) {
        Ok(record) => (StatusCode::OK, axum::Json(record.status_view())).into_response(),
        Err(error) => error_response(error),
    }
}

async fn status_handler<R, N, L>(
    State(service): State<Arc<OrderService<R, N, L>>>,
    Path(order_id): Path<String>,
    axum::Json(request): axum::Json<StatusRequest>,
) -> Response
where
    R: OrderRepository + 'static,
    N: NotificationPublisher + 'static,
    L: ReputationLedger + 'static,
{
    match service.update_status(&OrderId(order_id), request.status) {
        Ok(record) => (StatusCode::OK, axum::Json(record.status_view())).into_response(),
        Err(error) => error_response(error),
    }
}

async fn confirm_handler<R, N, L>(
    State(service): State<Arc<OrderService<R, N, L>>>,
    Path(order_id): Path<String>,
    axum::Json(request): axum::Json<ActorRequest>,
) -> Response
where
    R: OrderRepository + 'static,
    N: NotificationPublisher + 'static,
    L: ReputationLedger + 'static,
{
    match service.confirm_delivery(&OrderId(order_id), &request.actor) {
        Ok(record) => (StatusCode::OK, axum::Json(record.status_view())).into_response(),
        Err(error) => error_response(error),
    }
}

async fn cancel_handler<R, N, L>(
    State(service): State<Arc<OrderService<R, N, L>>>,
    Path(order_id): Path<String>,
    axum::Json(request): axum::Json<CancelRequest>,
) -> Response
where
    R: OrderRepository + 'static,
    N: NotificationPublisher + 'static,
    L: ReputationLedger + 'static,
{
    match service.cancel(&OrderId(order_id), &request.actor, request.reason) {
        Ok(record) => (StatusCode::OK, axum::Json(record.status_view())).into_response(),
        Err(error) => error_response(error),
    }
}

async fn rate_handler<R, N, L>(
    State(service): State<Arc<OrderService<R, N, L>>>,
    Path(order_id): Path<String>,
    axum::Json(request): axum::Json<RateRequest>,
) -> Response
where
    R: OrderRepository + 'static,
    N: NotificationPublisher + 'static,
    L: ReputationLedger + 'static,
{
    if !(1..=5).contains(&request.score) {
        let payload = json!({
            "error": "score must be between 1 and 5",
        });
        return (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response();
    }

    match service.rate(&OrderId(order_id), &request.actor, request.score, request.comment) {
        Ok(rating) => (StatusCode::OK, axum::Json(rating)).into_response(),
        Err(error) => error_response(error),
    }
}

fn error_response(error: OrderError) -> Response {
    match error {
        OrderError::Pricing(PricingError::MinimumOrderNotMet { minimum }) => {
            let payload = json!({
                "error": format!("order subtotal is below the vendor minimum of {minimum}"),
                "minimum": minimum,
            });
            (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response()
        }
        OrderError::Pricing(other) => {
            let payload = json!({
                "error": other.to_string(),
            });
            (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response()
        }
        error @ (OrderError::InvalidTransition { .. }
        | OrderError::AlreadyRated
        | OrderError::NotCompleted
        | OrderError::Store(StoreError::Conflict)
        | OrderError::Store(StoreError::VersionConflict)) => {
            let payload = json!({
                "error": error.to_string(),
            });
            (StatusCode::CONFLICT, axum::Json(payload)).into_response()
        }
        OrderError::Forbidden(message) => {
            let payload = json!({
                "error": message,
            });
            (StatusCode::FORBIDDEN, axum::Json(payload)).into_response()
        }
        OrderError::Store(StoreError::NotFound) => {
            let payload = json!({
                "error": "order not found",
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
