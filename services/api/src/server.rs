use crate::cli::ServeArgs;
use crate::infra::{
    AppState, InMemoryAlertRepository, InMemoryOrderRepository, InMemoryReportRepository,
    InMemoryReputationLedger, LoggingPublisher,
};
use crate::routes::with_platform_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use majisoko::alerts::{AlertService, FeedbackPolicy};
use majisoko::config::AppConfig;
use majisoko::error::AppError;
use majisoko::marketplace::{OrderPolicy, OrderService};
use majisoko::reports::{BountyPolicy, ReportService};
use majisoko::telemetry;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let publisher = Arc::new(LoggingPublisher::default());
    let ledger = Arc::new(InMemoryReputationLedger::default());

    let order_service = Arc::new(OrderService::new(
        Arc::new(InMemoryOrderRepository::default()),
        publisher.clone(),
        ledger.clone(),
        OrderPolicy::default(),
    ));
    let alert_service = Arc::new(AlertService::new(
        Arc::new(InMemoryAlertRepository::default()),
        publisher.clone(),
        ledger.clone(),
        FeedbackPolicy::default(),
    ));
    let report_service = Arc::new(ReportService::new(
        Arc::new(InMemoryReportRepository::default()),
        publisher,
        ledger,
        BountyPolicy::default(),
    ));

    let app = with_platform_routes(order_service, alert_service, report_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "majisoko platform api ready");

    axum::serve(listener, app).await?;
    Ok(())
}
