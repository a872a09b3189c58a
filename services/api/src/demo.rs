use crate::infra::{
    InMemoryAlertRepository, InMemoryOrderRepository, InMemoryReportRepository,
    InMemoryReputationLedger, LoggingPublisher,
};
use clap::Args;
use std::sync::Arc;

use majisoko::alerts::{AlertActor, AlertService, AlertType, FeedbackPolicy, ScoutProfile, ScoutRole};
use majisoko::error::AppError;
use majisoko::identity::{ProductId, UserId, VendorId, ZoneId};
use majisoko::marketplace::{
    LineItemRequest, OrderActor, OrderPolicy, OrderService, OrderStatus, PaymentOutcome,
    PaymentProvider, ProductSnapshot, VendorSnapshot,
};
use majisoko::reports::{BountyPolicy, GeoPoint, ReportService, ReportType};

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Skip the order lifecycle portion of the demo.
    #[arg(long)]
    pub(crate) skip_orders: bool,
    /// Skip the supply alert portion of the demo.
    #[arg(long)]
    pub(crate) skip_alerts: bool,
    /// Skip the citizen report portion of the demo.
    #[arg(long)]
    pub(crate) skip_reports: bool,
}

fn demo_vendor() -> VendorSnapshot {
    VendorSnapshot {
        id: VendorId("ven-mikocheni".to_string()),
        owner: UserId("usr-owner".to_string()),
        is_active: true,
        is_verified: true,
        delivery_fee: 1_500,
        min_order: 10_000,
        products: vec![ProductSnapshot {
            id: ProductId("prd-jerrycan".to_string()),
            name: "20L jerrycan".to_string(),
            unit_price: 5_000,
            is_available: true,
        }],
    }
}

fn demo_scout() -> ScoutProfile {
    ScoutProfile {
        id: UserId("usr-scout".to_string()),
        role: ScoutRole::Scout,
        is_verified: true,
        reputation: 450,
    }
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let publisher = Arc::new(LoggingPublisher::default());
    let ledger = Arc::new(InMemoryReputationLedger::default());

    println!("Majisoko platform demo");

    if !args.skip_orders {
        run_order_walkthrough(publisher.clone(), ledger.clone())?;
    }
    if !args.skip_alerts {
        run_alert_walkthrough(publisher.clone(), ledger.clone())?;
    }
    if !args.skip_reports {
        run_report_walkthrough(publisher.clone(), ledger.clone())?;
    }

    println!("\n{} notifications dispatched in total", publisher.events().len());
    Ok(())
}

fn run_order_walkthrough(
    publisher: Arc<LoggingPublisher>,
    ledger: Arc<InMemoryReputationLedger>,
) -> Result<(), AppError> {
    let service = OrderService::new(
        Arc::new(InMemoryOrderRepository::default()),
        publisher,
        ledger,
        OrderPolicy::default(),
    );
    let vendor = demo_vendor();
    let customer = UserId("usr-asha".to_string());

    println!("\nOrder lifecycle walkthrough");
    let record = service
        .place(
            customer.clone(),
            &vendor,
            &[LineItemRequest {
                product_id: ProductId("prd-jerrycan".to_string()),
                quantity: 4,
            }],
        )
        .map_err(AppError::workflow)?;
    let id = record.order.id.clone();
    println!(
        "- placed {}: subtotal {} + delivery {} + fee {} = {}",
        id.0,
        record.order.subtotal,
        record.order.delivery_fee,
        record.order.platform_fee,
        record.order.total
    );

    let accepted = service
        .accept(&id, &OrderActor::Vendor(vendor.id.clone()))
        .map_err(AppError::workflow)?;
    println!("- vendor accepted, status {}", accepted.order.status.label());

    let paid = service
        .record_payment(&id, PaymentProvider::Mpesa, PaymentOutcome::Completed)
        .map_err(AppError::workflow)?;
    let escrow = paid
        .payment
        .as_ref()
        .map(|payment| payment.escrow.label())
        .unwrap_or("none");
    println!("- payment completed, escrow {escrow}");

    for status in [
        OrderStatus::Preparing,
        OrderStatus::OutForDelivery,
        OrderStatus::Delivered,
    ] {
        let moved = service
            .update_status(&id, status)
            .map_err(AppError::workflow)?;
        println!("- status {}", moved.order.status.label());
    }

    let confirmed = service
        .confirm_delivery(&id, &OrderActor::Customer(customer.clone()))
        .map_err(AppError::workflow)?;
    let escrow = confirmed
        .payment
        .as_ref()
        .map(|payment| payment.escrow.label())
        .unwrap_or("none");
    println!("- customer confirmed delivery, escrow {escrow}");

    let rating = service
        .rate(&id, &OrderActor::Customer(customer), 5, None)
        .map_err(AppError::workflow)?;
    println!(
        "- rated 5 stars, vendor average {:.2} over {} rating(s)",
        rating.average, rating.count
    );
    Ok(())
}

fn run_alert_walkthrough(
    publisher: Arc<LoggingPublisher>,
    ledger: Arc<InMemoryReputationLedger>,
) -> Result<(), AppError> {
    let service = AlertService::new(
        Arc::new(InMemoryAlertRepository::default()),
        publisher,
        ledger.clone(),
        FeedbackPolicy::default(),
    );
    let scout = demo_scout();
    let zone = ZoneId("zn-kinondoni".to_string());

    println!("\nSupply alert walkthrough");
    let record = service
        .post(zone, &scout, AlertType::IncomingSupply, None, Some(180))
        .map_err(AppError::workflow)?;
    let id = record.alert.id.clone();
    println!(
        "- {} posted with confidence {:.2}",
        id.0, record.alert.confidence
    );

    let mut latest = record;
    for _ in 0..3 {
        latest = service
            .submit_feedback(&id, true)
            .map_err(AppError::workflow)?;
    }
    println!(
        "- after {} accurate votes: score {:.2}, status {}",
        latest.alert.feedback_count,
        latest.alert.feedback_score.unwrap_or(0.0),
        latest.alert.status.label()
    );
    println!("- scout reputation balance {}", ledger.balance(&scout.id));

    let second = service
        .post(
            ZoneId("zn-temeke".to_string()),
            &scout,
            AlertType::Outage,
            None,
            None,
        )
        .map_err(AppError::workflow)?;
    let cancelled = service
        .cancel(&second.alert.id, &AlertActor::Scout(scout.id))
        .map_err(AppError::workflow)?;
    println!(
        "- {} cancelled by its scout, status {}",
        cancelled.alert.id.0,
        cancelled.alert.status.label()
    );
    Ok(())
}

fn run_report_walkthrough(
    publisher: Arc<LoggingPublisher>,
    ledger: Arc<InMemoryReputationLedger>,
) -> Result<(), AppError> {
    let service = ReportService::new(
        Arc::new(InMemoryReportRepository::default()),
        publisher,
        ledger.clone(),
        BountyPolicy::default(),
    );

    println!("\nCitizen report walkthrough");
    let base = GeoPoint {
        longitude: 39.2695,
        latitude: -6.8235,
    };
    let reporters = ["usr-amina", "usr-baraka", "usr-chiku"];
    let mut last = None;
    for (index, name) in reporters.iter().enumerate() {
        let location = GeoPoint {
            longitude: base.longitude,
            latitude: base.latitude + index as f64 * 0.0004,
        };
        let record = service
            .file(
                UserId(name.to_string()),
                ReportType::BurstPipe,
                location,
                Some("water gushing from the main".to_string()),
            )
            .map_err(AppError::workflow)?;
        println!(
            "- {} filed by {}: status {}, corroborating count {}",
            record.report.id.0,
            name,
            record.report.status.label(),
            record.report.verified_count
        );
        last = Some(record);
    }

    if let Some(record) = last {
        let resolved = service
            .resolve(
                &record.report.id,
                UserId("usr-admin".to_string()),
                "utility crew repaired the main".to_string(),
            )
            .map_err(AppError::workflow)?;
        println!(
            "- {} resolved, bounty of {} paid: {}",
            resolved.report.id.0,
            resolved.report.bounty_amount,
            resolved.report.bounty_paid
        );
        println!(
            "- reporter reputation balance {}",
            ledger.balance(&resolved.report.reporter)
        );
    }
    Ok(())
}
