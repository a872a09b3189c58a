use chrono::{DateTime, Utc};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

use majisoko::alerts::{AlertRecord, AlertRepository, AlertService, AlertStatus};
use majisoko::identity::{AlertId, OrderId, ReportId, UserId, VendorId, ZoneId};
use majisoko::marketplace::{OrderRecord, OrderRepository, OrderService, VendorRating};
use majisoko::notify::{Notification, NotificationError, NotificationPublisher};
use majisoko::reports::{ReportRecord, ReportRepository, ReportService, ReportType};
use majisoko::store::{ReputationLedger, StoreError};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) type PlatformOrderService =
    OrderService<InMemoryOrderRepository, LoggingPublisher, InMemoryReputationLedger>;
pub(crate) type PlatformAlertService =
    AlertService<InMemoryAlertRepository, LoggingPublisher, InMemoryReputationLedger>;
pub(crate) type PlatformReportService =
    ReportService<InMemoryReportRepository, LoggingPublisher, InMemoryReputationLedger>;

#[derive(Default, Clone)]
pub(crate) struct InMemoryOrderRepository {
    records: Arc<Mutex<HashMap<OrderId, OrderRecord>>>,
    ratings: Arc<Mutex<HashMap<VendorId, VendorRating>>>,
}

impl OrderRepository for InMemoryOrderRepository {
    fn insert(&self, record: OrderRecord) -> Result<OrderRecord, StoreError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if guard.contains_key(&record.order.id) {
            return Err(StoreError::Conflict);
        }
        guard.insert(record.order.id.clone(), record.clone());
        Ok(record)
    }

    fn fetch(&self, id: &OrderId) -> Result<Option<OrderRecord>, StoreError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn update(&self, mut record: OrderRecord) -> Result<OrderRecord, StoreError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        let stored = guard.get(&record.order.id).ok_or(StoreError::NotFound)?;
        if stored.version != record.version {
            return Err(StoreError::VersionConflict);
        }
        record.version += 1;
        guard.insert(record.order.id.clone(), record.clone());
        Ok(record)
    }

    fn vendor_rating(&self, vendor: &VendorId) -> Result<VendorRating, StoreError> {
        let guard = self.ratings.lock().expect("rating mutex poisoned");
        Ok(guard.get(vendor).copied().unwrap_or_default())
    }

    fn store_vendor_rating(
        &self,
        vendor: &VendorId,
        rating: VendorRating,
    ) -> Result<(), StoreError> {
        let mut guard = self.ratings.lock().expect("rating mutex poisoned");
        guard.insert(vendor.clone(), rating);
        Ok(())
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryAlertRepository {
    records: Arc<Mutex<HashMap<AlertId, AlertRecord>>>,
}

impl AlertRepository for InMemoryAlertRepository {
    fn insert(&self, record: AlertRecord) -> Result<AlertRecord, StoreError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if guard.contains_key(&record.alert.id) {
            return Err(StoreError::Conflict);
        }
        guard.insert(record.alert.id.clone(), record.clone());
        Ok(record)
    }

    fn fetch(&self, id: &AlertId) -> Result<Option<AlertRecord>, StoreError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn update(&self, mut record: AlertRecord) -> Result<AlertRecord, StoreError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        let stored = guard.get(&record.alert.id).ok_or(StoreError::NotFound)?;
        if stored.version != record.version {
            return Err(StoreError::VersionConflict);
        }
        record.version += 1;
        guard.insert(record.alert.id.clone(), record.clone());
        Ok(record)
    }

    fn in_zone(
        &self,
        zone: &ZoneId,
        statuses: &[AlertStatus],
    ) -> Result<Vec<AlertRecord>, StoreError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard
            .values()
            .filter(|record| record.alert.zone == *zone)
            .filter(|record| statuses.contains(&record.alert.status))
            .cloned()
            .collect())
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryReportRepository {
    records: Arc<Mutex<HashMap<ReportId, ReportRecord>>>,
}

impl ReportRepository for InMemoryReportRepository {
    fn insert(&self, record: ReportRecord) -> Result<ReportRecord, StoreError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if guard.contains_key(&record.report.id) {
            return Err(StoreError::Conflict);
        }
        guard.insert(record.report.id.clone(), record.clone());
        Ok(record)
    }

    fn fetch(&self, id: &ReportId) -> Result<Option<ReportRecord>, StoreError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn update(&self, mut record: ReportRecord) -> Result<ReportRecord, StoreError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        let stored = guard.get(&record.report.id).ok_or(StoreError::NotFound)?;
        if stored.version != record.version {
            return Err(StoreError::VersionConflict);
        }
        record.version += 1;
        guard.insert(record.report.id.clone(), record.clone());
        Ok(record)
    }

    fn recent_of_type(
        &self,
        report_type: ReportType,
        since: DateTime<Utc>,
    ) -> Result<Vec<ReportRecord>, StoreError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard
            .values()
            .filter(|record| record.report.report_type == report_type)
            .filter(|record| record.report.created_at >= since)
            .cloned()
            .collect())
    }
}

/// Publisher standing in for the SMS/push gateway. Logs and records each
/// dispatched event.
#[derive(Default, Clone)]
pub(crate) struct LoggingPublisher {
    events: Arc<Mutex<Vec<Notification>>>,
}

impl LoggingPublisher {
    pub(crate) fn events(&self) -> Vec<Notification> {
        self.events.lock().expect("notification mutex poisoned").clone()
    }
}

impl NotificationPublisher for LoggingPublisher {
    fn publish(&self, notification: Notification) -> Result<(), NotificationError> {
        tracing::info!(
            recipient = %notification.recipient.0,
            template = ?notification.template,
            "notification dispatched"
        );
        let mut guard = self.events.lock().expect("notification mutex poisoned");
        guard.push(notification);
        Ok(())
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryReputationLedger {
    balances: Arc<Mutex<HashMap<UserId, u32>>>,
}

impl InMemoryReputationLedger {
    pub(crate) fn balance(&self, user: &UserId) -> u32 {
        self.balances
            .lock()
            .expect("ledger mutex poisoned")
            .get(user)
            .copied()
            .unwrap_or(0)
    }
}

impl ReputationLedger for InMemoryReputationLedger {
    fn award(&self, user: &UserId, points: u32) -> Result<(), StoreError> {
        let mut guard = self.balances.lock().expect("ledger mutex poisoned");
        *guard.entry(user.clone()).or_insert(0) += points;
        Ok(())
    }
}
