//! Integration specifications for report deduplication, corroboration, and
//! bounty payment.

mod common {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use chrono::{DateTime, Utc};

    use majisoko::identity::{ReportId, UserId};
    use majisoko::notify::{Notification, NotificationError, NotificationPublisher};
    use majisoko::reports::{
        BountyPolicy, GeoPoint, ReportRecord, ReportRepository, ReportService, ReportType,
    };
    use majisoko::store::{ReputationLedger, StoreError};

    pub(super) fn reporter(name: &str) -> UserId {
        UserId(format!("usr-{name}"))
    }

    /// A spot in Dar es Salaam; offsets of 0.0004 degrees of latitude are
    /// roughly 44 meters.
    pub(super) fn spot(lat_offset: f64) -> GeoPoint {
        GeoPoint {
            longitude: 39.2695,
            latitude: -6.8235 + lat_offset,
        }
    }

    #[derive(Default, Clone)]
    pub(super) struct MemoryReports {
        records: Arc<Mutex<HashMap<ReportId, ReportRecord>>>,
    }

    impl ReportRepository for MemoryReports {
        fn insert(&self, record: ReportRecord) -> Result<ReportRecord, StoreError> {
            let mut guard = self.records.lock().expect("lock");
            if guard.contains_key(&record.report.id) {
                return Err(StoreError::Conflict);
            }
            guard.insert(record.report.id.clone(), record.clone());
            Ok(record)
        }

        fn fetch(&self, id: &ReportId) -> Result<Option<ReportRecord>, StoreError> {
            let guard = self.records.lock().expect("lock");
            Ok(guard.get(id).cloned())
        }

        fn update(&self, mut record: ReportRecord) -> Result<ReportRecord, StoreError> {
            let mut guard = self.records.lock().expect("lock");
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
            let guard = self.records.lock().expect("lock");
            Ok(guard
                .values()
                .filter(|record| record.report.report_type == report_type)
                .filter(|record| record.report.created_at >= since)
                .cloned()
                .collect())
        }
    }

    #[derive(Default, Clone)]
    pub(super) struct CapturePublisher {
        events: Arc<Mutex<Vec<Notification>>>,
    }

    impl CapturePublisher {
        pub(super) fn events(&self) -> Vec<Notification> {
            self.events.lock().expect("lock").clone()
        }
    }

    impl NotificationPublisher for CapturePublisher {
        fn publish(&self, notification: Notification) -> Result<(), NotificationError> {
            self.events.lock().expect("lock").push(notification);
            Ok(())
        }
    }

    #[derive(Default, Clone)]
    pub(super) struct MemoryLedger {
        balances: Arc<Mutex<HashMap<UserId, u32>>>,
    }

    impl MemoryLedger {
        pub(super) fn balance(&self, user: &UserId) -> u32 {
            self.balances
                .lock()
                .expect("lock")
                .get(user)
                .copied()
                .unwrap_or(0)
        }
    }

    impl ReputationLedger for MemoryLedger {
        fn award(&self, user: &UserId, points: u32) -> Result<(), StoreError> {
            let mut guard = self.balances.lock().expect("lock");
            *guard.entry(user.clone()).or_insert(0) += points;
            Ok(())
        }
    }

    pub(super) fn build_service() -> (
        ReportService<MemoryReports, CapturePublisher, MemoryLedger>,
        Arc<MemoryReports>,
        Arc<CapturePublisher>,
        Arc<MemoryLedger>,
    ) {
        let repository = Arc::new(MemoryReports::default());
        let publisher = Arc::new(CapturePublisher::default());
        let ledger = Arc::new(MemoryLedger::default());
        let service = ReportService::new(
            repository.clone(),
            publisher.clone(),
            ledger.clone(),
            BountyPolicy::default(),
        );
        (service, repository, publisher, ledger)
    }
}

mod deduplication {
    use super::common::*;
    use majisoko::notify::NotificationTemplate;
    use majisoko::reports::{ReportError, ReportRepository, ReportStatus, ReportType};

    #[test]
    fn the_third_nearby_report_verifies_all_three() {
        let (service, repository, publisher, _) = build_service();
        let first = service
            .file(reporter("amina"), ReportType::BurstPipe, spot(0.0), None)
            .expect("first report");
        let second = service
            .file(reporter("baraka"), ReportType::BurstPipe, spot(0.0004), None)
            .expect("second report");
        assert_eq!(first.report.status, ReportStatus::Pending);
        assert_eq!(second.report.status, ReportStatus::Pending);
        assert_eq!(second.report.verified_count, 2);

        // ~89 m and ~44 m from the two earlier reports, both inside the
        // 100 m radius.
        let third = service
            .file(reporter("chiku"), ReportType::BurstPipe, spot(0.0008), None)
            .expect("third report");
        assert_eq!(third.report.status, ReportStatus::Verified);
        assert_eq!(third.report.verified_count, 3);

        for id in [&first.report.id, &second.report.id] {
            let stored = repository.fetch(id).expect("fetch").expect("present");
            assert_eq!(stored.report.status, ReportStatus::Verified);
            assert_eq!(stored.report.verified_count, 3);
        }

        let corroborations = publisher
            .events()
            .iter()
            .filter(|event| event.template == NotificationTemplate::ReportCorroborated)
            .count();
        assert_eq!(corroborations, 3);
    }

    #[test]
    fn the_same_reporter_cannot_double_report_an_incident() {
        let (service, _, _, _) = build_service();
        service
            .file(reporter("amina"), ReportType::Leakage, spot(0.0), None)
            .expect("first report");
        assert!(matches!(
            service.file(reporter("amina"), ReportType::Leakage, spot(0.0003), None),
            Err(ReportError::DuplicateReport)
        ));
    }

    #[test]
    fn distant_reports_do_not_corroborate() {
        let (service, _, _, _) = build_service();
        service
            .file(reporter("amina"), ReportType::BurstPipe, spot(0.0), None)
            .expect("first report");
        // ~220 meters away, outside the 100 meter radius.
        let far = service
            .file(reporter("baraka"), ReportType::BurstPipe, spot(0.002), None)
            .expect("far report");
        assert_eq!(far.report.verified_count, 1);
        assert_eq!(far.report.status, ReportStatus::Pending);
    }

    #[test]
    fn different_types_do_not_corroborate() {
        let (service, _, _, _) = build_service();
        service
            .file(reporter("amina"), ReportType::BurstPipe, spot(0.0), None)
            .expect("first report");
        let other = service
            .file(reporter("amina"), ReportType::Contamination, spot(0.0), None)
            .expect("other type from the same reporter is not a duplicate");
        assert_eq!(other.report.verified_count, 1);
    }

    #[test]
    fn bounty_amounts_follow_the_per_type_table() {
        let (service, _, _, _) = build_service();
        let cases = [
            (ReportType::BurstPipe, 10_000),
            (ReportType::Leakage, 5_000),
            (ReportType::IllegalConnection, 15_000),
            (ReportType::Contamination, 20_000),
            (ReportType::Vandalism, 7_500),
            (ReportType::Other, 2_500),
        ];
        for (index, (report_type, amount)) in cases.into_iter().enumerate() {
            let record = service
                .file(
                    reporter(&format!("user-{index}")),
                    report_type,
                    spot(index as f64 * 0.01),
                    None,
                )
                .expect("report filed");
            assert_eq!(record.report.bounty_amount, amount, "{report_type:?}");
        }
    }

    #[test]
    fn filing_awards_reporter_reputation() {
        let (service, _, _, ledger) = build_service();
        service
            .file(reporter("amina"), ReportType::Other, spot(0.0), None)
            .expect("report filed");
        assert_eq!(ledger.balance(&reporter("amina")), 5);
    }
}

mod resolution {
    use super::common::*;
    use majisoko::notify::NotificationTemplate;
    use majisoko::reports::{ReportError, ReportStatus, ReportType};

    #[test]
    fn resolving_pays_the_bounty_exactly_once() {
        let (service, _, publisher, ledger) = build_service();
        let record = service
            .file(reporter("amina"), ReportType::BurstPipe, spot(0.0), None)
            .expect("report filed");
        let id = record.report.id;

        let resolved = service
            .resolve(&id, reporter("admin"), "pipe repaired".to_string())
            .expect("resolve succeeds");
        assert_eq!(resolved.report.status, ReportStatus::Resolved);
        assert!(resolved.report.bounty_paid);
        assert!(resolved.report.bounty_paid_at.is_some());
        assert!(resolved.report.resolved_at.is_some());
        // 5 for filing, 20 for the resolution bonus.
        assert_eq!(ledger.balance(&reporter("amina")), 25);
        assert!(publisher
            .events()
            .iter()
            .any(|event| event.template == NotificationTemplate::BountyPaid));

        assert!(matches!(
            service.resolve(&id, reporter("admin"), "again".to_string()),
            Err(ReportError::AlreadyResolved)
        ));
        assert_eq!(ledger.balance(&reporter("amina")), 25);
    }
}

mod workflow {
    use super::common::*;
    use majisoko::reports::{ReportError, ReportStatus, ReportType};

    #[test]
    fn status_only_moves_forward() {
        let (service, _, _, _) = build_service();
        let record = service
            .file(reporter("amina"), ReportType::Leakage, spot(0.0), None)
            .expect("report filed");
        let id = record.report.id;

        let forwarded = service
            .advance(&id, ReportStatus::Forwarded)
            .expect("forwarded");
        assert_eq!(forwarded.report.status, ReportStatus::Forwarded);

        assert!(matches!(
            service.advance(&id, ReportStatus::Pending),
            Err(ReportError::InvalidStatusChange { .. })
        ));
        assert!(matches!(
            service.advance(&id, ReportStatus::Resolved),
            Err(ReportError::InvalidStatusChange { .. }),
        ));

        let in_progress = service
            .advance(&id, ReportStatus::InProgress)
            .expect("in progress");
        assert_eq!(in_progress.report.status, ReportStatus::InProgress);
    }

    #[test]
    fn rejection_is_reachable_from_any_pre_resolved_status() {
        let (service, _, _, _) = build_service();
        let record = service
            .file(reporter("amina"), ReportType::Vandalism, spot(0.0), None)
            .expect("report filed");
        let id = record.report.id;
        service
            .advance(&id, ReportStatus::InProgress)
            .expect("in progress");

        let rejected = service
            .advance(&id, ReportStatus::Rejected)
            .expect("rejected");
        assert_eq!(rejected.report.status, ReportStatus::Rejected);

        assert!(matches!(
            service.advance(&id, ReportStatus::Forwarded),
            Err(ReportError::InvalidStatusChange { .. })
        ));
    }

    #[test]
    fn resolved_reports_cannot_be_rejected() {
        let (service, _, _, _) = build_service();
        let record = service
            .file(reporter("amina"), ReportType::Other, spot(0.0), None)
            .expect("report filed");
        let id = record.report.id;
        service
            .resolve(&id, reporter("admin"), "done".to_string())
            .expect("resolved");
        assert!(matches!(
            service.advance(&id, ReportStatus::Rejected),
            Err(ReportError::InvalidStatusChange { .. })
        ));
    }
}
