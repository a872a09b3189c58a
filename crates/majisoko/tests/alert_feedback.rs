//! Integration specifications for alert posting, feedback aggregation, and
//! the verification threshold.

mod common {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use majisoko::alerts::{
        AlertRecord, AlertRepository, AlertService, AlertStatus, FeedbackPolicy, ScoutProfile,
        ScoutRole,
    };
    use majisoko::identity::{AlertId, UserId, ZoneId};
    use majisoko::notify::{Notification, NotificationError, NotificationPublisher};
    use majisoko::store::{ReputationLedger, StoreError};

    pub(super) fn scout(reputation: u32) -> ScoutProfile {
        ScoutProfile {
            id: UserId("usr-scout".to_string()),
            role: ScoutRole::Scout,
            is_verified: true,
            reputation,
        }
    }

    pub(super) fn zone() -> ZoneId {
        ZoneId("zn-kinondoni".to_string())
    }

    #[derive(Default, Clone)]
    pub(super) struct MemoryAlerts {
        records: Arc<Mutex<HashMap<AlertId, AlertRecord>>>,
    }

    impl AlertRepository for MemoryAlerts {
        fn insert(&self, record: AlertRecord) -> Result<AlertRecord, StoreError> {
            let mut guard = self.records.lock().expect("lock");
            if guard.contains_key(&record.alert.id) {
                return Err(StoreError::Conflict);
            }
            guard.insert(record.alert.id.clone(), record.clone());
            Ok(record)
        }

        fn fetch(&self, id: &AlertId) -> Result<Option<AlertRecord>, StoreError> {
            let guard = self.records.lock().expect("lock");
            Ok(guard.get(id).cloned())
        }

        fn update(&self, mut record: AlertRecord) -> Result<AlertRecord, StoreError> {
            let mut guard = self.records.lock().expect("lock");
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
            let guard = self.records.lock().expect("lock");
            Ok(guard
                .values()
                .filter(|record| record.alert.zone == *zone)
                .filter(|record| statuses.contains(&record.alert.status))
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
        AlertService<MemoryAlerts, CapturePublisher, MemoryLedger>,
        Arc<MemoryAlerts>,
        Arc<CapturePublisher>,
        Arc<MemoryLedger>,
    ) {
        let repository = Arc::new(MemoryAlerts::default());
        let publisher = Arc::new(CapturePublisher::default());
        let ledger = Arc::new(MemoryLedger::default());
        let service = AlertService::new(
            repository.clone(),
            publisher.clone(),
            ledger.clone(),
            FeedbackPolicy::default(),
        );
        (service, repository, publisher, ledger)
    }
}

mod posting {
    use super::common::*;
    use chrono::{Duration, Utc};
    use majisoko::alerts::{AlertError, AlertStatus, AlertType, ScoutRole};
    use majisoko::notify::NotificationTemplate;

    #[test]
    fn posting_sets_confidence_from_scout_reputation() {
        let (service, _, publisher, ledger) = build_service();
        let record = service
            .post(zone(), &scout(450), AlertType::IncomingSupply, None, None)
            .expect("alert posted");

        assert_eq!(record.alert.status, AlertStatus::Active);
        assert!((record.alert.confidence - 0.70).abs() < 1e-9);
        assert!(record.alert.expires_at.is_none());
        assert_eq!(ledger.balance(&scout(450).id), 10);
        assert_eq!(
            publisher.events()[0].template,
            NotificationTemplate::SupplyAlertPosted
        );
    }

    #[test]
    fn confidence_endpoints_match_the_reputation_scale() {
        let (service, _, _, _) = build_service();
        let low = service
            .post(zone(), &scout(0), AlertType::Outage, None, None)
            .expect("posted");
        let high = service
            .post(zone(), &scout(1000), AlertType::Outage, None, None)
            .expect("posted");
        assert!((low.alert.confidence - 0.5).abs() < 1e-9);
        assert!((high.alert.confidence - 0.95).abs() < 1e-9);
    }

    #[test]
    fn eta_extends_by_duration_or_the_default_window() {
        let (service, _, _, _) = build_service();
        let eta = Utc::now() + Duration::hours(3);

        let with_duration = service
            .post(
                zone(),
                &scout(500),
                AlertType::IncomingSupply,
                Some(eta),
                Some(30),
            )
            .expect("posted");
        assert_eq!(
            with_duration.alert.expires_at,
            Some(eta + Duration::minutes(30))
        );

        let with_default = service
            .post(zone(), &scout(500), AlertType::IncomingSupply, Some(eta), None)
            .expect("posted");
        assert_eq!(
            with_default.alert.expires_at,
            Some(eta + Duration::minutes(120))
        );
    }

    #[test]
    fn bare_duration_counts_from_now() {
        let (service, _, _, _) = build_service();
        let before = Utc::now();
        let record = service
            .post(zone(), &scout(500), AlertType::Outage, None, Some(60))
            .expect("posted");
        let expires = record.alert.expires_at.expect("expiry set");
        assert!(expires >= before + Duration::minutes(60));
        assert!(expires <= Utc::now() + Duration::minutes(60));
    }

    #[test]
    fn unverified_scouts_cannot_post() {
        let (service, _, _, _) = build_service();
        let mut unverified = scout(300);
        unverified.is_verified = false;
        assert!(matches!(
            service.post(zone(), &unverified, AlertType::Outage, None, None),
            Err(AlertError::ScoutNotVerified)
        ));
    }

    #[test]
    fn officials_post_without_scout_verification() {
        let (service, _, _, _) = build_service();
        let mut official = scout(300);
        official.role = ScoutRole::UtilityOfficial;
        official.is_verified = false;
        assert!(service
            .post(zone(), &official, AlertType::QualityWarning, None, None)
            .is_ok());
    }
}

mod feedback {
    use super::common::*;
    use majisoko::alerts::{AlertActor, AlertError, AlertStatus, AlertType};
    use majisoko::notify::NotificationTemplate;

    #[test]
    fn feedback_keeps_a_running_mean() {
        let (service, _, _, _) = build_service();
        let record = service
            .post(zone(), &scout(500), AlertType::Outage, None, None)
            .expect("posted");
        let id = record.alert.id;

        let after = service.submit_feedback(&id, true).expect("feedback");
        assert_eq!(after.alert.feedback_count, 1);
        assert!((after.alert.feedback_score.expect("score") - 1.0).abs() < 1e-9);

        let after = service.submit_feedback(&id, false).expect("feedback");
        assert_eq!(after.alert.feedback_count, 2);
        assert!((after.alert.feedback_score.expect("score") - 0.5).abs() < 1e-9);
    }

    #[test]
    fn three_accurate_votes_verify_the_alert() {
        let (service, _, publisher, ledger) = build_service();
        let record = service
            .post(zone(), &scout(500), AlertType::Outage, None, None)
            .expect("posted");
        let id = record.alert.id;

        service.submit_feedback(&id, true).expect("feedback");
        let second = service.submit_feedback(&id, true).expect("feedback");
        assert!(!second.alert.is_verified, "two votes are not enough");

        let third = service.submit_feedback(&id, true).expect("feedback");
        assert!(third.alert.is_verified);
        assert_eq!(third.alert.status, AlertStatus::Verified);

        let templates: Vec<_> = publisher
            .events()
            .iter()
            .map(|event| event.template)
            .collect();
        assert!(templates.contains(&NotificationTemplate::AlertVerified));
        // 10 for creation, 2 per accurate vote.
        assert_eq!(ledger.balance(&scout(500).id), 16);
    }

    #[test]
    fn verification_is_sticky_under_later_negative_feedback() {
        let (service, _, _, _) = build_service();
        let record = service
            .post(zone(), &scout(500), AlertType::Outage, None, None)
            .expect("posted");
        let id = record.alert.id;

        for _ in 0..3 {
            service.submit_feedback(&id, true).expect("feedback");
        }
        let mut latest = service.submit_feedback(&id, false).expect("feedback");
        for _ in 0..4 {
            latest = service.submit_feedback(&id, false).expect("feedback");
        }

        assert!(latest.alert.feedback_score.expect("score") < 0.7);
        assert!(latest.alert.is_verified, "verification never reverts");
        assert_eq!(latest.alert.status, AlertStatus::Verified);
    }

    #[test]
    fn cancelled_alerts_no_longer_take_feedback() {
        let (service, _, _, _) = build_service();
        let record = service
            .post(zone(), &scout(500), AlertType::Outage, None, None)
            .expect("posted");
        let id = record.alert.id;
        service
            .cancel(&id, &AlertActor::Scout(scout(500).id))
            .expect("cancel");

        assert!(matches!(
            service.submit_feedback(&id, true),
            Err(AlertError::AlertClosed {
                status: AlertStatus::Cancelled
            })
        ));
    }
}

mod cancellation {
    use super::common::*;
    use majisoko::alerts::{AlertActor, AlertError, AlertStatus, AlertType};
    use majisoko::identity::UserId;

    #[test]
    fn only_the_scout_or_an_admin_cancels() {
        let (service, _, _, _) = build_service();
        let record = service
            .post(zone(), &scout(500), AlertType::Outage, None, None)
            .expect("posted");
        let id = record.alert.id;

        assert!(matches!(
            service.cancel(&id, &AlertActor::Scout(UserId("usr-other".to_string()))),
            Err(AlertError::Forbidden(_))
        ));
        let cancelled = service
            .cancel(&id, &AlertActor::Admin(UserId("usr-admin".to_string())))
            .expect("admin cancels");
        assert_eq!(cancelled.alert.status, AlertStatus::Cancelled);
    }

    #[test]
    fn zone_feed_lists_active_and_verified_alerts_only() {
        let (service, _, _, _) = build_service();
        let active = service
            .post(zone(), &scout(500), AlertType::Outage, None, None)
            .expect("posted");
        let cancelled = service
            .post(zone(), &scout(500), AlertType::LowPressure, None, None)
            .expect("posted");
        service
            .cancel(&cancelled.alert.id, &AlertActor::Scout(scout(500).id))
            .expect("cancel");

        let feed = service.zone_feed(&zone()).expect("feed");
        assert_eq!(feed.len(), 1);
        assert_eq!(feed[0].alert.id, active.alert.id);
    }
}
