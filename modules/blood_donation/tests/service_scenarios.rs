//! End-to-end flows through the public client and the domain service.

mod common;

use chrono::{Duration, Utc};
use uuid::Uuid;

use blood_donation::contract::error::BloodDonationError;
use blood_donation::contract::model::{BloodGroup, RequestStatus, UserPatch, UserRole};
use blood_donation::domain::error::DomainError;
use common::{harness, new_request};

#[tokio::test]
async fn register_request_match_donate_cooldown() {
    let h = harness();
    let api = h.module.api();

    let a = h
        .register("Asha", UserRole::Volunteer, BloodGroup::ONegative, "Downtown")
        .await;
    let b = h
        .register("Bala", UserRole::Requestor, BloodGroup::BPositive, "Downtown")
        .await;

    let request = api
        .create_request(b.id, new_request(BloodGroup::ONegative, "Downtown"))
        .await
        .unwrap();
    assert_eq!(request.status, RequestStatus::Open);
    assert_eq!(request.requestor_id, b.id);

    let matches = api.find_matches(request.id).await.unwrap();
    assert_eq!(matches.iter().map(|u| u.id).collect::<Vec<_>>(), vec![a.id]);

    let before = Utc::now();
    let donation = api.record_donation(a.id, request.id).await.unwrap();
    assert_eq!(donation.donor_id, a.id);
    assert_eq!(donation.request_id, request.id);
    assert_eq!(donation.patient_name, request.patient_name);
    assert!(donation.donation_date >= before);

    let stored = api.get_request(request.id).await.unwrap();
    assert_eq!(stored.status, RequestStatus::Matched);
    assert_eq!(api.get_user(a.id).await.unwrap().donations, 1);
    assert!(api.is_in_cooldown(a.id).await.unwrap());

    let left = api.cooldown_remaining(a.id).await.unwrap().unwrap();
    assert_eq!(left.days, 58);
}

#[tokio::test]
async fn matches_are_notified_when_request_is_created() {
    let h = harness();
    let api = h.module.api();

    let v1 = h
        .register("Vinod", UserRole::Volunteer, BloodGroup::APositive, "Kollam City")
        .await;
    let v2 = h
        .register("Veena", UserRole::Both, BloodGroup::APositive, "kollam city")
        .await;
    let _other_group = h
        .register("Omana", UserRole::Volunteer, BloodGroup::OPositive, "Kollam City")
        .await;
    let requestor = h
        .register("Ramesh", UserRole::Requestor, BloodGroup::APositive, "Kollam City")
        .await;

    let request = api
        .create_request(requestor.id, new_request(BloodGroup::APositive, "Kollam City"))
        .await
        .unwrap();

    assert_eq!(h.notifier.recipients(), vec![v1.id, v2.id]);
    assert!(h
        .notifier
        .sent
        .lock()
        .iter()
        .all(|(_, request_id)| *request_id == request.id));
}

#[tokio::test]
async fn notification_failure_does_not_fail_request_creation() {
    let h = harness();
    let api = h.module.api();

    let flaky = h
        .register("Faisal", UserRole::Volunteer, BloodGroup::BNegative, "Adoor")
        .await;
    let fine = h
        .register("Fathima", UserRole::Volunteer, BloodGroup::BNegative, "Adoor")
        .await;
    let requestor = h
        .register("Rahul", UserRole::Requestor, BloodGroup::BNegative, "Adoor")
        .await;
    h.notifier.fail_for(flaky.id);

    let request = api
        .create_request(requestor.id, new_request(BloodGroup::BNegative, "Adoor"))
        .await
        .unwrap();

    assert_eq!(h.notifier.recipients(), vec![fine.id]);
    assert_eq!(api.get_request(request.id).await.unwrap().id, request.id);
}

#[tokio::test]
async fn find_matches_on_unknown_request_is_empty() {
    let h = harness();
    let matches = h.module.api().find_matches(Uuid::new_v4()).await.unwrap();
    assert!(matches.is_empty());
}

#[tokio::test]
async fn both_role_user_is_not_matched_to_own_request() {
    let h = harness();
    let api = h.module.api();
    let both = h
        .register("Bindu", UserRole::Both, BloodGroup::AbPositive, "Punalur")
        .await;

    let request = api
        .create_request(both.id, new_request(BloodGroup::AbPositive, "Punalur"))
        .await
        .unwrap();

    assert!(api.find_matches(request.id).await.unwrap().is_empty());
    assert!(h.notifier.recipients().is_empty());
}

#[tokio::test]
async fn donation_count_tracks_donation_log() {
    let h = harness();
    let api = h.module.api();
    let service = h.module.service();

    let donor = h
        .register("Deepa", UserRole::Volunteer, BloodGroup::OPositive, "Kottarakkara")
        .await;
    let requestor = h
        .register("Ravi", UserRole::Requestor, BloodGroup::OPositive, "Kottarakkara")
        .await;

    let t0 = Utc::now() - Duration::days(200);
    for offset in [0, 60, 120] {
        let request = api
            .create_request(requestor.id, new_request(BloodGroup::OPositive, "Kottarakkara"))
            .await
            .unwrap();
        service
            .record_donation_at(donor.id, request.id, t0 + Duration::days(offset))
            .await
            .unwrap();
    }

    let history = api.donations_by_donor(donor.id).await.unwrap();
    let count = api.get_user(donor.id).await.unwrap().donations;
    assert_eq!(count as usize, history.len());
    assert_eq!(count, 3);

    // newest first
    assert!(history
        .windows(2)
        .all(|w| w[0].donation_date >= w[1].donation_date));
}

#[tokio::test]
async fn missing_donor_or_request_changes_nothing() {
    let h = harness();
    let api = h.module.api();
    let donor = h
        .register("Dinesh", UserRole::Volunteer, BloodGroup::ANegative, "Adoor")
        .await;
    let requestor = h
        .register("Rekha", UserRole::Requestor, BloodGroup::ANegative, "Adoor")
        .await;
    let request = api
        .create_request(requestor.id, new_request(BloodGroup::ANegative, "Adoor"))
        .await
        .unwrap();

    match api.record_donation(donor.id, Uuid::new_v4()).await {
        Err(BloodDonationError::NotFound { entity, .. }) => assert_eq!(entity, "Request"),
        other => panic!("expected NotFound, got {other:?}"),
    }
    match api.record_donation(Uuid::new_v4(), request.id).await {
        Err(BloodDonationError::NotFound { entity, .. }) => assert_eq!(entity, "User"),
        other => panic!("expected NotFound, got {other:?}"),
    }

    assert_eq!(api.get_user(donor.id).await.unwrap().donations, 0);
    assert_eq!(
        api.get_request(request.id).await.unwrap().status,
        RequestStatus::Open
    );
    assert!(api.donations_by_donor(donor.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn failed_save_leaves_store_untouched() {
    let h = harness();
    let api = h.module.api();
    let donor = h
        .register("Daisy", UserRole::Volunteer, BloodGroup::OPositive, "Adoor")
        .await;
    let requestor = h
        .register("Roy", UserRole::Requestor, BloodGroup::OPositive, "Adoor")
        .await;
    let request = api
        .create_request(requestor.id, new_request(BloodGroup::OPositive, "Adoor"))
        .await
        .unwrap();

    h.store.break_saves();
    let err = api.record_donation(donor.id, request.id).await.unwrap_err();
    assert_eq!(err, BloodDonationError::Internal);

    assert_eq!(api.get_user(donor.id).await.unwrap().donations, 0);
    assert_eq!(
        api.get_request(request.id).await.unwrap().status,
        RequestStatus::Open
    );
    assert!(!api.is_in_cooldown(donor.id).await.unwrap());
}

#[tokio::test]
async fn cooldown_window_edges() {
    let h = harness();
    let service = h.module.service();
    let api = h.module.api();

    let donor = h
        .register("Meera", UserRole::Volunteer, BloodGroup::BPositive, "Adoor")
        .await;
    let requestor = h
        .register("Manoj", UserRole::Requestor, BloodGroup::BPositive, "Adoor")
        .await;
    assert!(!service.is_in_cooldown_at(donor.id, Utc::now()).await.unwrap());

    let request = api
        .create_request(requestor.id, new_request(BloodGroup::BPositive, "Adoor"))
        .await
        .unwrap();
    let donation = api.record_donation(donor.id, request.id).await.unwrap();
    let t0 = donation.donation_date;

    assert!(service.is_in_cooldown_at(donor.id, t0).await.unwrap());
    assert!(service
        .is_in_cooldown_at(donor.id, t0 + Duration::days(59) - Duration::seconds(1))
        .await
        .unwrap());
    assert!(!service
        .is_in_cooldown_at(donor.id, t0 + Duration::days(59))
        .await
        .unwrap());
}

#[tokio::test]
async fn expired_marker_is_cleared_and_stays_cleared() {
    let h = harness();
    let service = h.module.service();
    let api = h.module.api();

    let donor = h
        .register("Nisha", UserRole::Volunteer, BloodGroup::ONegative, "Adoor")
        .await;
    let requestor = h
        .register("Naveen", UserRole::Requestor, BloodGroup::ONegative, "Adoor")
        .await;
    let request = api
        .create_request(requestor.id, new_request(BloodGroup::ONegative, "Adoor"))
        .await
        .unwrap();

    let long_ago = Utc::now() - Duration::days(90);
    service
        .record_donation_at(donor.id, request.id, long_ago)
        .await
        .unwrap();

    use blood_donation::domain::repo::Store;
    let marker = |s: &blood_donation::domain::repo::Snapshot| {
        s.user(donor.id).and_then(|r| r.last_donation_at)
    };
    assert_eq!(marker(&h.store.load().await.unwrap()), Some(long_ago));

    assert!(!api.is_in_cooldown(donor.id).await.unwrap());
    assert_eq!(marker(&h.store.load().await.unwrap()), None);

    assert!(api.cooldown_remaining(donor.id).await.unwrap().is_none());
}

#[tokio::test]
async fn last_donation_wins() {
    let h = harness();
    let service = h.module.service();
    let api = h.module.api();

    let donor = h
        .register("Lekha", UserRole::Volunteer, BloodGroup::APositive, "Adoor")
        .await;
    let requestor = h
        .register("Lal", UserRole::Requestor, BloodGroup::APositive, "Adoor")
        .await;
    let first = api
        .create_request(requestor.id, new_request(BloodGroup::APositive, "Adoor"))
        .await
        .unwrap();
    let second = api
        .create_request(requestor.id, new_request(BloodGroup::APositive, "Adoor"))
        .await
        .unwrap();

    let t0 = Utc::now() - Duration::days(30);
    service
        .record_donation_at(donor.id, first.id, t0)
        .await
        .unwrap();
    let t1 = t0 + Duration::days(10);
    service
        .record_donation_at(donor.id, second.id, t1)
        .await
        .unwrap();

    let checked_at = t0 + Duration::days(60);
    assert!(service.is_in_cooldown_at(donor.id, checked_at).await.unwrap());
    assert!(!service
        .is_in_cooldown_at(donor.id, t1 + Duration::days(59))
        .await
        .unwrap());
}

#[tokio::test]
async fn cooldown_for_unknown_donor_is_not_found() {
    let h = harness();
    let err = h.module.api().is_in_cooldown(Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, BloodDonationError::NotFound { entity: "User", .. }));
}

#[tokio::test]
async fn redonation_on_matched_allowed_closed_rejected() {
    let h = harness();
    let api = h.module.api();
    let service = h.module.service();

    let first = h
        .register("Suresh", UserRole::Volunteer, BloodGroup::OPositive, "Adoor")
        .await;
    let second = h
        .register("Sneha", UserRole::Volunteer, BloodGroup::OPositive, "Adoor")
        .await;
    let requestor = h
        .register("Sajan", UserRole::Requestor, BloodGroup::OPositive, "Adoor")
        .await;
    let request = api
        .create_request(requestor.id, new_request(BloodGroup::OPositive, "Adoor"))
        .await
        .unwrap();

    api.record_donation(first.id, request.id).await.unwrap();
    api.record_donation(second.id, request.id).await.unwrap();
    assert_eq!(
        api.get_request(request.id).await.unwrap().status,
        RequestStatus::Matched
    );

    let closed = api.close_request(requestor.id, request.id).await.unwrap();
    assert_eq!(closed.status, RequestStatus::Closed);

    let third = h
        .register("Sabu", UserRole::Volunteer, BloodGroup::OPositive, "Adoor")
        .await;
    match service.record_donation(third.id, request.id).await {
        Err(DomainError::InvalidTransition { from, to }) => {
            assert_eq!(from, RequestStatus::Closed);
            assert_eq!(to, RequestStatus::Matched);
        }
        other => panic!("expected InvalidTransition, got {other:?}"),
    }
    assert_eq!(api.get_user(third.id).await.unwrap().donations, 0);
}

#[tokio::test]
async fn only_owner_closes_and_closing_twice_is_a_noop() {
    let h = harness();
    let api = h.module.api();
    let owner = h
        .register("Omkar", UserRole::Requestor, BloodGroup::BPositive, "Adoor")
        .await;
    let stranger = h
        .register("Sinu", UserRole::Requestor, BloodGroup::BPositive, "Adoor")
        .await;
    let request = api
        .create_request(owner.id, new_request(BloodGroup::BPositive, "Adoor"))
        .await
        .unwrap();

    let err = api.close_request(stranger.id, request.id).await.unwrap_err();
    assert!(matches!(err, BloodDonationError::Validation { .. }));

    api.close_request(owner.id, request.id).await.unwrap();
    let again = api.close_request(owner.id, request.id).await.unwrap();
    assert_eq!(again.status, RequestStatus::Closed);
}

#[tokio::test]
async fn volunteers_cannot_post_requests() {
    let h = harness();
    let vol = h
        .register("Vishnu", UserRole::Volunteer, BloodGroup::OPositive, "Adoor")
        .await;
    let err = h
        .module
        .api()
        .create_request(vol.id, new_request(BloodGroup::OPositive, "Adoor"))
        .await
        .unwrap_err();
    assert!(matches!(err, BloodDonationError::Validation { .. }));
    assert!(h.module.api().list_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn request_validation() {
    let h = harness();
    let api = h.module.api();
    let requestor = h
        .register("Rani", UserRole::Requestor, BloodGroup::OPositive, "Adoor")
        .await;

    let mut zero_units = new_request(BloodGroup::OPositive, "Adoor");
    zero_units.units = 0;
    let mut too_many = new_request(BloodGroup::OPositive, "Adoor");
    too_many.units = 21;
    let mut no_hospital = new_request(BloodGroup::OPositive, "Adoor");
    no_hospital.hospital = "  ".into();

    for bad in [zero_units, too_many, no_hospital] {
        let err = api.create_request(requestor.id, bad).await.unwrap_err();
        assert!(err.is_recoverable(), "{err}");
    }

    let err = api
        .create_request(Uuid::new_v4(), new_request(BloodGroup::OPositive, "Adoor"))
        .await
        .unwrap_err();
    assert!(matches!(err, BloodDonationError::NotFound { entity: "User", .. }));
}

#[tokio::test]
async fn listings_are_newest_first_and_scoped() {
    let h = harness();
    let api = h.module.api();
    let vol = h
        .register("Varun", UserRole::Volunteer, BloodGroup::APositive, "Adoor")
        .await;
    let r1 = h
        .register("Reshma", UserRole::Requestor, BloodGroup::APositive, "Adoor")
        .await;
    let r2 = h
        .register("Rony", UserRole::Requestor, BloodGroup::APositive, "Adoor")
        .await;

    let a = api
        .create_request(r1.id, new_request(BloodGroup::APositive, "Adoor"))
        .await
        .unwrap();
    let b = api
        .create_request(r2.id, new_request(BloodGroup::APositive, "Adoor"))
        .await
        .unwrap();
    let c = api
        .create_request(r1.id, new_request(BloodGroup::OPositive, "Adoor"))
        .await
        .unwrap();

    let all: Vec<_> = api.list_requests().await.unwrap().iter().map(|r| r.id).collect();
    assert_eq!(all, vec![c.id, b.id, a.id]);

    let mine: Vec<_> = api
        .requests_by_requestor(r1.id)
        .await
        .unwrap()
        .iter()
        .map(|r| r.id)
        .collect();
    assert_eq!(mine, vec![c.id, a.id]);

    let for_me: Vec<_> = api
        .open_requests_for_volunteer(vol.id)
        .await
        .unwrap()
        .iter()
        .map(|r| r.id)
        .collect();
    assert_eq!(for_me, vec![b.id, a.id]);
}

#[tokio::test]
async fn profile_update_enforces_unique_email() {
    let h = harness();
    let api = h.module.api();
    let anu = h
        .register("Anu", UserRole::Volunteer, BloodGroup::APositive, "Adoor")
        .await;
    let _biju = h
        .register("Biju", UserRole::Volunteer, BloodGroup::APositive, "Adoor")
        .await;

    let err = api
        .update_profile(
            anu.id,
            UserPatch {
                email: Some("BIJU@example.com".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, BloodDonationError::DuplicateEmail { .. }));

    let updated = api
        .update_profile(
            anu.id,
            UserPatch {
                name: Some("Anu Mol".into()),
                email: Some("ANU@example.com".into()),
                locality: Some("Pathanamthitta".into()),
                role: Some(UserRole::Both),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.name, "Anu Mol");
    assert_eq!(updated.email, "ANU@example.com");
    assert_eq!(updated.locality, "Pathanamthitta");
    assert_eq!(updated.role, UserRole::Both);
    assert_eq!(updated.blood_group, BloodGroup::APositive);
}

#[tokio::test]
async fn notify_volunteer_on_demand() {
    let h = harness();
    let api = h.module.api();
    let vol = h
        .register("Vidya", UserRole::Volunteer, BloodGroup::AbNegative, "Adoor")
        .await;
    let requestor = h
        .register("Ranjith", UserRole::Requestor, BloodGroup::AbNegative, "Adoor")
        .await;
    let request = api
        .create_request(requestor.id, new_request(BloodGroup::AbNegative, "Adoor"))
        .await
        .unwrap();
    h.notifier.sent.lock().clear();

    api.notify_volunteer(request.id, vol.id).await.unwrap();
    assert_eq!(h.notifier.recipients(), vec![vol.id]);

    // not a match for this request
    let err = api
        .notify_volunteer(request.id, requestor.id)
        .await
        .unwrap_err();
    assert!(matches!(err, BloodDonationError::Validation { .. }));

    h.notifier.fail_for(vol.id);
    let err = api.notify_volunteer(request.id, vol.id).await.unwrap_err();
    assert_eq!(err, BloodDonationError::Internal);
}

#[tokio::test]
async fn notify_matches_keeps_going_past_a_failed_delivery() {
    let h = harness();
    let api = h.module.api();
    let unreachable = h
        .register("Ammu", UserRole::Volunteer, BloodGroup::APositive, "Adoor")
        .await;
    let reachable = h
        .register("Benny", UserRole::Both, BloodGroup::APositive, "Adoor")
        .await;
    let requestor = h
        .register("Chacko", UserRole::Requestor, BloodGroup::APositive, "Adoor")
        .await;
    let request = api
        .create_request(requestor.id, new_request(BloodGroup::APositive, "Adoor"))
        .await
        .unwrap();
    h.notifier.sent.lock().clear();
    h.notifier.fail_for(unreachable.id);

    let report = api.notify_matches(request.id).await.unwrap();
    assert_eq!(report.failed, vec![unreachable.id]);
    assert_eq!(report.delivered, vec![reachable.id]);
    assert_eq!(report.attempted(), 2);
    assert_eq!(h.notifier.recipients(), vec![reachable.id]);

    let err = api.notify_matches(Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, BloodDonationError::NotFound { .. }));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_donations_are_all_counted() {
    use blood_donation::domain::repo::Store;

    const DONATIONS: usize = 20;

    let h = harness();
    let api = h.module.api();
    let donor = h
        .register("Deepa", UserRole::Volunteer, BloodGroup::OPositive, "Adoor")
        .await;
    let requestor = h
        .register("Eapen", UserRole::Requestor, BloodGroup::OPositive, "Adoor")
        .await;
    let request = api
        .create_request(requestor.id, new_request(BloodGroup::OPositive, "Adoor"))
        .await
        .unwrap();
    let (donor_id, request_id) = (donor.id, request.id);

    let tasks: Vec<_> = (0..DONATIONS)
        .map(|_| {
            let api = api.clone();
            tokio::spawn(async move { api.record_donation(donor_id, request_id).await })
        })
        .collect();
    for joined in futures::future::join_all(tasks).await {
        joined.unwrap().unwrap();
    }

    let donor = api.get_user(donor_id).await.unwrap();
    assert_eq!(donor.donations as usize, DONATIONS);
    assert_eq!(api.donations_by_donor(donor_id).await.unwrap().len(), DONATIONS);
    assert_eq!(h.store.load().await.unwrap().donations.len(), DONATIONS);
    assert_eq!(
        api.get_request(request_id).await.unwrap().status,
        RequestStatus::Matched
    );
}
