mod common;

use std::sync::Arc;
use std::time::Duration;

use assert_matches::assert_matches;
use common::*;
use payda_client::{
    dashboard::{CurrentUser, Dashboard, ViewFilter},
    errors::ClientError,
    models::{CouponStatus, NewNeed},
    PaydaBackend,
};
use rust_decimal_macros::dec;

fn draft(title: &str) -> NewNeed {
    NewNeed {
        user_id: 0,
        title: title.into(),
        description: Some("For the spring term".into()),
        category: "kirtasiye".into(),
        target_amount: dec!(1000),
    }
}

#[tokio::test]
async fn refresh_loads_every_slice() {
    let backend = FakeBackend::new();
    backend.set_items(vec![item(1, 2, dec!(100))]);
    backend.needs.lock().unwrap().push(need(1, "Books", dec!(800), dec!(1000)));
    backend.coupons.lock().unwrap().extend([
        coupon(10, 1, CouponStatus::Created, None),
        coupon(11, 2, CouponStatus::Assigned, Some(7)),
    ]);
    backend.donations.lock().unwrap().extend([
        donation(1, None, Some(1), 0),
        donation(2, Some(1), None, 5),
        donation(3, None, Some(2), 10),
    ]);

    let session = session_for(&backend, Some(7));
    session.refresh().await;
    let state = session.snapshot().await;

    assert_eq!(state.items.len(), 1);
    assert_eq!(state.active_needs.len(), 1);
    assert_eq!(state.unassigned_coupons.len(), 1);
    assert_eq!(state.my_coupons.len(), 1);
    let donation_ids: Vec<i64> = state.coupon_donations.iter().map(|d| d.id).collect();
    assert_eq!(donation_ids, vec![3, 1]);
    assert!(!state.loading);
    assert!(state.last_refreshed.is_some());
}

#[tokio::test]
async fn refresh_without_user_skips_own_coupons() {
    let backend = FakeBackend::new();
    let session = session_for(&backend, None);
    session.refresh().await;

    // items, needs, unassigned coupons, donations
    assert_eq!(backend.total_calls(), 4);
    assert_eq!(backend.calls_to(COUPONS), 1);
}

#[tokio::test]
async fn failed_read_keeps_previous_slice() {
    let backend = FakeBackend::new();
    backend.set_items(vec![item(1, 2, dec!(100))]);
    let session = session_for(&backend, Some(7));
    session.refresh().await;

    backend.fail(ITEMS);
    backend.set_items(vec![]);
    backend.needs.lock().unwrap().push(need(4, "Calculator", dec!(0), dec!(300)));
    session.refresh().await;

    let state = session.snapshot().await;
    assert_eq!(state.items.len(), 1, "failed read must not clear the slice");
    assert_eq!(state.active_needs.len(), 1, "other reads still apply");
    assert!(!state.loading);
}

#[tokio::test]
async fn claim_without_user_contacts_nobody() {
    let backend = FakeBackend::new();
    let session = session_for(&backend, None);

    let err = session.claim_coupon(1).await.unwrap_err();
    assert_matches!(err, ClientError::MissingUser);
    assert_eq!(backend.total_calls(), 0);
}

#[tokio::test]
async fn claim_of_held_type_issues_no_assignment() {
    let backend = FakeBackend::new();
    backend.coupons.lock().unwrap().extend([
        coupon(10, 3, CouponStatus::Assigned, Some(7)),
        coupon(11, 3, CouponStatus::Created, None),
    ]);
    let session = session_for(&backend, Some(7));
    session.refresh().await;
    let reads_before = backend.calls_to(COUPONS);

    let err = session.claim_coupon(3).await.unwrap_err();
    assert_matches!(err, ClientError::AlreadyClaimed(3));
    assert_eq!(backend.calls_to(ASSIGN), 0);
    assert_eq!(backend.calls_to(COUPONS), reads_before);
}

#[tokio::test]
async fn claim_without_matching_coupon_issues_no_assignment() {
    let backend = FakeBackend::new();
    backend
        .coupons
        .lock()
        .unwrap()
        .push(coupon(20, 8, CouponStatus::Created, None));
    let session = session_for(&backend, Some(7));

    let err = session.claim_coupon(5).await.unwrap_err();
    assert_matches!(err, ClientError::NoCouponAvailable(5));
    assert_eq!(backend.calls_to(ASSIGN), 0);
    assert!(session.notifications().lock().await.notifications().is_empty());
}

#[tokio::test(start_paused = true)]
async fn claim_assigns_first_match_and_refreshes_later() {
    let backend = FakeBackend::new();
    backend.coupons.lock().unwrap().extend([
        coupon(20, 8, CouponStatus::Created, None),
        coupon(21, 5, CouponStatus::Created, None),
        coupon(22, 5, CouponStatus::Created, None),
    ]);
    let session = session_for(&backend, Some(7));

    let claimed = session.claim_coupon(5).await.unwrap();
    assert_eq!(claimed.id, 21);
    assert_eq!(claimed.beneficiary_id, Some(7));
    assert_eq!(backend.calls_to(ASSIGN), 1);

    {
        let center = session.notifications().lock().await;
        assert_eq!(center.notifications().len(), 1);
        assert_eq!(center.notifications()[0].title, "Coupon Claimed");
    }

    // No optimistic update: the claim shows up with the delayed refresh
    assert!(session.snapshot().await.my_coupons.is_empty());
    tokio::time::sleep(Duration::from_millis(600)).await;
    assert_eq!(backend.calls_to(ITEMS), 1);
    let mine = session.snapshot().await.my_coupons;
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].id, 21);
    assert!(session.claimed_types().await.contains(&5));
}

#[tokio::test]
async fn claim_surfaces_unreachable_backend() {
    let backend = FakeBackend::new();
    backend
        .coupons
        .lock()
        .unwrap()
        .push(coupon(20, 5, CouponStatus::Created, None));
    backend.fail(ASSIGN);
    let session = session_for(&backend, Some(7));

    let err = session.claim_coupon(5).await.unwrap_err();
    assert_matches!(err, ClientError::Unreachable { .. });
    assert!(session.notifications().lock().await.notifications().is_empty());
}

#[tokio::test]
async fn claim_returns_backend_rejection_verbatim() {
    let backend = FakeBackend::new();
    backend
        .coupons
        .lock()
        .unwrap()
        .push(coupon(20, 5, CouponStatus::Created, None));
    backend.reject(ASSIGN, "Beneficiary already holds this coupon type");
    let session = session_for(&backend, Some(7));

    let err = session.claim_coupon(5).await.unwrap_err();
    assert_matches!(
        err,
        ClientError::Backend { status: 400, ref message }
            if message == "Beneficiary already holds this coupon type"
    );
    assert!(session.notifications().lock().await.notifications().is_empty());
}

#[tokio::test(start_paused = true)]
async fn closing_cancels_the_pending_refresh() {
    let backend = FakeBackend::new();
    backend
        .coupons
        .lock()
        .unwrap()
        .push(coupon(20, 5, CouponStatus::Created, None));
    let session = session_for(&backend, Some(7));

    session.claim_coupon(5).await.unwrap();
    session.close();
    tokio::time::sleep(Duration::from_secs(2)).await;

    assert_eq!(backend.calls_to(ITEMS), 0);
    assert!(session.is_closed());
}

#[tokio::test]
async fn use_coupon_requires_success_status() {
    let backend = FakeBackend::new();
    backend
        .coupons
        .lock()
        .unwrap()
        .push(coupon(30, 5, CouponStatus::Used, Some(7)));
    let session = session_for(&backend, Some(7));

    let err = session.use_coupon(30).await.unwrap_err();
    assert_matches!(err, ClientError::Backend { ref message, .. } if message == "Coupon already used");
}

#[tokio::test]
async fn use_coupon_notifies_on_success() {
    let backend = FakeBackend::new();
    backend
        .coupons
        .lock()
        .unwrap()
        .push(coupon(31, 5, CouponStatus::Assigned, Some(7)));
    let session = session_for(&backend, Some(7));

    let outcome = session.use_coupon(31).await.unwrap();
    assert!(outcome.is_success());
    let center = session.notifications().lock().await;
    assert_eq!(center.notifications()[0].title, "Coupon Used");
    session.close();
}

#[tokio::test]
async fn invalid_need_is_rejected_before_any_call() {
    let backend = FakeBackend::new();
    let session = session_for(&backend, Some(7));

    let err = session.create_need(draft("   ")).await.unwrap_err();
    assert_matches!(err, ClientError::Validation(_));
    assert_eq!(backend.total_calls(), 0);

    let mut all = draft("Books");
    all.category = "all".into();
    assert_matches!(session.create_need(all).await, Err(ClientError::Validation(_)));
    assert_eq!(backend.calls_to(CREATE_NEED), 0);
}

#[tokio::test]
async fn creating_a_need_posts_for_the_current_user_and_refreshes() {
    let backend = FakeBackend::new();
    let session = session_for(&backend, Some(7));

    let created = session.create_need(draft("  Exam books ")).await.unwrap();
    assert_eq!(created.title, "Exam books");
    assert_eq!(backend.needs.lock().unwrap()[0].user_id, 7);

    let needs = session.needs(&ViewFilter::search("exam")).await;
    assert_eq!(needs.len(), 1);
    let center = session.notifications().lock().await;
    assert_eq!(center.notifications()[0].message, "Exam books was created successfully.");
}

#[tokio::test]
async fn need_detail_lists_recent_donations_newest_first() {
    let backend = FakeBackend::new();
    backend.needs.lock().unwrap().push(need(1, "Books", dec!(800), dec!(1000)));
    {
        let mut donations = backend.donations.lock().unwrap();
        for minute in 0..12 {
            donations.push(donation(minute + 1, Some(1), None, minute));
        }
        donations.push(donation(99, Some(2), None, 100));
    }
    let session = session_for(&backend, None);

    let detail = session.need_detail(1).await.unwrap();
    assert_eq!(detail.need.progress(), dec!(80));
    assert_eq!(detail.recent_donations.len(), 10);
    assert_eq!(detail.recent_donations[0].id, 12);
    assert!(detail.recent_donations.iter().all(|d| d.need_id == Some(1)));
}

#[tokio::test]
async fn need_detail_of_unknown_need_fails() {
    let backend = FakeBackend::new();
    let session = session_for(&backend, None);
    assert_matches!(
        session.need_detail(42).await,
        Err(ClientError::Backend { status: 404, .. })
    );
}

#[tokio::test(start_paused = true)]
async fn welcome_notification_only_for_signed_in_users() {
    let backend = FakeBackend::new();

    let signed_in = session_for(&backend, Some(7));
    signed_in.start();
    let anonymous = session_for(&backend, None);
    anonymous.start();

    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(
        signed_in.notifications().lock().await.notifications()[0].title,
        "Welcome!"
    );
    assert!(anonymous.notifications().lock().await.notifications().is_empty());

    signed_in.close();
    anonymous.close();
}

#[tokio::test(start_paused = true)]
async fn closing_before_the_welcome_delay_cancels_it() {
    let backend = FakeBackend::new();
    let session = session_for(&backend, Some(7));
    session.start();

    tokio::time::sleep(Duration::from_millis(50)).await;
    session.close();
    tokio::time::sleep(Duration::from_millis(200)).await;

    assert!(session.notifications().lock().await.notifications().is_empty());
}

#[tokio::test(start_paused = true)]
async fn switching_user_cancels_the_previous_welcome() {
    let backend = FakeBackend::new();
    let dyn_backend: Arc<dyn PaydaBackend> = backend.clone();
    let mut dashboard = Dashboard::open(dyn_backend, config(), Some(CurrentUser::new(7))).await;
    let first = Arc::clone(dashboard.session());

    tokio::time::sleep(Duration::from_millis(50)).await;
    dashboard.switch_user(Some(CurrentUser::new(8))).await;
    tokio::time::sleep(Duration::from_millis(200)).await;

    assert!(first.notifications().lock().await.notifications().is_empty());
    let titles: Vec<String> = dashboard
        .session()
        .notifications()
        .lock()
        .await
        .notifications()
        .iter()
        .map(|n| n.title.clone())
        .collect();
    assert_eq!(titles, vec!["Welcome!".to_string()]);

    dashboard.close();
}

#[tokio::test(start_paused = true)]
async fn dropping_an_unclosed_session_stops_its_poller() {
    let backend = FakeBackend::new();
    let session = session_for(&backend, None);
    session.start();
    drop(session);

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(backend.calls_to(DONATIONS), 0);
}

#[tokio::test(start_paused = true)]
async fn switching_user_tears_down_the_previous_session() {
    let backend = FakeBackend::new();
    let dyn_backend: Arc<dyn PaydaBackend> = backend.clone();
    let mut dashboard = Dashboard::open(dyn_backend, config(), Some(CurrentUser::new(7))).await;
    let first = Arc::clone(dashboard.session());

    dashboard.switch_user(Some(CurrentUser::new(8))).await;
    assert!(first.is_closed());
    assert!(!dashboard.session().is_closed());
    assert_eq!(dashboard.session().user().map(|u| u.id), Some(8));

    dashboard.close();
    assert!(dashboard.session().is_closed());
}
