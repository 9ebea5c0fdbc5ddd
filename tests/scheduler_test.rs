//! Retention Scheduler Integration Tests

use std::sync::Arc;

use chrono::{Duration, Utc};
use gdpr_rs::consent::{ConsentRecord, ConsentType};
use gdpr_rs::notify::MemoryNotifier;
use gdpr_rs::requests::{DataSubjectRequest, RequestStatus, RequestType, SubmitRequest};
use gdpr_rs::store::{ConsentStore, MemoryStore, ReportStore, RequestStore};
use gdpr_rs::types::UserProfile;
use gdpr_rs::{ComplianceConfig, ComplianceEngine, Identity};

fn engine_with_store() -> (
    ComplianceEngine<MemoryStore>,
    Arc<MemoryStore>,
    Arc<MemoryNotifier>,
) {
    let store = Arc::new(MemoryStore::new());
    let notifier = Arc::new(MemoryNotifier::new());
    let engine = ComplianceEngine::new(
        ComplianceConfig::default(),
        store.clone(),
        notifier.clone(),
    );
    (engine, store, notifier)
}

fn terminal_request(age_days: i64) -> DataSubjectRequest {
    let mut request = DataSubjectRequest::new(SubmitRequest {
        request_type: RequestType::Access,
        email: "old@example.com".to_string(),
        full_name: "Old Requester".to_string(),
        description: String::new(),
    });
    request.status = RequestStatus::Completed;
    request.created_at = Utc::now() - Duration::days(age_days);
    request.processed_at = Some(request.created_at + Duration::days(1));
    request
}

fn expired_consent(session: &str) -> ConsentRecord {
    let mut record = ConsentRecord::new(
        Identity::AnonymousSession(session.to_string()),
        ConsentType::Analytics,
        true,
        "203.0.113.10",
        1,
    );
    record.expiry_date = Some(Utc::now() - Duration::days(1));
    record
}

#[tokio::test]
async fn test_daily_cleanup_purges_expired_and_old() {
    let (engine, store, _notifier) = engine_with_store();

    store.upsert_consent(expired_consent("a")).await.unwrap();
    store.upsert_consent(expired_consent("b")).await.unwrap();
    store.insert_request(terminal_request(400)).await.unwrap();
    // 保持期間内の終端リクエストは残る
    store.insert_request(terminal_request(100)).await.unwrap();
    // 保持期間超過でもpendingのリクエストは残る
    let mut pending = terminal_request(400);
    pending.status = RequestStatus::Pending;
    pending.processed_at = None;
    store.insert_request(pending.clone()).await.unwrap();

    let outcome = engine
        .scheduler()
        .run_daily_cleanup(false, None)
        .await
        .unwrap();

    assert_eq!(outcome.expired_consents, 2);
    assert_eq!(outcome.purged_requests, 1);
    assert!(store.get_request(pending.id).await.unwrap().is_some());
}

#[tokio::test]
async fn test_daily_cleanup_dry_run_reports_without_deleting() {
    let (engine, store, _notifier) = engine_with_store();

    store.upsert_consent(expired_consent("a")).await.unwrap();
    let old = terminal_request(400);
    store.insert_request(old.clone()).await.unwrap();

    let dry = engine
        .scheduler()
        .run_daily_cleanup(true, None)
        .await
        .unwrap();
    assert!(dry.dry_run);
    assert_eq!(dry.expired_consents, 1);
    assert_eq!(dry.purged_requests, 1);

    // 状態は変わっていない
    assert!(store.get_request(old.id).await.unwrap().is_some());

    // dry-runの報告件数は実削除件数と一致する
    let wet = engine
        .scheduler()
        .run_daily_cleanup(false, None)
        .await
        .unwrap();
    assert_eq!(wet.expired_consents, dry.expired_consents);
    assert_eq!(wet.purged_requests, dry.purged_requests);
}

#[tokio::test]
async fn test_cleanup_retention_window_is_configurable() {
    let (engine, store, _notifier) = engine_with_store();

    store.insert_request(terminal_request(100)).await.unwrap();

    // 90日の保持期間なら100日前の終端リクエストは削除対象
    let outcome = engine
        .scheduler()
        .run_daily_cleanup(false, Some(90))
        .await
        .unwrap();
    assert_eq!(outcome.purged_requests, 1);
}

#[tokio::test]
async fn test_monthly_report_is_persisted() {
    let (engine, store, _notifier) = engine_with_store();

    let identity = Identity::AnonymousSession("abc".to_string());
    engine
        .consents()
        .record_consent(identity, ConsentType::Marketing, true, "203.0.113.10", None)
        .await
        .unwrap();

    let report = engine.scheduler().run_monthly_report().await.unwrap();
    assert_eq!(report.report_period.days, 30);

    let saved = store.list_reports().await.unwrap();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].id, report.id);
}

async fn seed_user_with_expiring_consents(
    engine: &ComplianceEngine<MemoryStore>,
    store: &MemoryStore,
    email: &str,
    days_ahead: i64,
) -> UserProfile {
    let user = UserProfile {
        id: uuid::Uuid::new_v4(),
        username: email.split('@').next().unwrap().to_string(),
        email: email.to_string(),
        full_name: "Test User".to_string(),
        date_joined: Utc::now() - Duration::days(400),
        last_login: None,
    };
    engine.register_user(user.clone()).await.unwrap();

    // 同一ユーザーの2種類の同意が同じ日に期限を迎える
    for consent_type in [ConsentType::Marketing, ConsentType::Analytics] {
        let mut record = ConsentRecord::new(
            Identity::AuthenticatedUser(user.id),
            consent_type,
            true,
            "203.0.113.10",
            days_ahead,
        );
        record.expiry_date = Some(Utc::now() + Duration::days(days_ahead));
        store.upsert_consent(record).await.unwrap();
    }
    user
}

#[tokio::test]
async fn test_expiry_notice_sent_once_per_user() {
    let (engine, store, notifier) = engine_with_store();
    seed_user_with_expiring_consents(&engine, &store, "user@example.com", 30).await;

    let outcome = engine
        .scheduler()
        .notify_expiring_consents(None)
        .await
        .unwrap();

    assert_eq!(outcome.notified, vec!["user@example.com".to_string()]);
    assert!(outcome.failed.is_empty());
    // 2件の同意でも通知は1通
    assert_eq!(notifier.sent_to("user@example.com").await, 1);

    let sent = notifier.sent().await;
    assert!(sent[0].body.contains("marketing"));
    assert!(sent[0].body.contains("analytics"));
}

#[tokio::test]
async fn test_expiry_notice_skips_anonymous_sessions() {
    let (engine, store, notifier) = engine_with_store();

    let mut record = ConsentRecord::new(
        Identity::AnonymousSession("abc".to_string()),
        ConsentType::Marketing,
        true,
        "203.0.113.10",
        30,
    );
    record.expiry_date = Some(Utc::now() + Duration::days(30));
    store.upsert_consent(record).await.unwrap();

    let outcome = engine
        .scheduler()
        .notify_expiring_consents(None)
        .await
        .unwrap();

    // 匿名セッションには通知先が無い
    assert!(outcome.notified.is_empty());
    assert!(outcome.failed.is_empty());
    assert!(notifier.sent().await.is_empty());
}

#[tokio::test]
async fn test_expiry_notice_failures_are_isolated() {
    let (engine, store, notifier) = engine_with_store();

    seed_user_with_expiring_consents(&engine, &store, "ok@example.com", 30).await;
    seed_user_with_expiring_consents(&engine, &store, "down@example.com", 30).await;
    notifier.fail_recipient("down@example.com").await;

    let outcome = engine
        .scheduler()
        .notify_expiring_consents(None)
        .await
        .unwrap();

    // 1宛先の失敗はバッチ全体を中断しない
    assert_eq!(outcome.notified, vec!["ok@example.com".to_string()]);
    assert_eq!(outcome.failed.len(), 1);
    assert!(outcome.failed[0].1.contains("down@example.com"));
    assert_eq!(notifier.sent_to("ok@example.com").await, 1);
}

#[tokio::test]
async fn test_expiry_notice_respects_days_ahead() {
    let (engine, store, notifier) = engine_with_store();
    seed_user_with_expiring_consents(&engine, &store, "user@example.com", 7).await;

    // 30日先の照会では7日後期限の同意は対象外
    let outcome = engine
        .scheduler()
        .notify_expiring_consents(Some(30))
        .await
        .unwrap();
    assert!(outcome.notified.is_empty());

    let outcome = engine
        .scheduler()
        .notify_expiring_consents(Some(7))
        .await
        .unwrap();
    assert_eq!(outcome.notified.len(), 1);
    assert_eq!(notifier.sent_to("user@example.com").await, 1);
}
