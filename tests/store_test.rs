//! Store Backend Integration Tests

use std::sync::Arc;

use chrono::{Duration, Utc};
use gdpr_rs::consent::{ConsentRecord, ConsentType};
use gdpr_rs::policy::PrivacyPolicy;
use gdpr_rs::requests::{DataSubjectRequest, SubmitRequest};
use gdpr_rs::store::{ConsentStore, JsonFileStore, PolicyStore, RequestStore};
use gdpr_rs::{Error, Identity};

fn sample_consent(session: &str) -> ConsentRecord {
    ConsentRecord::new(
        Identity::AnonymousSession(session.to_string()),
        ConsentType::Marketing,
        true,
        "203.0.113.10",
        365,
    )
}

fn sample_request() -> DataSubjectRequest {
    DataSubjectRequest::new(SubmitRequest {
        request_type: gdpr_rs::requests::RequestType::Erasure,
        email: "a@b.com".to_string(),
        full_name: "A".to_string(),
        description: String::new(),
    })
}

#[tokio::test]
async fn test_json_file_store_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.json");

    let consent = sample_consent("abc");
    let request = sample_request();

    // 書き込んで閉じる
    {
        let store = JsonFileStore::open(&path).unwrap();
        store.upsert_consent(consent.clone()).await.unwrap();
        store.insert_request(request.clone()).await.unwrap();
    }

    // 開き直しても状態が残っている
    let store = JsonFileStore::open(&path).unwrap();
    let identity = Identity::AnonymousSession("abc".to_string());
    let reloaded = store
        .find_consent(&identity, ConsentType::Marketing)
        .await
        .unwrap()
        .expect("consent should survive reopen");
    assert_eq!(reloaded.id, consent.id);

    let reloaded = store
        .get_request(request.id)
        .await
        .unwrap()
        .expect("request should survive reopen");
    assert_eq!(reloaded.email, "a@b.com");
}

#[tokio::test]
async fn test_json_file_store_reads_do_not_touch_disk_state() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.json");

    let store = JsonFileStore::open(&path).unwrap();
    store.upsert_consent(sample_consent("abc")).await.unwrap();
    let written = std::fs::read_to_string(&path).unwrap();

    let identity = Identity::AnonymousSession("abc".to_string());
    store
        .find_consent(&identity, ConsentType::Marketing)
        .await
        .unwrap();
    store.consents_for_identity(&identity).await.unwrap();

    assert_eq!(std::fs::read_to_string(&path).unwrap(), written);
}

#[tokio::test]
async fn test_duplicate_request_insert_rejected() {
    let store = Arc::new(gdpr_rs::store::MemoryStore::new());
    let request = sample_request();
    store.insert_request(request.clone()).await.unwrap();
    assert!(matches!(
        store.insert_request(request).await,
        Err(Error::AlreadyExists(_))
    ));
}

#[tokio::test]
async fn test_latest_active_policy_by_effective_date() {
    let store = gdpr_rs::store::MemoryStore::new();

    let old = PrivacyPolicy::new("1.0", "old text", Utc::now() - Duration::days(200), "en");
    let current = PrivacyPolicy::new("2.0", "current text", Utc::now() - Duration::days(10), "en");
    let mut inactive = PrivacyPolicy::new("3.0", "draft", Utc::now(), "en");
    inactive.is_active = false;
    let japanese = PrivacyPolicy::new("2.0", "日本語版", Utc::now() - Duration::days(10), "ja");

    store.publish_policy(old).await.unwrap();
    store.publish_policy(current).await.unwrap();
    store.publish_policy(inactive).await.unwrap();
    store.publish_policy(japanese).await.unwrap();

    // 有効版のうちeffective_dateが最新のもの
    let latest = store.latest_active_policy("en").await.unwrap().unwrap();
    assert_eq!(latest.version, "2.0");
    assert_eq!(latest.content, "current text");

    let latest_ja = store.latest_active_policy("ja").await.unwrap().unwrap();
    assert_eq!(latest_ja.content, "日本語版");

    assert!(store.latest_active_policy("de").await.unwrap().is_none());
}

#[tokio::test]
async fn test_same_version_different_language_allowed() {
    let store = gdpr_rs::store::MemoryStore::new();
    store
        .publish_policy(PrivacyPolicy::new("1.0", "en text", Utc::now(), "en"))
        .await
        .unwrap();
    // 同一バージョンでも言語が違えば公開できる
    store
        .publish_policy(PrivacyPolicy::new("1.0", "ja text", Utc::now(), "ja"))
        .await
        .unwrap();
    // 同一 (version, language) は拒否
    assert!(store
        .publish_policy(PrivacyPolicy::new("1.0", "dup", Utc::now(), "en"))
        .await
        .is_err());
}
