//! Data Subject Request Lifecycle Integration Tests

use std::sync::Arc;

use gdpr_rs::notify::MemoryNotifier;
use gdpr_rs::requests::{RequestLifecycle, RequestStatus, RequestType, SubmitRequest};
use gdpr_rs::store::MemoryStore;
use gdpr_rs::Error;

fn submission() -> SubmitRequest {
    SubmitRequest {
        request_type: RequestType::Erasure,
        email: "a@b.com".to_string(),
        full_name: "Alice Example".to_string(),
        description: "Please delete my account data".to_string(),
    }
}

fn lifecycle() -> (RequestLifecycle, Arc<MemoryNotifier>) {
    let store = Arc::new(MemoryStore::new());
    let notifier = Arc::new(MemoryNotifier::new());
    (
        RequestLifecycle::new(store, notifier.clone()),
        notifier,
    )
}

#[tokio::test]
async fn test_full_request_scenario() {
    let (requests, notifier) = lifecycle();

    // 提出 → pending
    let request = requests.submit(submission()).await.unwrap();
    assert_eq!(request.status, RequestStatus::Pending);
    assert!(request.processed_at.is_none());

    // 受付確認が1通
    assert_eq!(notifier.sent_to("a@b.com").await, 1);

    // advance → processing
    let request = requests.advance(request.id).await.unwrap();
    assert_eq!(request.status, RequestStatus::Processing);
    assert!(request.processed_at.is_none());

    // complete → completed、processed_at設定、終端通知が1通
    let request = requests.complete(request.id, "done").await.unwrap();
    assert_eq!(request.status, RequestStatus::Completed);
    assert!(request.processed_at.is_some());
    assert_eq!(request.response, "done");
    assert_eq!(notifier.sent_to("a@b.com").await, 2);
}

#[tokio::test]
async fn test_terminal_transitions_require_processing() {
    let (requests, notifier) = lifecycle();

    let request = requests.submit(submission()).await.unwrap();

    // pendingからの終端遷移は状態エラー
    assert!(matches!(
        requests.complete(request.id, "done").await,
        Err(Error::InvalidState(_))
    ));
    assert!(matches!(
        requests.reject(request.id, "no").await,
        Err(Error::InvalidState(_))
    ));

    // 失敗した遷移は通知を送らない（受付確認のみ）
    assert_eq!(notifier.sent_to("a@b.com").await, 1);
}

#[tokio::test]
async fn test_advance_is_idempotent() {
    let (requests, _notifier) = lifecycle();

    let request = requests.submit(submission()).await.unwrap();
    requests.advance(request.id).await.unwrap();

    // 2回目のadvanceは何もしない
    let again = requests.advance(request.id).await.unwrap();
    assert_eq!(again.status, RequestStatus::Processing);

    // 終端後のadvanceも何もしない
    requests.complete(request.id, "done").await.unwrap();
    let after_terminal = requests.advance(request.id).await.unwrap();
    assert_eq!(after_terminal.status, RequestStatus::Completed);
}

#[tokio::test]
async fn test_terminal_transition_fires_exactly_once() {
    let (requests, notifier) = lifecycle();

    let request = requests.submit(submission()).await.unwrap();
    requests.advance(request.id).await.unwrap();
    requests.reject(request.id, "insufficient identification").await.unwrap();

    // 2回目の終端遷移は失敗し、通知は増えない
    assert!(requests.complete(request.id, "done").await.is_err());
    assert!(requests.reject(request.id, "again").await.is_err());
    assert_eq!(notifier.sent_to("a@b.com").await, 2);
}

#[tokio::test]
async fn test_unknown_request_id_is_not_found() {
    let (requests, _notifier) = lifecycle();
    let unknown = uuid::Uuid::new_v4();

    assert!(matches!(
        requests.advance(unknown).await,
        Err(Error::NotFound(_))
    ));
    assert!(matches!(
        requests.complete(unknown, "done").await,
        Err(Error::NotFound(_))
    ));
    assert!(matches!(
        requests.reject(unknown, "no").await,
        Err(Error::NotFound(_))
    ));
}

#[tokio::test]
async fn test_submission_survives_confirmation_failure() {
    let (requests, notifier) = lifecycle();

    // 受付確認の配送が失敗しても提出は成功する
    notifier.fail_recipient("a@b.com").await;
    let request = requests.submit(submission()).await.unwrap();
    assert_eq!(request.status, RequestStatus::Pending);
    assert_eq!(notifier.sent_to("a@b.com").await, 0);
}

#[tokio::test]
async fn test_submission_rejects_invalid_input() {
    let (requests, _notifier) = lifecycle();

    let bad_email = SubmitRequest {
        email: "not-an-email".to_string(),
        ..submission()
    };
    assert!(matches!(
        requests.submit(bad_email).await,
        Err(Error::Validation(_))
    ));
}
