//! Request Lifecycle
//!
//! データ主体リクエストの状態機械:
//! pending → processing → {completed, rejected}
//!
//! 終端遷移はストアのcompare-and-setを通すため、同一リクエストへの同時
//! 遷移があっても通知はちょうど1回だけ送られる。

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use super::types::{DataSubjectRequest, RequestStatus, SubmitRequest};
use crate::error::{Error, Result};
use crate::notify::Notifier;
use crate::store::RequestStore;

/// リクエストライフサイクル管理
pub struct RequestLifecycle {
    store: Arc<dyn RequestStore>,
    notifier: Arc<dyn Notifier>,
}

impl RequestLifecycle {
    /// ストアと通知送信者からライフサイクルを構築
    pub fn new(store: Arc<dyn RequestStore>, notifier: Arc<dyn Notifier>) -> Self {
        Self { store, notifier }
    }

    /// リクエストを提出（ステータス=pending）
    ///
    /// 受付確認の通知はベストエフォート。配送に失敗しても提出自体は
    /// 同期的に成功する。
    pub async fn submit(&self, submission: SubmitRequest) -> Result<DataSubjectRequest> {
        submission
            .validate()
            .map_err(|e| Error::Validation(e.to_string()))?;

        let request = DataSubjectRequest::new(submission);
        let stored = self.store.insert_request(request).await?;
        info!(request_id = %stored.id, request_type = %stored.request_type, "data subject request submitted");

        // 受付確認メール（失敗は記録のみ）
        if let Err(e) = self
            .notifier
            .send(
                &stored.email,
                "Data Subject Request Confirmation",
                "Your request has been received and will be processed within 30 days.",
            )
            .await
        {
            warn!(request_id = %stored.id, error = %e, "confirmation notice failed");
        }

        Ok(stored)
    }

    /// リクエストを取得
    pub async fn get(&self, id: Uuid) -> Result<DataSubjectRequest> {
        self.store
            .get_request(id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("request not found: {}", id)))
    }

    /// pending → processing へ進める
    ///
    /// 既にprocessingまたは終端の場合は何もしない（冪等）。
    pub async fn advance(&self, id: Uuid) -> Result<DataSubjectRequest> {
        let (request, applied) = self
            .store
            .compare_and_update_request(
                id,
                RequestStatus::Pending,
                RequestStatus::Processing,
                None,
                None,
            )
            .await?;
        if applied {
            info!(request_id = %id, "request advanced to processing");
        }
        Ok(request)
    }

    /// processing → completed（終端）
    pub async fn complete(&self, id: Uuid, response: impl Into<String>) -> Result<DataSubjectRequest> {
        self.finish(id, RequestStatus::Completed, response.into())
            .await
    }

    /// processing → rejected（終端）
    pub async fn reject(&self, id: Uuid, response: impl Into<String>) -> Result<DataSubjectRequest> {
        self.finish(id, RequestStatus::Rejected, response.into())
            .await
    }

    async fn finish(
        &self,
        id: Uuid,
        terminal: RequestStatus,
        response: String,
    ) -> Result<DataSubjectRequest> {
        let (request, applied) = self
            .store
            .compare_and_update_request(
                id,
                RequestStatus::Processing,
                terminal,
                Some(response),
                Some(Utc::now()),
            )
            .await?;

        if !applied {
            return Err(Error::InvalidState(format!(
                "request {} is {}, terminal transition requires processing",
                id, request.status
            )));
        }

        info!(request_id = %id, status = %request.status, "request reached terminal state");

        // 終端遷移ごとにちょうど1回の通知。配送失敗はログに残すのみで、
        // リトライはスケジューラー層の責務。
        let subject = format!(
            "Your {} Request - {}",
            request.request_type.display_name(),
            match terminal {
                RequestStatus::Completed => "Completed",
                _ => "Rejected",
            }
        );
        let body = format!(
            "Dear {},\n\n\
             Your data subject request has been processed.\n\n\
             Request ID: {}\n\
             Request Type: {}\n\
             Status: {}\n\n\
             Response: {}\n\n\
             Best regards,\n\
             Data Protection Team\n",
            request.full_name, request.id, request.request_type.display_name(), request.status, request.response
        );
        if let Err(e) = self.notifier.send(&request.email, &subject, &body).await {
            warn!(request_id = %id, error = %e, "terminal notification failed");
        }

        Ok(request)
    }
}
