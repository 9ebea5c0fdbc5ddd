//! Data Subject Request Types
//!
//! データ主体リクエストに関連する型定義

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::error::Error;

/// データ主体リクエストの種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestType {
    /// アクセス権（GDPR Art.15）
    Access,
    /// 訂正権（GDPR Art.16）
    Rectification,
    /// 削除権（GDPR Art.17）
    Erasure,
    /// ポータビリティ権（GDPR Art.20）
    Portability,
    /// 処理制限権（GDPR Art.18）
    Restriction,
    /// 異議申立権（GDPR Art.21）
    Objection,
}

impl RequestType {
    /// 全種類（レポート集計の走査順）
    pub const ALL: [RequestType; 6] = [
        RequestType::Access,
        RequestType::Rectification,
        RequestType::Erasure,
        RequestType::Portability,
        RequestType::Restriction,
        RequestType::Objection,
    ];

    /// 正規化された文字列表現
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestType::Access => "access",
            RequestType::Rectification => "rectification",
            RequestType::Erasure => "erasure",
            RequestType::Portability => "portability",
            RequestType::Restriction => "restriction",
            RequestType::Objection => "objection",
        }
    }

    /// 通知メールの件名に使う表示名
    pub fn display_name(&self) -> &'static str {
        match self {
            RequestType::Access => "Data Access",
            RequestType::Rectification => "Data Rectification",
            RequestType::Erasure => "Data Erasure",
            RequestType::Portability => "Data Portability",
            RequestType::Restriction => "Processing Restriction",
            RequestType::Objection => "Processing Objection",
        }
    }
}

impl std::fmt::Display for RequestType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RequestType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s {
            "access" => Ok(RequestType::Access),
            "rectification" => Ok(RequestType::Rectification),
            "erasure" => Ok(RequestType::Erasure),
            "portability" => Ok(RequestType::Portability),
            "restriction" => Ok(RequestType::Restriction),
            "objection" => Ok(RequestType::Objection),
            other => Err(Error::Validation(format!(
                "unknown request type: {}",
                other
            ))),
        }
    }
}

/// リクエスト処理ステータス
///
/// pending → processing → {completed, rejected}
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    /// 受付済み
    Pending,
    /// 処理中
    Processing,
    /// 完了（終端）
    Completed,
    /// 拒否（終端）
    Rejected,
}

impl RequestStatus {
    /// 終端ステータスか
    pub fn is_terminal(&self) -> bool {
        matches!(self, RequestStatus::Completed | RequestStatus::Rejected)
    }

    /// 正規化された文字列表現
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Processing => "processing",
            RequestStatus::Completed => "completed",
            RequestStatus::Rejected => "rejected",
        }
    }
}

impl std::fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// データ主体リクエスト
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataSubjectRequest {
    /// リクエストID
    pub id: Uuid,
    /// リクエストの種類
    pub request_type: RequestType,
    /// 申請者のメールアドレス
    pub email: String,
    /// 申請者のフルネーム
    pub full_name: String,
    /// リクエスト内容
    pub description: String,
    /// 処理ステータス
    pub status: RequestStatus,
    /// 受付日時
    pub created_at: DateTime<Utc>,
    /// 終端遷移日時（completed/rejectedでのみ設定）
    pub processed_at: Option<DateTime<Utc>>,
    /// 処理結果テキスト
    pub response: String,
}

/// リクエスト提出の入力
///
/// `validator`で検証してから受け付ける。
#[derive(Debug, Clone, Validate, Serialize, Deserialize)]
pub struct SubmitRequest {
    /// リクエストの種類
    pub request_type: RequestType,
    /// 申請者のメールアドレス
    #[validate(email(message = "invalid email address"))]
    pub email: String,
    /// 申請者のフルネーム
    #[validate(length(min = 1, max = 200, message = "full name is required"))]
    pub full_name: String,
    /// リクエスト内容
    pub description: String,
}

impl DataSubjectRequest {
    /// 受付済みステータスで新しいリクエストを作成
    pub fn new(submission: SubmitRequest) -> Self {
        Self {
            id: Uuid::new_v4(),
            request_type: submission.request_type,
            email: submission.email,
            full_name: submission.full_name,
            description: submission.description,
            status: RequestStatus::Pending,
            created_at: Utc::now(),
            processed_at: None,
            response: String::new(),
        }
    }
}
