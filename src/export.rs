//! User Data Export
//!
//! ポータビリティ権（GDPR Art.20）のためのユーザーデータ一括エクスポート。
//! 日時フィールドはすべてISO-8601（RFC 3339）文字列で出力される。

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::store::{ComplianceStore, ConsentStore, RequestStore, UserStore};
use crate::types::Identity;

/// エクスポート形式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
}

impl std::str::FromStr for ExportFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "json" => Ok(ExportFormat::Json),
            "csv" => Ok(ExportFormat::Csv),
            other => Err(Error::Validation(format!(
                "unknown export format: {} (expected json or csv)",
                other
            ))),
        }
    }
}

/// 個人情報セクション
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonalInformation {
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub date_joined: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

/// エクスポートされる同意記録
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsentRecordExport {
    pub consent_type: String,
    pub consent_given: bool,
    pub timestamp: DateTime<Utc>,
    pub legal_basis: String,
}

/// エクスポートされるデータ主体リクエスト
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestExport {
    pub request_type: String,
    pub description: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

/// ユーザーデータエクスポート
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserDataExport {
    pub personal_information: PersonalInformation,
    pub consent_records: Vec<ConsentRecordExport>,
    pub data_subject_requests: Vec<RequestExport>,
    pub export_timestamp: DateTime<Utc>,
}

impl UserDataExport {
    /// JSONとして出力
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// CSVとして出力
    ///
    /// 同意記録とリクエストをsection列で区別したフラットな表にする。
    pub fn to_csv(&self) -> Result<String> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(["section", "type", "status", "timestamp", "detail"])?;

        for record in &self.consent_records {
            let timestamp = record.timestamp.to_rfc3339();
            writer.write_record([
                "consent",
                record.consent_type.as_str(),
                if record.consent_given { "granted" } else { "denied" },
                timestamp.as_str(),
                record.legal_basis.as_str(),
            ])?;
        }
        for request in &self.data_subject_requests {
            let created_at = request.created_at.to_rfc3339();
            writer.write_record([
                "request",
                request.request_type.as_str(),
                request.status.as_str(),
                created_at.as_str(),
                request.description.as_str(),
            ])?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| Error::Storage(e.to_string()))?;
        String::from_utf8(bytes).map_err(|e| Error::Validation(e.to_string()))
    }
}

/// ユーザーデータエクスポーター
pub struct DataExporter {
    store: Arc<dyn ComplianceStore>,
}

impl DataExporter {
    /// ストアからエクスポーターを構築
    pub fn new(store: Arc<dyn ComplianceStore>) -> Self {
        Self { store }
    }

    /// 指定メールアドレスのユーザーの全データを収集
    ///
    /// ユーザーが存在しない場合はNotFound。
    pub async fn export_user_data(&self, email: &str) -> Result<UserDataExport> {
        let user = self
            .store
            .find_user_by_email(email)
            .await?
            .ok_or_else(|| Error::NotFound(format!("user with email {} not found", email)))?;

        let identity = Identity::AuthenticatedUser(user.id);
        let consents = self.store.consents_for_identity(&identity).await?;
        let requests = self.store.requests_by_email(email).await?;

        Ok(UserDataExport {
            personal_information: PersonalInformation {
                username: user.username,
                email: user.email,
                full_name: user.full_name,
                date_joined: user.date_joined,
                last_login: user.last_login,
            },
            consent_records: consents
                .into_iter()
                .map(|record| ConsentRecordExport {
                    consent_type: record.consent_type.as_str().to_string(),
                    consent_given: record.consent_given,
                    timestamp: record.timestamp,
                    legal_basis: record.legal_basis,
                })
                .collect(),
            data_subject_requests: requests
                .into_iter()
                .map(|request| RequestExport {
                    request_type: request.request_type.as_str().to_string(),
                    description: request.description,
                    status: request.status.as_str().to_string(),
                    created_at: request.created_at,
                })
                .collect(),
            export_timestamp: Utc::now(),
        })
    }

    /// 指定形式の文字列としてエクスポート
    pub async fn export_as(&self, email: &str, format: ExportFormat) -> Result<String> {
        let export = self.export_user_data(email).await?;
        match format {
            ExportFormat::Json => export.to_json(),
            ExportFormat::Csv => export.to_csv(),
        }
    }
}
