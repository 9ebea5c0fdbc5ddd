//! Data Breach Log
//!
//! データ侵害の追記専用ログ。記録は作成後に変更されない。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 侵害の種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BreachType {
    /// 機密性侵害
    Confidentiality,
    /// 完全性侵害
    Integrity,
    /// 可用性侵害
    Availability,
}

/// 重要度
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BreachSeverity {
    Low,
    Medium,
    High,
    Critical,
}

/// データ侵害記録
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataBreach {
    /// 記録ID
    pub id: Uuid,
    /// 侵害の種類
    pub breach_type: BreachType,
    /// 重要度
    pub severity: BreachSeverity,
    /// 内容
    pub description: String,
    /// 影響を受けたレコード数
    pub affected_records: u64,
    /// 検知日時
    pub detection_date: DateTime<Utc>,
    /// 監督当局への通知が必要か
    pub notification_required: bool,
    /// 監督当局へ通知済みか
    pub authority_notified: bool,
    /// データ主体へ通知済みか
    pub subjects_notified: bool,
}

impl DataBreach {
    /// 検知日時を現在として新しい侵害記録を作成
    pub fn new(
        breach_type: BreachType,
        severity: BreachSeverity,
        description: impl Into<String>,
        affected_records: u64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            breach_type,
            severity,
            description: description.into(),
            affected_records,
            detection_date: Utc::now(),
            notification_required: true,
            authority_notified: false,
            subjects_notified: false,
        }
    }
}
