//! Compliance Report Types
//!
//! コンプライアンスレポートの集計結果型。構造化（JSON）と整形テキストの
//! 両方の出力は同一の集計から決定的に導出される。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::consent::ConsentType;
use crate::error::Result;
use crate::requests::{RequestStatus, RequestType};

/// レポート対象期間（半開区間 [start_date, end_date)）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportPeriod {
    /// 期間開始
    pub start_date: DateTime<Utc>,
    /// 期間終了
    pub end_date: DateTime<Utc>,
    /// 期間日数
    pub days: i64,
}

/// 同意種類別の統計
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsentTypeStat {
    /// 同意の種類
    pub consent_type: ConsentType,
    /// 期間内の記録総数
    pub total: u64,
    /// うち同意が与えられた数
    pub granted: u64,
    /// 同意率（totalが0のときは0.0）
    pub rate: f64,
}

/// (リクエスト種類, ステータス) 別の件数
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestStat {
    /// リクエストの種類
    pub request_type: RequestType,
    /// ステータス
    pub status: RequestStatus,
    /// 件数
    pub count: u64,
}

/// コンプライアンスレポート
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplianceReport {
    /// レポートID
    pub id: Uuid,
    /// 対象期間
    pub report_period: ReportPeriod,
    /// 同意統計
    pub consent_statistics: Vec<ConsentTypeStat>,
    /// リクエスト統計
    pub data_subject_requests: Vec<RequestStat>,
    /// 期間内に検知された侵害数
    pub data_breaches: u64,
    /// 生成日時
    pub generated_at: DateTime<Utc>,
}

impl ComplianceReport {
    /// JSONとして出力
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// 整形テキストとして出力
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        out.push_str("=== PRIVACY COMPLIANCE REPORT ===\n");
        out.push_str(&format!(
            "Period: {} to {}\n\n",
            self.report_period.start_date.to_rfc3339(),
            self.report_period.end_date.to_rfc3339()
        ));

        out.push_str("Consent Statistics:\n");
        for stat in &self.consent_statistics {
            out.push_str(&format!(
                "  {}: {}/{} ({:.1}%)\n",
                stat.consent_type,
                stat.granted,
                stat.total,
                stat.rate * 100.0
            ));
        }

        out.push_str("\nData Subject Requests:\n");
        for stat in &self.data_subject_requests {
            out.push_str(&format!(
                "  {} ({}): {}\n",
                stat.request_type, stat.status, stat.count
            ));
        }

        out.push_str(&format!("\nData Breaches: {}\n", self.data_breaches));
        out
    }
}
