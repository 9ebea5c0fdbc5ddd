//! Consent Types
//!
//! 同意記録に関連する型定義

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::types::Identity;

/// 同意の種類（処理目的）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsentType {
    /// 機能性クッキー（サイト動作に必須）
    Functional,
    /// 分析クッキー
    Analytics,
    /// マーケティングクッキー
    Marketing,
    /// データ処理
    DataProcessing,
}

impl ConsentType {
    /// 全種類（レポート集計の走査順）
    pub const ALL: [ConsentType; 4] = [
        ConsentType::Functional,
        ConsentType::Analytics,
        ConsentType::Marketing,
        ConsentType::DataProcessing,
    ];

    /// 正規化された文字列表現
    pub fn as_str(&self) -> &'static str {
        match self {
            ConsentType::Functional => "functional",
            ConsentType::Analytics => "analytics",
            ConsentType::Marketing => "marketing",
            ConsentType::DataProcessing => "data_processing",
        }
    }
}

impl std::fmt::Display for ConsentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ConsentType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "functional" => Ok(ConsentType::Functional),
            "analytics" => Ok(ConsentType::Analytics),
            "marketing" => Ok(ConsentType::Marketing),
            "data_processing" => Ok(ConsentType::DataProcessing),
            other => Err(Error::Validation(format!(
                "unknown consent type: {}",
                other
            ))),
        }
    }
}

/// 同意記録
///
/// (identity, consent_type) ごとに一意。提出のたびにupsertされ、
/// 同一アイデンティティ・同一種類の記録が重複することはない。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsentRecord {
    /// 記録ID
    pub id: Uuid,
    /// データ主体のアイデンティティ
    pub identity: Identity,
    /// 同意の種類
    pub consent_type: ConsentType,
    /// 同意が与えられたか
    pub consent_given: bool,
    /// 提出元IPアドレス
    pub ip_address: String,
    /// 記録日時
    pub timestamp: DateTime<Utc>,
    /// 有効期限（Noneは無期限）
    pub expiry_date: Option<DateTime<Utc>>,
    /// 法的根拠
    pub legal_basis: String,
}

impl ConsentRecord {
    /// 新しい同意記録を作成
    ///
    /// 有効期限は現在時刻 + retention_days。
    pub fn new(
        identity: Identity,
        consent_type: ConsentType,
        consent_given: bool,
        ip_address: impl Into<String>,
        retention_days: i64,
    ) -> Self {
        let timestamp = Utc::now();
        Self {
            id: Uuid::new_v4(),
            identity,
            consent_type,
            consent_given,
            ip_address: ip_address.into(),
            timestamp,
            expiry_date: Some(timestamp + Duration::days(retention_days)),
            legal_basis: "consent".to_string(),
        }
    }

    /// 指定時刻において有効な同意か
    ///
    /// consent_given=true かつ（期限なし、または期限が未来）のとき有効。
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.consent_given && self.expiry_date.map_or(true, |expiry| expiry > now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_consent_type_roundtrip() {
        for consent_type in ConsentType::ALL {
            let parsed: ConsentType = consent_type.as_str().parse().unwrap();
            assert_eq!(parsed, consent_type);
        }
        assert!("cookies".parse::<ConsentType>().is_err());
    }

    #[test]
    fn test_validity_window() {
        let record = ConsentRecord::new(
            Identity::AnonymousSession("abc".to_string()),
            ConsentType::Marketing,
            true,
            "203.0.113.10",
            1,
        );
        let now = Utc::now();
        assert!(record.is_valid_at(now));
        // 期限を過ぎると無効
        assert!(!record.is_valid_at(now + Duration::days(2)));
    }

    #[test]
    fn test_denied_consent_never_valid() {
        let record = ConsentRecord::new(
            Identity::AnonymousSession("abc".to_string()),
            ConsentType::Analytics,
            false,
            "203.0.113.10",
            365,
        );
        assert!(!record.is_valid_at(Utc::now()));
    }
}
