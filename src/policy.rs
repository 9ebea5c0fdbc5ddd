//! Privacy Policy Versions
//!
//! 言語ごとにバージョン管理されるプライバシーポリシー本文。
//! (version, language) ごとに高々1件。「最新の有効版」はeffective_dateで決まる。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// プライバシーポリシー
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrivacyPolicy {
    /// バージョン（例: "2.1"）
    pub version: String,
    /// 本文
    pub content: String,
    /// 発効日時
    pub effective_date: DateTime<Utc>,
    /// 言語コード（例: "en", "ja"）
    pub language: String,
    /// 有効フラグ
    pub is_active: bool,
}

impl PrivacyPolicy {
    /// 発効日時を指定して新しいポリシー版を作成
    pub fn new(
        version: impl Into<String>,
        content: impl Into<String>,
        effective_date: DateTime<Utc>,
        language: impl Into<String>,
    ) -> Self {
        Self {
            version: version.into(),
            content: content.into(),
            effective_date,
            language: language.into(),
            is_active: true,
        }
    }
}
