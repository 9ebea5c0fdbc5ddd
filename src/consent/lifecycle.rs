//! Consent Lifecycle
//!
//! 同意の記録・検証・失効を司るコア。同意記録の所有者はConsentLifecycleで
//! あり、提出のたびに(identity, consent_type)キーでupsertされる。

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use tracing::{debug, info};

use super::types::{ConsentRecord, ConsentType};
use crate::config::ComplianceConfig;
use crate::error::Result;
use crate::store::ConsentStore;
use crate::types::Identity;

/// 同意ライフサイクル管理
pub struct ConsentLifecycle {
    store: Arc<dyn ConsentStore>,
    config: ComplianceConfig,
}

impl ConsentLifecycle {
    /// ストアと設定からライフサイクルを構築
    pub fn new(store: Arc<dyn ConsentStore>, config: ComplianceConfig) -> Self {
        Self { store, config }
    }

    /// 同意を記録
    ///
    /// (identity, consent_type)でupsertし、有効期限を現在 + retention_days
    /// （省略時は設定のconsent_ttl_days）に設定する。
    pub async fn record_consent(
        &self,
        identity: Identity,
        consent_type: ConsentType,
        consent_given: bool,
        ip_address: &str,
        retention_days: Option<i64>,
    ) -> Result<ConsentRecord> {
        let retention_days = retention_days.unwrap_or(self.config.consent_ttl_days);
        let record = ConsentRecord::new(
            identity,
            consent_type,
            consent_given,
            ip_address,
            retention_days,
        );
        let stored = self.store.upsert_consent(record).await?;
        debug!(
            identity = %stored.identity,
            consent_type = %stored.consent_type,
            consent_given = stored.consent_given,
            "consent recorded"
        );
        Ok(stored)
    }

    /// 有効な同意があるか
    ///
    /// consent_given=true かつ（期限なし、または期限が未来）の記録が
    /// 存在するときtrue。
    pub async fn has_valid_consent(
        &self,
        identity: &Identity,
        consent_type: ConsentType,
    ) -> Result<bool> {
        let record = self.store.find_consent(identity, consent_type).await?;
        Ok(record.map_or(false, |record| record.is_valid_at(Utc::now())))
    }

    /// 期限切れの同意記録を削除
    ///
    /// expiry_date < cutoff（省略時は現在時刻）の記録を削除する。
    /// dry_runのときは削除せずに対象件数のみを返す。
    pub async fn expire_consents(
        &self,
        cutoff: Option<DateTime<Utc>>,
        dry_run: bool,
    ) -> Result<u64> {
        let cutoff = cutoff.unwrap_or_else(Utc::now);
        let count = if dry_run {
            self.store.count_consents_expired_before(cutoff).await?
        } else {
            let deleted = self.store.delete_consents_expired_before(cutoff).await?;
            if deleted > 0 {
                info!(deleted, %cutoff, "expired consent records purged");
            }
            deleted
        };
        Ok(count)
    }

    /// 指定日に期限を迎える、同意が与えられている記録
    pub async fn consents_expiring_on(&self, date: NaiveDate) -> Result<Vec<ConsentRecord>> {
        let records = self.store.consents_expiring_on(date).await?;
        Ok(records
            .into_iter()
            .filter(|record| record.consent_given)
            .collect())
    }

    /// アイデンティティの現在の同意記録一覧
    pub async fn consents_for(&self, identity: &Identity) -> Result<Vec<ConsentRecord>> {
        self.store.consents_for_identity(identity).await
    }

    /// 同意ガード
    ///
    /// 配信層が呼び出す明示的なガード関数。対象外パスはfalse、それ以外は
    /// 有効な機能性同意が無い場合にtrue（同意取得が必要）を返す。
    pub async fn requires_consent(
        &self,
        path: &str,
        identity: Option<&Identity>,
    ) -> Result<bool> {
        if self
            .config
            .exempt_paths
            .iter()
            .any(|prefix| path.starts_with(prefix.as_str()))
        {
            return Ok(false);
        }

        match identity {
            Some(identity) => Ok(!self
                .has_valid_consent(identity, ConsentType::Functional)
                .await?),
            // アイデンティティが確立していなければ同意も存在しない
            None => Ok(true),
        }
    }
}
