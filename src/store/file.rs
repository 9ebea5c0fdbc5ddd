//! JSON File Store
//!
//! CLI向けの永続バックエンド。インメモリストアのスナップショットを
//! JSONファイルに書き出す。書き込みは一時ファイル経由で行い、
//! 部分書き込みされたファイルが残らないようにする。

use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use super::memory::MemoryStore;
use super::{BreachStore, ConsentStore, PolicyStore, ReportStore, RequestStore, UserStore};
use crate::breach::DataBreach;
use crate::consent::{ConsentRecord, ConsentType};
use crate::error::Result;
use crate::policy::PrivacyPolicy;
use crate::report::ComplianceReport;
use crate::requests::{DataSubjectRequest, RequestStatus};
use crate::types::{Identity, UserProfile};

/// JSONファイルストア
#[derive(Debug)]
pub struct JsonFileStore {
    inner: MemoryStore,
    path: PathBuf,
}

impl JsonFileStore {
    /// ファイルを開く（存在しなければ空の状態から始める）
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let inner = if path.exists() {
            let data = std::fs::read_to_string(&path)?;
            MemoryStore::from_state(serde_json::from_str(&data)?)
        } else {
            MemoryStore::new()
        };
        Ok(Self { inner, path })
    }

    async fn persist(&self) -> Result<()> {
        let state = self.inner.snapshot().await;
        let json = serde_json::to_string_pretty(&state)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl ConsentStore for JsonFileStore {
    async fn upsert_consent(&self, record: ConsentRecord) -> Result<ConsentRecord> {
        let stored = self.inner.upsert_consent(record).await?;
        self.persist().await?;
        Ok(stored)
    }

    async fn find_consent(
        &self,
        identity: &Identity,
        consent_type: ConsentType,
    ) -> Result<Option<ConsentRecord>> {
        self.inner.find_consent(identity, consent_type).await
    }

    async fn consents_for_identity(&self, identity: &Identity) -> Result<Vec<ConsentRecord>> {
        self.inner.consents_for_identity(identity).await
    }

    async fn count_consents_expired_before(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        self.inner.count_consents_expired_before(cutoff).await
    }

    async fn delete_consents_expired_before(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let deleted = self.inner.delete_consents_expired_before(cutoff).await?;
        if deleted > 0 {
            self.persist().await?;
        }
        Ok(deleted)
    }

    async fn consents_expiring_on(&self, date: NaiveDate) -> Result<Vec<ConsentRecord>> {
        self.inner.consents_expiring_on(date).await
    }

    async fn consents_recorded_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<ConsentRecord>> {
        self.inner.consents_recorded_between(start, end).await
    }
}

#[async_trait::async_trait]
impl RequestStore for JsonFileStore {
    async fn insert_request(&self, request: DataSubjectRequest) -> Result<DataSubjectRequest> {
        let stored = self.inner.insert_request(request).await?;
        self.persist().await?;
        Ok(stored)
    }

    async fn get_request(&self, id: Uuid) -> Result<Option<DataSubjectRequest>> {
        self.inner.get_request(id).await
    }

    async fn compare_and_update_request(
        &self,
        id: Uuid,
        expected: RequestStatus,
        next: RequestStatus,
        response: Option<String>,
        processed_at: Option<DateTime<Utc>>,
    ) -> Result<(DataSubjectRequest, bool)> {
        let (request, applied) = self
            .inner
            .compare_and_update_request(id, expected, next, response, processed_at)
            .await?;
        if applied {
            self.persist().await?;
        }
        Ok((request, applied))
    }

    async fn requests_by_email(&self, email: &str) -> Result<Vec<DataSubjectRequest>> {
        self.inner.requests_by_email(email).await
    }

    async fn count_terminal_requests_before(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        self.inner.count_terminal_requests_before(cutoff).await
    }

    async fn delete_terminal_requests_before(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let deleted = self.inner.delete_terminal_requests_before(cutoff).await?;
        if deleted > 0 {
            self.persist().await?;
        }
        Ok(deleted)
    }

    async fn requests_created_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<DataSubjectRequest>> {
        self.inner.requests_created_between(start, end).await
    }
}

#[async_trait::async_trait]
impl BreachStore for JsonFileStore {
    async fn append_breach(&self, breach: DataBreach) -> Result<DataBreach> {
        let stored = self.inner.append_breach(breach).await?;
        self.persist().await?;
        Ok(stored)
    }

    async fn count_breaches_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<u64> {
        self.inner.count_breaches_between(start, end).await
    }
}

#[async_trait::async_trait]
impl PolicyStore for JsonFileStore {
    async fn publish_policy(&self, policy: PrivacyPolicy) -> Result<PrivacyPolicy> {
        let stored = self.inner.publish_policy(policy).await?;
        self.persist().await?;
        Ok(stored)
    }

    async fn latest_active_policy(&self, language: &str) -> Result<Option<PrivacyPolicy>> {
        self.inner.latest_active_policy(language).await
    }
}

#[async_trait::async_trait]
impl UserStore for JsonFileStore {
    async fn put_user(&self, user: UserProfile) -> Result<UserProfile> {
        let stored = self.inner.put_user(user).await?;
        self.persist().await?;
        Ok(stored)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserProfile>> {
        self.inner.find_user_by_email(email).await
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<UserProfile>> {
        self.inner.find_user_by_id(id).await
    }
}

#[async_trait::async_trait]
impl ReportStore for JsonFileStore {
    async fn save_report(&self, report: ComplianceReport) -> Result<()> {
        self.inner.save_report(report).await?;
        self.persist().await
    }

    async fn list_reports(&self) -> Result<Vec<ComplianceReport>> {
        self.inner.list_reports().await
    }
}
