//! In-Memory Store
//!
//! 開発・テスト用のデフォルトバックエンド。単一のRwLockで全エンティティを
//! 保護し、ロック境界がそのままupsert/CASのアトミック性を与える。

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{BreachStore, ConsentStore, PolicyStore, ReportStore, RequestStore, UserStore};
use crate::breach::DataBreach;
use crate::consent::{ConsentRecord, ConsentType};
use crate::error::{Error, Result};
use crate::policy::PrivacyPolicy;
use crate::report::ComplianceReport;
use crate::requests::{DataSubjectRequest, RequestStatus};
use crate::types::{Identity, UserProfile};

fn consent_key(identity: &Identity, consent_type: ConsentType) -> String {
    format!("{}|{}", identity.key(), consent_type.as_str())
}

/// 全エンティティのシリアライズ可能なスナップショット
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct StoreState {
    pub(crate) consents: HashMap<String, ConsentRecord>,
    pub(crate) requests: HashMap<Uuid, DataSubjectRequest>,
    pub(crate) breaches: Vec<DataBreach>,
    pub(crate) policies: Vec<PrivacyPolicy>,
    pub(crate) users: HashMap<Uuid, UserProfile>,
    pub(crate) reports: Vec<ComplianceReport>,
}

/// インメモリストア
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<StoreState>>,
}

impl MemoryStore {
    /// 空のストアを作成
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_state(state: StoreState) -> Self {
        Self {
            state: Arc::new(RwLock::new(state)),
        }
    }

    pub(crate) async fn snapshot(&self) -> StoreState {
        self.state.read().await.clone()
    }
}

#[async_trait::async_trait]
impl ConsentStore for MemoryStore {
    async fn upsert_consent(&self, mut record: ConsentRecord) -> Result<ConsentRecord> {
        let mut state = self.state.write().await;
        let key = consent_key(&record.identity, record.consent_type);

        // 既存記録のIDと作成日時は保持する（行の差し替えではなく更新）
        if let Some(existing) = state.consents.get(&key) {
            record.id = existing.id;
            record.timestamp = existing.timestamp;
        }
        state.consents.insert(key, record.clone());
        Ok(record)
    }

    async fn find_consent(
        &self,
        identity: &Identity,
        consent_type: ConsentType,
    ) -> Result<Option<ConsentRecord>> {
        let state = self.state.read().await;
        Ok(state
            .consents
            .get(&consent_key(identity, consent_type))
            .cloned())
    }

    async fn consents_for_identity(&self, identity: &Identity) -> Result<Vec<ConsentRecord>> {
        let state = self.state.read().await;
        let mut records: Vec<ConsentRecord> = state
            .consents
            .values()
            .filter(|record| record.identity == *identity)
            .cloned()
            .collect();
        records.sort_by_key(|record| (record.timestamp, record.id));
        Ok(records)
    }

    async fn count_consents_expired_before(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let state = self.state.read().await;
        Ok(state
            .consents
            .values()
            .filter(|record| matches!(record.expiry_date, Some(expiry) if expiry < cutoff))
            .count() as u64)
    }

    async fn delete_consents_expired_before(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let mut state = self.state.write().await;
        let before = state.consents.len();
        state
            .consents
            .retain(|_, record| !matches!(record.expiry_date, Some(expiry) if expiry < cutoff));
        Ok((before - state.consents.len()) as u64)
    }

    async fn consents_expiring_on(&self, date: NaiveDate) -> Result<Vec<ConsentRecord>> {
        let state = self.state.read().await;
        let mut records: Vec<ConsentRecord> = state
            .consents
            .values()
            .filter(|record| {
                matches!(record.expiry_date, Some(expiry) if expiry.date_naive() == date)
            })
            .cloned()
            .collect();
        records.sort_by_key(|record| (record.timestamp, record.id));
        Ok(records)
    }

    async fn consents_recorded_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<ConsentRecord>> {
        let state = self.state.read().await;
        let mut records: Vec<ConsentRecord> = state
            .consents
            .values()
            .filter(|record| record.timestamp >= start && record.timestamp < end)
            .cloned()
            .collect();
        records.sort_by_key(|record| (record.timestamp, record.id));
        Ok(records)
    }
}

#[async_trait::async_trait]
impl RequestStore for MemoryStore {
    async fn insert_request(&self, request: DataSubjectRequest) -> Result<DataSubjectRequest> {
        let mut state = self.state.write().await;
        if state.requests.contains_key(&request.id) {
            return Err(Error::AlreadyExists(format!(
                "request already exists: {}",
                request.id
            )));
        }
        state.requests.insert(request.id, request.clone());
        Ok(request)
    }

    async fn get_request(&self, id: Uuid) -> Result<Option<DataSubjectRequest>> {
        let state = self.state.read().await;
        Ok(state.requests.get(&id).cloned())
    }

    async fn compare_and_update_request(
        &self,
        id: Uuid,
        expected: RequestStatus,
        next: RequestStatus,
        response: Option<String>,
        processed_at: Option<DateTime<Utc>>,
    ) -> Result<(DataSubjectRequest, bool)> {
        let mut state = self.state.write().await;
        let request = state
            .requests
            .get_mut(&id)
            .ok_or_else(|| Error::NotFound(format!("request not found: {}", id)))?;

        if request.status != expected {
            return Ok((request.clone(), false));
        }

        request.status = next;
        if let Some(response) = response {
            request.response = response;
        }
        if processed_at.is_some() {
            request.processed_at = processed_at;
        }
        Ok((request.clone(), true))
    }

    async fn requests_by_email(&self, email: &str) -> Result<Vec<DataSubjectRequest>> {
        let state = self.state.read().await;
        let mut requests: Vec<DataSubjectRequest> = state
            .requests
            .values()
            .filter(|request| request.email == email)
            .cloned()
            .collect();
        requests.sort_by_key(|request| (request.created_at, request.id));
        Ok(requests)
    }

    async fn count_terminal_requests_before(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let state = self.state.read().await;
        Ok(state
            .requests
            .values()
            .filter(|request| request.status.is_terminal() && request.created_at < cutoff)
            .count() as u64)
    }

    async fn delete_terminal_requests_before(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let mut state = self.state.write().await;
        let before = state.requests.len();
        state
            .requests
            .retain(|_, request| !(request.status.is_terminal() && request.created_at < cutoff));
        Ok((before - state.requests.len()) as u64)
    }

    async fn requests_created_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<DataSubjectRequest>> {
        let state = self.state.read().await;
        let mut requests: Vec<DataSubjectRequest> = state
            .requests
            .values()
            .filter(|request| request.created_at >= start && request.created_at < end)
            .cloned()
            .collect();
        requests.sort_by_key(|request| (request.created_at, request.id));
        Ok(requests)
    }
}

#[async_trait::async_trait]
impl BreachStore for MemoryStore {
    async fn append_breach(&self, breach: DataBreach) -> Result<DataBreach> {
        let mut state = self.state.write().await;
        state.breaches.push(breach.clone());
        Ok(breach)
    }

    async fn count_breaches_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<u64> {
        let state = self.state.read().await;
        Ok(state
            .breaches
            .iter()
            .filter(|breach| breach.detection_date >= start && breach.detection_date < end)
            .count() as u64)
    }
}

#[async_trait::async_trait]
impl PolicyStore for MemoryStore {
    async fn publish_policy(&self, policy: PrivacyPolicy) -> Result<PrivacyPolicy> {
        let mut state = self.state.write().await;
        let duplicate = state
            .policies
            .iter()
            .any(|existing| existing.version == policy.version && existing.language == policy.language);
        if duplicate {
            return Err(Error::AlreadyExists(format!(
                "policy version {} already published for language {}",
                policy.version, policy.language
            )));
        }
        state.policies.push(policy.clone());
        Ok(policy)
    }

    async fn latest_active_policy(&self, language: &str) -> Result<Option<PrivacyPolicy>> {
        let state = self.state.read().await;
        Ok(state
            .policies
            .iter()
            .filter(|policy| policy.is_active && policy.language == language)
            .max_by_key(|policy| policy.effective_date)
            .cloned())
    }
}

#[async_trait::async_trait]
impl UserStore for MemoryStore {
    async fn put_user(&self, user: UserProfile) -> Result<UserProfile> {
        let mut state = self.state.write().await;
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserProfile>> {
        let state = self.state.read().await;
        Ok(state
            .users
            .values()
            .find(|user| user.email == email)
            .cloned())
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<UserProfile>> {
        let state = self.state.read().await;
        Ok(state.users.get(&id).cloned())
    }
}

#[async_trait::async_trait]
impl ReportStore for MemoryStore {
    async fn save_report(&self, report: ComplianceReport) -> Result<()> {
        let mut state = self.state.write().await;
        state.reports.push(report);
        Ok(())
    }

    async fn list_reports(&self) -> Result<Vec<ComplianceReport>> {
        let state = self.state.read().await;
        let mut reports = state.reports.clone();
        reports.sort_by_key(|report| report.generated_at);
        Ok(reports)
    }
}
