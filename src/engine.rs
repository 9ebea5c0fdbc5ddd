//! Compliance Engine
//!
//! コンプライアンスライフサイクルのメインエンジン。永続化ストアと
//! 通知送信者のコラボレーターを束ね、各コンポーネントを配線する。

use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::breach::DataBreach;
use crate::config::ComplianceConfig;
use crate::consent::ConsentLifecycle;
use crate::error::Result;
use crate::export::{DataExporter, ExportFormat};
use crate::notify::Notifier;
use crate::policy::PrivacyPolicy;
use crate::report::ComplianceReporter;
use crate::requests::RequestLifecycle;
use crate::scheduler::{RetentionScheduler, RetryStrategy};
use crate::store::{ComplianceStore, ConsentStore, RequestStore};
use crate::types::UserProfile;

/// コンプライアンスエンジン
pub struct ComplianceEngine<S: ComplianceStore + 'static> {
    store: Arc<S>,
    consents: Arc<ConsentLifecycle>,
    requests: Arc<RequestLifecycle>,
    reporter: Arc<ComplianceReporter>,
    exporter: DataExporter,
    scheduler: Arc<RetentionScheduler>,
}

impl<S: ComplianceStore + 'static> ComplianceEngine<S> {
    /// ストアと通知送信者からエンジンを構築
    pub fn new(config: ComplianceConfig, store: Arc<S>, notifier: Arc<dyn Notifier>) -> Self {
        let consent_store: Arc<dyn ConsentStore> = store.clone();
        let request_store: Arc<dyn RequestStore> = store.clone();
        let reporter_store: Arc<dyn ComplianceStore> = store.clone();
        let exporter_store: Arc<dyn ComplianceStore> = store.clone();
        let scheduler_store: Arc<dyn ComplianceStore> = store.clone();
        let consents = Arc::new(ConsentLifecycle::new(consent_store, config.clone()));
        let requests = Arc::new(RequestLifecycle::new(
            request_store,
            Arc::clone(&notifier),
        ));
        let reporter = Arc::new(ComplianceReporter::new(reporter_store));
        let exporter = DataExporter::new(exporter_store);
        let scheduler = Arc::new(RetentionScheduler::new(
            scheduler_store,
            notifier,
            Arc::clone(&consents),
            Arc::clone(&reporter),
            config,
            RetryStrategy::default_exponential(),
        ));

        Self {
            store,
            consents,
            requests,
            reporter,
            exporter,
            scheduler,
        }
    }

    /// 同意ライフサイクル
    pub fn consents(&self) -> &ConsentLifecycle {
        &self.consents
    }

    /// リクエストライフサイクル
    pub fn requests(&self) -> &RequestLifecycle {
        &self.requests
    }

    /// レポーター
    pub fn reporter(&self) -> &ComplianceReporter {
        &self.reporter
    }

    /// 保持スケジューラー
    pub fn scheduler(&self) -> &RetentionScheduler {
        &self.scheduler
    }

    /// データ侵害を記録（追記専用）
    pub async fn record_breach(&self, breach: DataBreach) -> Result<DataBreach> {
        self.store.append_breach(breach).await
    }

    /// プライバシーポリシー版を公開
    pub async fn publish_policy(&self, policy: PrivacyPolicy) -> Result<PrivacyPolicy> {
        self.store.publish_policy(policy).await
    }

    /// 指定言語の最新有効ポリシー
    pub async fn active_policy(&self, language: &str) -> Result<Option<PrivacyPolicy>> {
        self.store.latest_active_policy(language).await
    }

    /// ユーザープロファイルを登録
    pub async fn register_user(&self, user: UserProfile) -> Result<UserProfile> {
        self.store.put_user(user).await
    }

    /// ユーザーデータをエクスポート
    pub async fn export_user_data(&self, email: &str, format: ExportFormat) -> Result<String> {
        self.exporter.export_as(email, format).await
    }

    /// 定期実行ループを開始
    pub fn start_scheduler(&self) -> Vec<JoinHandle<()>> {
        self.scheduler.start()
    }
}
