//! Persistence Store
//!
//! 同意・リクエスト・侵害・ポリシー（およびユーザープロファイルと
//! レポート出力）に対するCRUDと範囲クエリを提供する永続化コラボレーター。
//! 複合キーの一意制約に対するアトミックなupsertと、日付フィールドの
//! 範囲クエリをサポートする。

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::breach::DataBreach;
use crate::consent::{ConsentRecord, ConsentType};
use crate::error::Result;
use crate::policy::PrivacyPolicy;
use crate::report::ComplianceReport;
use crate::requests::{DataSubjectRequest, RequestStatus};
use crate::types::{Identity, UserProfile};

mod file;
mod memory;

pub use file::JsonFileStore;
pub use memory::MemoryStore;

/// 同意記録ストア
///
/// (identity, consent_type) ごとに高々1件。upsertはアトミックで、
/// 同一アイデンティティからの同時提出でも一意性が保たれる。
#[async_trait]
pub trait ConsentStore: Send + Sync {
    /// (identity, consent_type) をキーにupsert
    async fn upsert_consent(&self, record: ConsentRecord) -> Result<ConsentRecord>;

    /// 単一の同意記録を取得
    async fn find_consent(
        &self,
        identity: &Identity,
        consent_type: ConsentType,
    ) -> Result<Option<ConsentRecord>>;

    /// アイデンティティの全同意記録を取得
    async fn consents_for_identity(&self, identity: &Identity) -> Result<Vec<ConsentRecord>>;

    /// expiry_date < cutoff の記録数（dry-run用）
    async fn count_consents_expired_before(&self, cutoff: DateTime<Utc>) -> Result<u64>;

    /// expiry_date < cutoff の記録を削除し、削除数を返す
    async fn delete_consents_expired_before(&self, cutoff: DateTime<Utc>) -> Result<u64>;

    /// 指定日に期限を迎える同意記録
    async fn consents_expiring_on(&self, date: NaiveDate) -> Result<Vec<ConsentRecord>>;

    /// timestamp が [start, end) に入る記録（レポート集計用）
    async fn consents_recorded_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<ConsentRecord>>;
}

/// データ主体リクエストストア
#[async_trait]
pub trait RequestStore: Send + Sync {
    /// 新規リクエストを保存
    async fn insert_request(&self, request: DataSubjectRequest) -> Result<DataSubjectRequest>;

    /// リクエストを取得
    async fn get_request(&self, id: Uuid) -> Result<Option<DataSubjectRequest>>;

    /// ステータスのcompare-and-set更新
    ///
    /// 現在のステータスが `expected` に一致する場合のみ `next` へ遷移し、
    /// response と processed_at を設定する。戻り値は更新後（不一致の場合は
    /// 現状のまま）のリクエストと、遷移が適用されたかどうか。同一リクエスト
    /// への同時遷移が終端通知を二重発火させないための排他点。
    async fn compare_and_update_request(
        &self,
        id: Uuid,
        expected: RequestStatus,
        next: RequestStatus,
        response: Option<String>,
        processed_at: Option<DateTime<Utc>>,
    ) -> Result<(DataSubjectRequest, bool)>;

    /// メールアドレスで検索
    async fn requests_by_email(&self, email: &str) -> Result<Vec<DataSubjectRequest>>;

    /// created_at < cutoff の終端ステータスのリクエスト数（dry-run用）
    async fn count_terminal_requests_before(&self, cutoff: DateTime<Utc>) -> Result<u64>;

    /// created_at < cutoff の終端ステータスのリクエストを削除し、削除数を返す
    async fn delete_terminal_requests_before(&self, cutoff: DateTime<Utc>) -> Result<u64>;

    /// created_at が [start, end) に入るリクエスト（レポート集計用）
    async fn requests_created_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<DataSubjectRequest>>;
}

/// データ侵害ストア（追記専用）
#[async_trait]
pub trait BreachStore: Send + Sync {
    /// 侵害記録を追記
    async fn append_breach(&self, breach: DataBreach) -> Result<DataBreach>;

    /// detection_date が [start, end) に入る侵害数
    async fn count_breaches_between(&self, start: DateTime<Utc>, end: DateTime<Utc>)
        -> Result<u64>;
}

/// プライバシーポリシーストア
#[async_trait]
pub trait PolicyStore: Send + Sync {
    /// ポリシー版を公開。(version, language) が既に存在する場合はエラー
    async fn publish_policy(&self, policy: PrivacyPolicy) -> Result<PrivacyPolicy>;

    /// 指定言語の最新有効版（effective_dateが最大のもの）
    async fn latest_active_policy(&self, language: &str) -> Result<Option<PrivacyPolicy>>;
}

/// ユーザープロファイルストア
#[async_trait]
pub trait UserStore: Send + Sync {
    /// プロファイルを保存
    async fn put_user(&self, user: UserProfile) -> Result<UserProfile>;

    /// メールアドレスで検索
    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserProfile>>;

    /// IDで検索
    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<UserProfile>>;
}

/// レポートストア（月次ジョブの出力先）
#[async_trait]
pub trait ReportStore: Send + Sync {
    /// レポートを保存
    async fn save_report(&self, report: ComplianceReport) -> Result<()>;

    /// 保存済みレポートを生成日時順で取得
    async fn list_reports(&self) -> Result<Vec<ComplianceReport>>;
}

/// 全エンティティを扱う永続化コラボレーター
pub trait ComplianceStore:
    ConsentStore + RequestStore + BreachStore + PolicyStore + UserStore + ReportStore
{
}

impl<T> ComplianceStore for T where
    T: ConsentStore + RequestStore + BreachStore + PolicyStore + UserStore + ReportStore
{
}
