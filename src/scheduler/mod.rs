//! Retention Scheduler
//!
//! 定期トリガーで呼ばれる保持・通知ジョブ群:
//! - 日次（02:00）: 期限切れ同意の削除と終端リクエストの保持期限削除
//! - 月次（1日 03:00）: 直近30日のコンプライアンスレポート生成
//! - 期限切れ事前通知: N日後に期限を迎える同意の所有ユーザーへ通知
//!
//! 各ジョブは独立した非同期タスクとして実行され、一時的な失敗は
//! RetryStrategyで限定回数リトライされる。

mod retry;

pub use retry::RetryStrategy;

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::config::ComplianceConfig;
use crate::consent::ConsentLifecycle;
use crate::error::{Error, Result};
use crate::notify::Notifier;
use crate::report::{ComplianceReport, ComplianceReporter};
use crate::store::{ComplianceStore, ReportStore, RequestStore, UserStore};

/// 日次クリーンアップの結果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleanupOutcome {
    /// 削除された（dry-run時は削除対象の）期限切れ同意数
    pub expired_consents: u64,
    /// 削除された（dry-run時は削除対象の）古い終端リクエスト数
    pub purged_requests: u64,
    /// dry-runだったか
    pub dry_run: bool,
}

/// 期限切れ事前通知の結果
///
/// 失敗はアイデンティティ単位で分離され、バッチ全体を中断しない。
#[derive(Debug, Clone, Default)]
pub struct ExpiryNoticeOutcome {
    /// 通知に成功した宛先
    pub notified: Vec<String>,
    /// 宛先ごとの失敗（identity, エラー内容）
    pub failed: Vec<(String, String)>,
}

/// 保持スケジューラー
pub struct RetentionScheduler {
    store: Arc<dyn ComplianceStore>,
    notifier: Arc<dyn Notifier>,
    consents: Arc<ConsentLifecycle>,
    reporter: Arc<ComplianceReporter>,
    config: ComplianceConfig,
    retry: RetryStrategy,
}

impl RetentionScheduler {
    /// スケジューラーを構築
    pub fn new(
        store: Arc<dyn ComplianceStore>,
        notifier: Arc<dyn Notifier>,
        consents: Arc<ConsentLifecycle>,
        reporter: Arc<ComplianceReporter>,
        config: ComplianceConfig,
        retry: RetryStrategy,
    ) -> Self {
        Self {
            store,
            notifier,
            consents,
            reporter,
            config,
            retry,
        }
    }

    /// 日次クリーンアップ
    ///
    /// 期限切れ同意を削除し、保持期限（デフォルト365日）を過ぎた
    /// 終端ステータスのリクエストを削除する。dry_runのときは件数の
    /// 報告のみで状態を変更しない。
    pub async fn run_daily_cleanup(&self, dry_run: bool, retention_days: Option<i64>) -> Result<CleanupOutcome> {
        let retention_days = retention_days.unwrap_or(self.config.retention_days);
        let cutoff = Utc::now() - Duration::days(retention_days);

        let expired_consents = self.consents.expire_consents(None, dry_run).await?;

        let purged_requests = if dry_run {
            self.store.count_terminal_requests_before(cutoff).await?
        } else {
            self.store.delete_terminal_requests_before(cutoff).await?
        };

        if dry_run {
            info!(
                expired_consents,
                purged_requests, "dry run: nothing deleted"
            );
        } else {
            info!(expired_consents, purged_requests, "daily cleanup finished");
        }

        Ok(CleanupOutcome {
            expired_consents,
            purged_requests,
            dry_run,
        })
    }

    /// 月次レポート
    ///
    /// 直近30日のコンプライアンスレポートを生成し、ストアに保存する。
    pub async fn run_monthly_report(&self) -> Result<ComplianceReport> {
        let end = Utc::now();
        let start = end - Duration::days(30);
        let report = self.reporter.generate_report(start, end).await?;
        self.store.save_report(report.clone()).await?;
        info!(report_id = %report.id, "monthly compliance report generated");
        Ok(report)
    }

    /// 期限切れ事前通知
    ///
    /// days_ahead日後（デフォルト30日）に期限を迎える同意について、
    /// 所有する認証済みユーザーへ1回だけ通知する。宛先ごとの失敗は
    /// 分離して報告し、バッチは継続する。
    pub async fn notify_expiring_consents(
        &self,
        days_ahead: Option<i64>,
    ) -> Result<ExpiryNoticeOutcome> {
        let days_ahead = days_ahead.unwrap_or(self.config.expiry_notice_days);
        let target_date = (Utc::now() + Duration::days(days_ahead)).date_naive();

        let expiring = self.consents.consents_expiring_on(target_date).await?;

        // ユーザーごとにまとめ、1実行につき1通知
        let mut per_user: BTreeMap<Uuid, Vec<&crate::consent::ConsentRecord>> = BTreeMap::new();
        for record in &expiring {
            if let Some(user_id) = record.identity.user_id() {
                per_user.entry(user_id).or_default().push(record);
            }
        }

        let mut outcome = ExpiryNoticeOutcome::default();
        for (user_id, records) in per_user {
            match self.send_expiry_notice(user_id, &records, days_ahead).await {
                Ok(email) => outcome.notified.push(email),
                Err(e) => {
                    warn!(user_id = %user_id, error = %e, "expiry notice failed");
                    outcome.failed.push((format!("user:{}", user_id), e.to_string()));
                }
            }
        }

        info!(
            notified = outcome.notified.len(),
            failed = outcome.failed.len(),
            days_ahead,
            "expiry notification batch finished"
        );
        Ok(outcome)
    }

    async fn send_expiry_notice(
        &self,
        user_id: Uuid,
        records: &[&crate::consent::ConsentRecord],
        days_ahead: i64,
    ) -> Result<String> {
        let user = self
            .store
            .find_user_by_id(user_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("user not found: {}", user_id)))?;

        let consent_types: Vec<&str> = records
            .iter()
            .map(|record| record.consent_type.as_str())
            .collect();
        let body = format!(
            "Dear {},\n\n\
             Your privacy preferences for {} will expire in {} days.\n\n\
             Please visit our consent management page to renew your preferences:\n\
             {}/consent/\n\n\
             Best regards,\n\
             Data Protection Team\n",
            user.display_name(),
            consent_types.join(", "),
            days_ahead,
            self.config.site_url
        );

        let recipient = user.email.clone();
        self.retry
            .execute(|| async {
                self.notifier
                    .send(
                        &recipient,
                        "Your Privacy Preferences Are Expiring",
                        &body,
                    )
                    .await
            })
            .await?;
        Ok(recipient)
    }

    /// 定期実行ループを開始
    ///
    /// 日次（02:00 UTC）と月次（1日 03:00 UTC）のループを独立タスクとして
    /// 起動する。ジョブの失敗はログに残し、次回のスケジュールで再試行する。
    pub fn start(self: &Arc<Self>) -> Vec<JoinHandle<()>> {
        let daily = {
            let scheduler = Arc::clone(self);
            tokio::spawn(async move {
                loop {
                    let wait = until(next_daily_run(Utc::now()));
                    tokio::time::sleep(wait).await;

                    if let Err(e) = scheduler.run_daily_cleanup(false, None).await {
                        error!(error = %e, "daily cleanup failed; will retry at next run");
                    }
                    if let Err(e) = scheduler.notify_expiring_consents(None).await {
                        error!(error = %e, "expiry notification failed; will retry at next run");
                    }
                }
            })
        };

        let monthly = {
            let scheduler = Arc::clone(self);
            tokio::spawn(async move {
                loop {
                    let wait = until(next_monthly_run(Utc::now()));
                    tokio::time::sleep(wait).await;

                    if let Err(e) = scheduler.run_monthly_report().await {
                        error!(error = %e, "monthly report failed; will retry at next run");
                    }
                }
            })
        };

        vec![daily, monthly]
    }
}

fn until(at: DateTime<Utc>) -> std::time::Duration {
    (at - Utc::now()).to_std().unwrap_or_default()
}

/// 次の日次実行時刻（02:00 UTC）
pub(crate) fn next_daily_run(after: DateTime<Utc>) -> DateTime<Utc> {
    let today = after
        .date_naive()
        .and_hms_opt(2, 0, 0)
        .expect("02:00 is a valid time")
        .and_utc();
    if today > after {
        today
    } else {
        today + Duration::days(1)
    }
}

/// 次の月次実行時刻（毎月1日 03:00 UTC）
pub(crate) fn next_monthly_run(after: DateTime<Utc>) -> DateTime<Utc> {
    let this_month = NaiveDate::from_ymd_opt(after.year(), after.month(), 1)
        .expect("day 1 always exists")
        .and_hms_opt(3, 0, 0)
        .expect("03:00 is a valid time")
        .and_utc();
    if this_month > after {
        return this_month;
    }
    let (year, month) = if after.month() == 12 {
        (after.year() + 1, 1)
    } else {
        (after.year(), after.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1)
        .expect("day 1 always exists")
        .and_hms_opt(3, 0, 0)
        .expect("03:00 is a valid time")
        .and_utc()
}
