//! Compliance Reporter
//!
//! 期間内の同意・リクエスト・侵害の統計を集計する

mod types;

pub use types::{ComplianceReport, ConsentTypeStat, ReportPeriod, RequestStat};

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::consent::ConsentType;
use crate::error::Result;
use crate::requests::{RequestStatus, RequestType};
use crate::store::{BreachStore, ComplianceStore, ConsentStore, RequestStore};

/// コンプライアンスレポート生成
pub struct ComplianceReporter {
    store: Arc<dyn ComplianceStore>,
}

impl ComplianceReporter {
    /// ストアからレポーターを構築
    pub fn new(store: Arc<dyn ComplianceStore>) -> Self {
        Self { store }
    }

    /// [start, end) のコンプライアンスレポートを生成
    ///
    /// 同意率は granted/total、total=0 のときは0。集計結果の並び順は
    /// 型の宣言順で決定的。
    pub async fn generate_report(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<ComplianceReport> {
        let consents = self.store.consents_recorded_between(start, end).await?;
        let mut consent_statistics = Vec::with_capacity(ConsentType::ALL.len());
        for consent_type in ConsentType::ALL {
            let total = consents
                .iter()
                .filter(|record| record.consent_type == consent_type)
                .count() as u64;
            let granted = consents
                .iter()
                .filter(|record| record.consent_type == consent_type && record.consent_given)
                .count() as u64;
            let rate = if total == 0 {
                0.0
            } else {
                granted as f64 / total as f64
            };
            consent_statistics.push(ConsentTypeStat {
                consent_type,
                total,
                granted,
                rate,
            });
        }

        let requests = self.store.requests_created_between(start, end).await?;
        let mut counts: HashMap<(RequestType, RequestStatus), u64> = HashMap::new();
        for request in &requests {
            *counts.entry((request.request_type, request.status)).or_insert(0) += 1;
        }
        let statuses = [
            RequestStatus::Pending,
            RequestStatus::Processing,
            RequestStatus::Completed,
            RequestStatus::Rejected,
        ];
        let mut data_subject_requests = Vec::new();
        for request_type in RequestType::ALL {
            for status in statuses {
                if let Some(&count) = counts.get(&(request_type, status)) {
                    data_subject_requests.push(RequestStat {
                        request_type,
                        status,
                        count,
                    });
                }
            }
        }

        let data_breaches = self.store.count_breaches_between(start, end).await?;

        Ok(ComplianceReport {
            id: Uuid::new_v4(),
            report_period: ReportPeriod {
                start_date: start,
                end_date: end,
                days: (end - start).num_days(),
            },
            consent_statistics,
            data_subject_requests,
            data_breaches,
            generated_at: Utc::now(),
        })
    }
}
