//! Retry Strategies
//!
//! スケジュールジョブのリトライとバックオフ戦略。一時的な失敗
//! （通知配送・ストア障害）のみリトライし、検証エラー等は即座に返す。

use std::time::Duration;

use tokio::time::sleep;
use tracing::{info, warn};

use crate::error::{Error, Result};

/// リトライ戦略
#[derive(Debug, Clone)]
pub enum RetryStrategy {
    /// 固定間隔でリトライ
    FixedInterval {
        interval: Duration,
        max_attempts: u32,
    },
    /// 指数バックオフ
    ExponentialBackoff {
        initial_delay: Duration,
        max_delay: Duration,
        multiplier: f64,
        max_attempts: u32,
    },
}

impl RetryStrategy {
    /// デフォルトの指数バックオフ戦略（最大3回）
    pub fn default_exponential() -> Self {
        Self::ExponentialBackoff {
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(30),
            multiplier: 2.0,
            max_attempts: 3,
        }
    }

    /// 試行回数の上限
    pub fn max_attempts(&self) -> u32 {
        match self {
            Self::FixedInterval { max_attempts, .. } => *max_attempts,
            Self::ExponentialBackoff { max_attempts, .. } => *max_attempts,
        }
    }

    /// n回目の試行失敗後の待ち時間（上限超過はNone）
    fn delay_after(&self, attempt: u32) -> Option<Duration> {
        if attempt >= self.max_attempts() {
            return None;
        }
        match self {
            Self::FixedInterval { interval, .. } => Some(*interval),
            Self::ExponentialBackoff {
                initial_delay,
                max_delay,
                multiplier,
                ..
            } => {
                let factor = multiplier.powi(attempt.saturating_sub(1) as i32);
                let delay =
                    Duration::from_millis(((initial_delay.as_millis() as f64) * factor) as u64);
                Some(delay.min(*max_delay))
            }
        }
    }

    /// リトライ可能な操作を実行
    ///
    /// 一時的なエラーのみリトライする。リトライ上限を使い切った場合は
    /// 最後のエラーを返す。
    pub async fn execute<F, T, Fut>(&self, operation: F) -> Result<T>
    where
        F: Fn() -> Fut + Send + Sync,
        Fut: std::future::Future<Output = Result<T>> + Send,
        T: Send,
    {
        let max_attempts = self.max_attempts();
        let mut last_error: Option<Error> = None;

        for attempt in 1..=max_attempts {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) => {
                    if !e.is_transient() {
                        return Err(e);
                    }
                    if let Some(delay) = self.delay_after(attempt) {
                        info!(
                            attempt,
                            max_attempts,
                            delay_ms = delay.as_millis() as u64,
                            error = %e,
                            "retrying after transient failure"
                        );
                        last_error = Some(e);
                        sleep(delay).await;
                    } else {
                        warn!(attempt, max_attempts, error = %e, "retry budget exhausted");
                        last_error = Some(e);
                    }
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| Error::Storage("retry executed zero attempts".to_string())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn test_transient_failure_retried_until_success() {
        let strategy = RetryStrategy::FixedInterval {
            interval: Duration::from_millis(1),
            max_attempts: 3,
        };
        let attempts = AtomicU32::new(0);

        let result = strategy
            .execute(|| async {
                if attempts.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(Error::Notify("temporarily unavailable".to_string()))
                } else {
                    Ok(42)
                }
            })
            .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_permanent_failure_not_retried() {
        let strategy = RetryStrategy::default_exponential();
        let attempts = AtomicU32::new(0);

        let result: Result<()> = strategy
            .execute(|| async {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err(Error::Validation("bad input".to_string()))
            })
            .await;

        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_budget_exhaustion_returns_last_error() {
        let strategy = RetryStrategy::FixedInterval {
            interval: Duration::from_millis(1),
            max_attempts: 3,
        };
        let attempts = AtomicU32::new(0);

        let result: Result<()> = strategy
            .execute(|| async {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err(Error::Notify("still down".to_string()))
            })
            .await;

        assert!(matches!(result, Err(Error::Notify(_))));
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }
}
