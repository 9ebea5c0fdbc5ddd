//! Notifier
//!
//! 通知配送コラボレーター。配送エンジン（SMTP等）はこのクレートの
//! 範囲外であり、トレイトの向こう側に置く。

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::info;

use crate::error::{Error, Result};

/// 通知送信者トレイト
#[async_trait]
pub trait Notifier: Send + Sync + std::fmt::Debug {
    /// 通知を1件送信
    async fn send(&self, recipient: &str, subject: &str, body: &str) -> Result<()>;
}

/// ログ出力のみの通知送信者（デフォルト）
#[derive(Debug, Default)]
pub struct LogNotifier;

impl LogNotifier {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, recipient: &str, subject: &str, _body: &str) -> Result<()> {
        info!(recipient, subject, "notification dispatched");
        Ok(())
    }
}

/// 送信済み通知
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentNotification {
    pub recipient: String,
    pub subject: String,
    pub body: String,
}

/// テスト用のインメモリ通知送信者
///
/// 送信内容を記録する。指定した宛先への送信を失敗させることもできる。
#[derive(Debug, Default)]
pub struct MemoryNotifier {
    sent: Arc<RwLock<Vec<SentNotification>>>,
    failing: Arc<RwLock<HashSet<String>>>,
}

impl MemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// 指定宛先への送信を失敗させる
    pub async fn fail_recipient(&self, recipient: impl Into<String>) {
        self.failing.write().await.insert(recipient.into());
    }

    /// 送信済み通知の一覧
    pub async fn sent(&self) -> Vec<SentNotification> {
        self.sent.read().await.clone()
    }

    /// 指定宛先への送信数
    pub async fn sent_to(&self, recipient: &str) -> usize {
        self.sent
            .read()
            .await
            .iter()
            .filter(|notification| notification.recipient == recipient)
            .count()
    }
}

#[async_trait]
impl Notifier for MemoryNotifier {
    async fn send(&self, recipient: &str, subject: &str, body: &str) -> Result<()> {
        if self.failing.read().await.contains(recipient) {
            return Err(Error::Notify(format!("delivery refused for {}", recipient)));
        }
        self.sent.write().await.push(SentNotification {
            recipient: recipient.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
        });
        Ok(())
    }
}
