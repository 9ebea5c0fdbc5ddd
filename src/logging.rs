//! Logging
//!
//! tracingベースのログ初期化。コンソール出力と日次ローテーションの
//! ファイル出力を設定から切り替える。

use std::fs;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LogSettings;
use crate::error::Result;

/// ログシステムを初期化
///
/// ファイル出力が有効な場合は書き込みワーカーのguardを返す。
/// guardがdropされるとバッファがflushされるため、プロセス終了まで
/// 保持すること。
pub fn init_logging(settings: &LogSettings) -> Result<Option<WorkerGuard>> {
    // EnvFilterを作成
    let env_filter =
        EnvFilter::try_new(&settings.level).unwrap_or_else(|_| EnvFilter::new("info"));

    let mut guard = None;

    match (settings.console_enabled, settings.file_enabled) {
        (true, true) => {
            ensure_log_dir(&settings.log_dir)?;
            let file_appender = rolling::daily(&settings.log_dir, "gdpr-rs.log");
            let (writer, worker_guard) = non_blocking(file_appender);
            guard = Some(worker_guard);

            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer())
                .with(fmt::layer().with_ansi(false).with_writer(writer))
                .init();
        }
        (true, false) => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer())
                .init();
        }
        (false, true) => {
            ensure_log_dir(&settings.log_dir)?;
            let file_appender = rolling::daily(&settings.log_dir, "gdpr-rs.log");
            let (writer, worker_guard) = non_blocking(file_appender);
            guard = Some(worker_guard);

            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().with_ansi(false).with_writer(writer))
                .init();
        }
        (false, false) => {
            // 最低限のコンソール出力
            tracing_subscriber::registry()
                .with(EnvFilter::new("warn"))
                .with(fmt::layer())
                .init();
        }
    }

    tracing::info!("📝 ログシステム初期化完了");
    tracing::info!("📊 ログレベル: {}", settings.level);

    Ok(guard)
}

fn ensure_log_dir(dir: &Path) -> Result<()> {
    if !dir.exists() {
        fs::create_dir_all(dir)?;
    }
    Ok(())
}
