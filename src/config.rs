//! Configuration
//!
//! 設定ファイルと環境変数から読み込むクレート設定

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// コンプライアンスエンジン設定
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ComplianceConfig {
    /// 終端ステータスのリクエストを保持する日数
    pub retention_days: i64,
    /// 同意のデフォルト有効日数
    pub consent_ttl_days: i64,
    /// 期限切れ通知を送る先行日数
    pub expiry_notice_days: i64,
    /// 同意ガードの対象外パスプレフィックス
    pub exempt_paths: Vec<String>,
    /// 通知本文に載せるサイトURL
    pub site_url: String,
    /// ログ設定
    pub log: LogSettings,
}

/// ログ設定
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LogSettings {
    /// ログレベル (trace, debug, info, warn, error)
    pub level: String,
    /// コンソール出力有効
    pub console_enabled: bool,
    /// ファイル出力有効
    pub file_enabled: bool,
    /// ログディレクトリ
    pub log_dir: PathBuf,
}

impl Default for ComplianceConfig {
    fn default() -> Self {
        Self {
            retention_days: 365,
            consent_ttl_days: 365,
            expiry_notice_days: 30,
            exempt_paths: vec![
                "/admin/".to_string(),
                "/consent/".to_string(),
                "/privacy-policy/".to_string(),
                "/static/".to_string(),
                "/media/".to_string(),
            ],
            site_url: "http://localhost:8000".to_string(),
            log: LogSettings {
                level: "info".to_string(),
                console_enabled: true,
                file_enabled: false,
                log_dir: PathBuf::from("logs"),
            },
        }
    }
}

impl ComplianceConfig {
    /// 設定ファイルから読み込み、環境変数で上書き
    ///
    /// 明示パスが無い場合は既定の場所を順に試す。環境変数は
    /// `GDPR_` プレフィックス（ネストは `__` 区切り）。
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        let mut settings = config::Config::builder();

        // デフォルト値を設定
        let defaults = ComplianceConfig::default();
        settings = settings.add_source(
            config::Config::try_from(&defaults).map_err(|e| Error::Config(e.to_string()))?,
        );

        // 設定ファイルを読み込み（複数の場所を試行）
        if let Some(path) = explicit_path {
            if !path.exists() {
                return Err(Error::Config(format!(
                    "config file not found: {}",
                    path.display()
                )));
            }
            settings = settings.add_source(config::File::from(path));
        } else {
            let config_paths = ["gdpr-config.toml", "config.toml", "config/gdpr.toml"];
            for path in &config_paths {
                if Path::new(path).exists() {
                    println!("📁 設定ファイルを読み込み: {}", path);
                    settings = settings.add_source(config::File::with_name(path));
                    break;
                }
            }
        }

        // 環境変数で上書き (GDPR_で始まる変数)
        settings = settings.add_source(
            config::Environment::with_prefix("GDPR")
                .separator("__")
                .try_parsing(true),
        );

        settings
            .build()
            .map_err(|e| Error::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| Error::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ComplianceConfig::default();
        assert_eq!(config.retention_days, 365);
        assert_eq!(config.expiry_notice_days, 30);
        assert!(config.exempt_paths.iter().any(|p| p == "/admin/"));
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let result = ComplianceConfig::load(Some(Path::new("/nonexistent/gdpr.toml")));
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
