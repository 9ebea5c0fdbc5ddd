//! Shared Types
//!
//! データ主体のアイデンティティと関連する共通型

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};

/// データ主体のアイデンティティ
///
/// 認証済みユーザーIDまたは匿名セッションキーのいずれか一方を必ず持つ。
/// 同意記録の所有者はアイデンティティ間で移動しない。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Identity {
    /// 認証済みユーザー
    AuthenticatedUser(Uuid),
    /// 匿名セッション
    AnonymousSession(String),
}

impl Identity {
    /// ユーザーIDとセッションキーからアイデンティティを解決
    ///
    /// 認証済みユーザーIDを優先する。どちらも無い場合はエラー。
    pub fn resolve(user_id: Option<Uuid>, session_key: Option<&str>) -> Result<Self> {
        match (user_id, session_key) {
            (Some(id), _) => Ok(Identity::AuthenticatedUser(id)),
            (None, Some(key)) if !key.is_empty() => {
                Ok(Identity::AnonymousSession(key.to_string()))
            }
            _ => Err(Error::Validation(
                "identity requires a user id or a session key".to_string(),
            )),
        }
    }

    /// ストレージキー用の正規化表現
    pub fn key(&self) -> String {
        match self {
            Identity::AuthenticatedUser(id) => format!("user:{}", id),
            Identity::AnonymousSession(key) => format!("session:{}", key),
        }
    }

    /// 認証済みユーザーのID（匿名セッションはNone）
    pub fn user_id(&self) -> Option<Uuid> {
        match self {
            Identity::AuthenticatedUser(id) => Some(*id),
            Identity::AnonymousSession(_) => None,
        }
    }
}

impl std::fmt::Display for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.key())
    }
}

/// ユーザープロファイル
///
/// 永続化コラボレーターが所有する最小限のユーザー情報。
/// データエクスポートと期限切れ通知で参照する。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    /// ユーザーID
    pub id: Uuid,
    /// ユーザー名
    pub username: String,
    /// メールアドレス
    pub email: String,
    /// フルネーム
    pub full_name: String,
    /// 登録日時
    pub date_joined: DateTime<Utc>,
    /// 最終ログイン日時
    pub last_login: Option<DateTime<Utc>>,
}

impl UserProfile {
    /// 通知の宛名に使う表示名
    pub fn display_name(&self) -> &str {
        if self.full_name.is_empty() {
            &self.username
        } else {
            &self.full_name
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_resolution_prefers_user() {
        let user = Uuid::new_v4();
        let identity = Identity::resolve(Some(user), Some("abc")).unwrap();
        assert_eq!(identity, Identity::AuthenticatedUser(user));
    }

    #[test]
    fn test_identity_resolution_falls_back_to_session() {
        let identity = Identity::resolve(None, Some("abc")).unwrap();
        assert_eq!(identity, Identity::AnonymousSession("abc".to_string()));
    }

    #[test]
    fn test_identity_resolution_rejects_empty() {
        assert!(Identity::resolve(None, None).is_err());
        assert!(Identity::resolve(None, Some("")).is_err());
    }
}
