//! 環境変数からの AWS 認証情報の解決
//!
//! 各項目は camelCase 名 → 大文字名の順に参照する。空文字列は未設定扱い。
//!
//! | 項目 | 変数 |
//! |------|------|
//! | アクセスキー | `awsAccessKeyId`, `AWS_ACCESS_KEY_ID` |
//! | シークレットキー | `awsSecretAccessKey`, `AWS_SECRET_ACCESS_KEY` |
//! | リージョン | `awsRegion`, `AWS_REGION` |

use crate::error::{ConfigError, Result};
use std::fmt;

const ACCESS_KEY_VARS: [&str; 2] = ["awsAccessKeyId", "AWS_ACCESS_KEY_ID"];
const SECRET_KEY_VARS: [&str; 2] = ["awsSecretAccessKey", "AWS_SECRET_ACCESS_KEY"];
const REGION_VARS: [&str; 2] = ["awsRegion", "AWS_REGION"];

/// 明示的な認証情報が揃わなかったときの振る舞い
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CredentialMode {
    /// 不足していればエラー
    Strict,
    /// IAM ロール等の自動解決にフォールバック
    #[default]
    Permissive,
}

impl CredentialMode {
    pub fn from_strict_flag(strict: bool) -> Self {
        if strict { Self::Strict } else { Self::Permissive }
    }
}

/// 解決済みの認証情報
#[derive(Clone, PartialEq, Eq)]
pub enum ResolvedCredentials {
    /// 3 項目すべてが環境変数から得られた
    Explicit {
        access_key_id: String,
        secret_access_key: String,
        region: String,
    },
    /// SDK 標準のプロバイダチェーンに任せる
    Ambient {
        /// 単独で見つかったリージョンはそのまま使う
        region: Option<String>,
        reason: String,
    },
}

impl ResolvedCredentials {
    pub fn region(&self) -> Option<&str> {
        match self {
            Self::Explicit { region, .. } => Some(region),
            Self::Ambient { region, .. } => region.as_deref(),
        }
    }

    /// フォールバックした理由（明示的な場合は None）
    pub fn fallback_reason(&self) -> Option<&str> {
        match self {
            Self::Explicit { .. } => None,
            Self::Ambient { reason, .. } => Some(reason),
        }
    }
}

impl fmt::Debug for ResolvedCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Explicit {
                access_key_id,
                region,
                ..
            } => f
                .debug_struct("Explicit")
                .field("access_key_id", access_key_id)
                .field("secret_access_key", &"***")
                .field("region", region)
                .finish(),
            Self::Ambient { region, reason } => f
                .debug_struct("Ambient")
                .field("region", region)
                .field("reason", reason)
                .finish(),
        }
    }
}

/// プロセスの環境変数から解決
pub fn resolve_credentials(mode: CredentialMode) -> Result<ResolvedCredentials> {
    resolve_credentials_with(mode, |name| std::env::var(name).ok())
}

/// 任意の参照関数から解決
pub fn resolve_credentials_with<F>(mode: CredentialMode, lookup: F) -> Result<ResolvedCredentials>
where
    F: Fn(&str) -> Option<String>,
{
    let first = |names: &[&str]| {
        names
            .iter()
            .filter_map(|name| lookup(name))
            .find(|value| !value.is_empty())
    };

    let access_key_id = first(&ACCESS_KEY_VARS);
    let secret_access_key = first(&SECRET_KEY_VARS);
    let region = first(&REGION_VARS);

    if let (Some(access_key_id), Some(secret_access_key), Some(region)) =
        (&access_key_id, &secret_access_key, &region)
    {
        tracing::debug!("Using explicit credentials for region {}", region);
        return Ok(ResolvedCredentials::Explicit {
            access_key_id: access_key_id.clone(),
            secret_access_key: secret_access_key.clone(),
            region: region.clone(),
        });
    }

    let missing: Vec<String> = [
        (access_key_id.is_none(), ACCESS_KEY_VARS),
        (secret_access_key.is_none(), SECRET_KEY_VARS),
        (region.is_none(), REGION_VARS),
    ]
    .into_iter()
    .filter(|(absent, _)| *absent)
    .map(|(_, names)| names.join("/"))
    .collect();

    match mode {
        CredentialMode::Strict => Err(ConfigError::MissingCredentials { missing }),
        CredentialMode::Permissive => {
            tracing::debug!("Explicit credentials incomplete: missing {:?}", missing);
            Ok(ResolvedCredentials::Ambient {
                region,
                reason: format!("Missing {}", missing.join(", ")),
            })
        }
    }
}
