//! セッションストア
//!
//! プロセス全体で共有する認証状態。起動時に保存ファイルから復元し、
//! ログアウトで明示的に破棄する。

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use super::token::{decode_claims, TokenClaims};
use super::{AuthError, AuthResult};

/// 保存されるセッション
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PersistedSession {
    pub token: String,
    /// 保存日時
    #[serde(default = "Utc::now")]
    pub saved_at: DateTime<Utc>,
}

/// セッションファイルの構造
#[derive(Debug, Serialize, Deserialize)]
struct SessionFile {
    session: PersistedSession,
}

/// セッションファイル管理
#[derive(Debug, Clone)]
pub struct SessionStorage {
    /// 保存先のパス
    path: PathBuf,
}

impl SessionStorage {
    /// # Arguments
    ///
    /// * `config_dir` - 設定ディレクトリのパス（例: ~/.config/counsel-admin）
    pub fn new(config_dir: PathBuf) -> Self {
        Self {
            path: config_dir.join("session.toml"),
        }
    }

    /// デフォルトの設定ディレクトリを使う
    pub fn with_default_dir() -> AuthResult<Self> {
        let config_dir = directories::ProjectDirs::from("dev", "counsel", "counsel-admin")
            .map(|dirs| dirs.config_dir().to_path_buf())
            .ok_or_else(|| AuthError::LoadError("Failed to determine config directory".into()))?;

        Ok(Self::new(config_dir))
    }

    pub fn save(&self, session: &PersistedSession) -> AuthResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = SessionFile {
            session: session.clone(),
        };
        fs::write(&self.path, toml::to_string_pretty(&file)?)?;
        Ok(())
    }

    /// 保存がなければ `Ok(None)`
    pub fn load(&self) -> AuthResult<Option<PersistedSession>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&self.path)?;
        let file: SessionFile = toml::from_str(&content)?;
        if file.session.token.trim().is_empty() {
            return Err(AuthError::LoadError("Stored token is empty".into()));
        }
        Ok(Some(file.session))
    }

    pub fn delete(&self) -> AuthResult<()> {
        if self.path.exists() {
            fs::remove_file(&self.path)?;
        }
        Ok(())
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

/// 共有セッションストア
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    token: Arc<RwLock<Option<String>>>,
    storage: Option<SessionStorage>,
}

impl SessionStore {
    /// 永続化しないストア
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// 保存ファイルから復元する。読めないファイルは破棄して未ログインから始める
    pub fn hydrate(storage: SessionStorage) -> Self {
        let token = match storage.load() {
            Ok(session) => session.map(|s| s.token),
            Err(e) => {
                tracing::warn!("⚠️ Discarding unreadable session file: {}", e);
                let _ = storage.delete();
                None
            }
        };

        if token.is_some() {
            tracing::info!("🔑 Session restored from {}", storage.path().display());
        }

        Self {
            token: Arc::new(RwLock::new(token)),
            storage: Some(storage),
        }
    }

    pub fn token(&self) -> Option<String> {
        self.token.read().clone()
    }

    pub fn is_signed_in(&self) -> bool {
        self.token.read().is_some()
    }

    pub fn set_token(&self, token: impl Into<String>) -> AuthResult<()> {
        let token = token.into();
        if let Some(storage) = &self.storage {
            storage.save(&PersistedSession {
                token: token.clone(),
                saved_at: Utc::now(),
            })?;
        }
        *self.token.write() = Some(token);
        Ok(())
    }

    /// ログアウト
    pub fn clear(&self) -> AuthResult<()> {
        *self.token.write() = None;
        if let Some(storage) = &self.storage {
            storage.delete()?;
        }
        tracing::info!("🚪 Session cleared");
        Ok(())
    }

    /// 現在のトークンを読み出す。期限切れは `Expired`
    pub fn claims_at(&self, now: DateTime<Utc>) -> AuthResult<TokenClaims> {
        let token = self.token().ok_or(AuthError::NotSignedIn)?;
        let claims = decode_claims(&token)?;
        if claims.is_expired_at(now) {
            return Err(AuthError::Expired);
        }
        Ok(claims)
    }

    pub fn claims(&self) -> AuthResult<TokenClaims> {
        self.claims_at(Utc::now())
    }
}
