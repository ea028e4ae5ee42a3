//! 認証セッションモジュール
//!
//! 認可の判定はバックエンドが行う。ここではトークンの保持・永続化と、
//! ダッシュボードの出し分けに使うペイロードの読み出しだけを扱う。
//!
//! ## 機能
//!
//! - セッションストア（トークンの取得・設定・破棄）
//! - セッションファイルの保存・読み込み
//! - JWTペイロードのデコード（署名検証なし）

mod session_store;
mod token;

pub use session_store::{PersistedSession, SessionStorage, SessionStore};
pub use token::{decode_claims, DashboardSection, Role, TokenClaims};

/// 認証関連のエラー型
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// トークンの形式が不正
    #[error("Malformed token: {0}")]
    MalformedToken(String),

    /// トークン期限切れ
    #[error("Session expired")]
    Expired,

    /// 未ログイン
    #[error("Not signed in")]
    NotSignedIn,

    /// サーバーがトークンを受け付けなかった（401）
    #[error("Session rejected by server: {0}")]
    Unauthorized(String),

    /// このロールでは使えない画面
    #[error("Role {role} cannot access {section}")]
    Forbidden { role: String, section: String },

    /// セッション保存エラー
    #[error("Failed to save session: {0}")]
    SaveError(String),

    /// セッション読み込みエラー
    #[error("Failed to load session: {0}")]
    LoadError(String),

    /// I/Oエラー
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML解析エラー
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// TOMLシリアライズエラー
    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

pub type AuthResult<T> = Result<T, AuthError>;
