//! クレート全体のエラー型
//!
//! バックエンド通信・設定・入力検証のエラーを一つの列挙型にまとめ、
//! 画面側での見せ方（バナー・トースト・インライン・無視）に分類する。

use crate::api::auth::AuthError;

/// クレート共通のエラー型
#[derive(thiserror::Error, Debug)]
pub enum CounselError {
    /// 通信失敗（接続不可・タイムアウトなど）
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// サーバー側のエラー応答（5xx・想定外のステータス）
    #[error("Server responded with HTTP {status}: {message}")]
    Server { status: u16, message: String },

    /// リクエストが受け付けられなかった（401以外の4xx）
    #[error("{message}")]
    Rejected { status: u16, message: String },

    /// エンベロープが `success: false` を返した
    #[error("{message}")]
    Backend { message: String },

    /// JSONの解析失敗
    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// フォーム入力の検証失敗
    #[error("Validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),

    /// 同じ操作が既に送信中
    #[error("Action already in flight: {0}")]
    AlreadyInFlight(String),

    /// 許可されていない状態遷移
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    /// 認証・セッション関連
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// 設定エラー
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// I/Oエラー
    #[error("I/O error: {0}")]
    StdIo(#[from] std::io::Error),

    #[error("{0}")]
    General(#[from] anyhow::Error),
}

pub type CounselResult<T> = Result<T, CounselError>;

/// エラーの画面上での扱い
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presentation {
    /// 再試行ボタン付きの閉じられるバナー
    Banner,
    /// 一時的なトースト通知
    Toast,
    /// フィールド単位のインライン表示
    Inline,
    /// 表示しない
    Silent,
}

impl CounselError {
    pub fn server(status: u16, message: impl Into<String>) -> Self {
        Self::Server {
            status,
            message: message.into(),
        }
    }

    /// 非2xxのステータスを分類する
    ///
    /// 401はセッション切れ、その他の4xxは再試行しても変わらない拒否、
    /// 5xxとそれ以外はサーバーエラー。
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            401 => Self::Auth(AuthError::Unauthorized(message)),
            400..=499 => Self::Rejected { status, message },
            _ => Self::server(status, message),
        }
    }

    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }

    /// 通信・サーバー起因で、再試行に意味があるか
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Server { status: 500..=u16::MAX, .. })
    }

    /// 一覧読み込みの失敗として扱う場合の見せ方
    pub fn presentation(&self) -> Presentation {
        match self {
            Self::Network(_) | Self::Serialization(_) => Presentation::Banner,
            Self::Server { status, .. } if *status >= 500 => Presentation::Banner,
            Self::Validation(_) => Presentation::Inline,
            Self::AlreadyInFlight(_) => Presentation::Silent,
            _ => Presentation::Toast,
        }
    }

    /// フィールドごとのエラーメッセージ（検証エラー以外は空）
    pub fn field_messages(&self) -> Vec<(String, String)> {
        let Self::Validation(errors) = self else {
            return Vec::new();
        };

        let mut messages: Vec<(String, String)> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |err| {
                    let text = err
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| err.code.to_string());
                    (field.to_string(), text)
                })
            })
            .collect();
        messages.sort();
        messages
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_error_is_banner() {
        let error = CounselError::server(503, "unavailable");
        assert!(error.is_transport());
        assert_eq!(error.presentation(), Presentation::Banner);
        assert!(error.to_string().contains("503"));
    }

    #[test]
    fn test_backend_error_is_toast() {
        let error = CounselError::backend("Booking already closed");
        assert!(!error.is_transport());
        assert_eq!(error.presentation(), Presentation::Toast);
        assert_eq!(error.to_string(), "Booking already closed");
    }

    #[test]
    fn test_client_errors_are_not_retryable() {
        for status in [403, 409, 422] {
            let error = CounselError::from_status(status, "Forbidden");
            assert!(matches!(error, CounselError::Rejected { .. }));
            assert!(!error.is_transport());
            assert_eq!(error.presentation(), Presentation::Toast);
        }

        let error = CounselError::from_status(401, "Token expired");
        assert!(matches!(error, CounselError::Auth(AuthError::Unauthorized(_))));
        assert!(!error.is_transport());

        let error = CounselError::from_status(502, "Bad gateway");
        assert!(error.is_transport());
        assert_eq!(error.presentation(), Presentation::Banner);
    }

    #[test]
    fn test_in_flight_is_silent() {
        let error = CounselError::AlreadyInFlight("report".into());
        assert_eq!(error.presentation(), Presentation::Silent);
        assert!(error.field_messages().is_empty());
    }
}
