//! バックエンドAPIの共通型
//!
//! リクエスト・生レスポンス・エンベロープ・ページングと、
//! トランスポート層を差し替えるための `ApiTransport` トレイト。

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::collections::HashMap;

use crate::CounselResult;

/// HTTPメソッド
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    GET,
    POST,
    PUT,
    DELETE,
    PATCH,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::GET => "GET",
            HttpMethod::POST => "POST",
            HttpMethod::PUT => "PUT",
            HttpMethod::DELETE => "DELETE",
            HttpMethod::PATCH => "PATCH",
        }
    }

    /// 再送しても副作用が増えないメソッドか
    pub fn is_idempotent_read(&self) -> bool {
        matches!(self, HttpMethod::GET)
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// APIリクエスト
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiRequest {
    /// リクエストID（追跡用）
    pub id: String,
    /// ベースURLからの相対パス
    pub endpoint: String,
    pub method: HttpMethod,
    /// クエリパラメータ（順序を保持）
    pub query_params: Vec<(String, String)>,
    pub body: Option<serde_json::Value>,
    /// タイムアウト（ミリ秒）。Noneでクライアント既定値
    pub timeout_ms: Option<u64>,
}

impl ApiRequest {
    pub fn new(method: HttpMethod, endpoint: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            endpoint: endpoint.into(),
            method,
            query_params: Vec::new(),
            body: None,
            timeout_ms: None,
        }
    }

    pub fn get(endpoint: impl Into<String>) -> Self {
        Self::new(HttpMethod::GET, endpoint)
    }

    pub fn post(endpoint: impl Into<String>) -> Self {
        Self::new(HttpMethod::POST, endpoint)
    }

    pub fn put(endpoint: impl Into<String>) -> Self {
        Self::new(HttpMethod::PUT, endpoint)
    }

    pub fn delete(endpoint: impl Into<String>) -> Self {
        Self::new(HttpMethod::DELETE, endpoint)
    }

    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query_params.push((key.into(), value.to_string()));
        self
    }

    /// 値がある場合のみクエリに追加
    pub fn query_opt<V: ToString>(self, key: impl Into<String>, value: Option<V>) -> Self {
        match value {
            Some(value) => self.query(key, value),
            None => self,
        }
    }

    pub fn json<B: Serialize>(mut self, body: &B) -> CounselResult<Self> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query_params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// トランスポートから返る生レスポンス
///
/// 2xx 以外のステータスもエラーにせずそのまま返す。分類は呼び出し側の責務。
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    pub status: u16,
    /// 空ボディの場合はNone
    pub body: Option<serde_json::Value>,
    pub elapsed_ms: u64,
}

impl RawResponse {
    pub fn new(status: u16, body: Option<serde_json::Value>) -> Self {
        Self {
            status,
            body,
            elapsed_ms: 0,
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// バックエンドの共通レスポンス形式 `{ success, data, error }`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    #[serde(default)]
    pub success: bool,
    pub data: Option<T>,
    #[serde(default)]
    pub error: Option<String>,
}

impl<T: DeserializeOwned> Envelope<T> {
    pub fn from_value(value: serde_json::Value) -> CounselResult<Self> {
        Ok(serde_json::from_value(value)?)
    }
}

/// リトライ設定（冪等な読み取りにのみ適用）
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetryConfig {
    /// 最大試行回数（1で再試行なし）
    pub max_attempts: u32,
    /// 初期待機時間（ミリ秒）
    pub initial_delay_ms: u64,
    /// 指数バックオフの倍率
    pub backoff_multiplier: f64,
    /// 最大待機時間（ミリ秒）
    pub max_delay_ms: u64,
    /// リトライ対象のステータスコード
    pub retryable_status_codes: Vec<u16>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            initial_delay_ms: 500,
            backoff_multiplier: 2.0,
            max_delay_ms: 5000,
            retryable_status_codes: vec![502, 503, 504],
        }
    }
}

impl RetryConfig {
    pub fn disabled() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// n回目の失敗後の待機時間
    pub fn delay_after(&self, attempt: u32) -> std::time::Duration {
        let factor = self.backoff_multiplier.powi(attempt.saturating_sub(1) as i32);
        let delay = (self.initial_delay_ms as f64 * factor) as u64;
        std::time::Duration::from_millis(delay.min(self.max_delay_ms))
    }
}

/// APIクライアント設定
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiClientConfig {
    /// ベースURL
    pub base_url: String,
    /// デフォルトタイムアウト（ミリ秒）
    pub default_timeout_ms: u64,
    /// デフォルトヘッダー
    pub default_headers: HashMap<String, String>,
    pub retry: RetryConfig,
}

impl Default for ApiClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/api".to_string(),
            default_timeout_ms: 15000,
            default_headers: {
                let mut headers = HashMap::new();
                headers.insert("Accept".to_string(), "application/json".to_string());
                headers.insert(
                    "User-Agent".to_string(),
                    concat!("counsel-admin/", env!("CARGO_PKG_VERSION")).to_string(),
                );
                headers
            },
            retry: RetryConfig::default(),
        }
    }
}

impl ApiClientConfig {
    /// エンドポイントから完全なURLを組み立てる
    pub fn url_for(&self, endpoint: &str) -> String {
        if endpoint.starts_with("http") {
            return endpoint.to_string();
        }
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            endpoint.trim_start_matches('/')
        )
    }
}

/// HTTP層の抽象化
///
/// 本番は `HttpTransport`（reqwest）、テストはメモリ上のダブルが実装する。
#[async_trait]
pub trait ApiTransport: Send + Sync {
    /// リクエストを送信する。通信失敗のみ `Err`、HTTPステータスは `RawResponse` に載る
    async fn execute(&self, request: ApiRequest) -> CounselResult<RawResponse>;
}

/// ページング結果
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PagedResult<T> {
    pub data: Vec<T>,
    /// 現在のページ（1始まり）
    pub page: u32,
    pub size: u32,
    pub total_count: u64,
    pub total_pages: u32,
    pub has_previous: bool,
    pub has_next: bool,
}

impl<T> PagedResult<T> {
    pub fn new(data: Vec<T>, page: u32, size: u32, total_count: u64) -> Self {
        let size = size.max(1);
        let total_pages = total_count.div_ceil(size as u64) as u32;
        Self {
            data,
            page,
            size,
            total_count,
            total_pages,
            has_previous: page > 1,
            has_next: page < total_pages,
        }
    }

    pub fn empty(page: u32, size: u32) -> Self {
        Self::new(Vec::new(), page, size, 0)
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PagedResult<U> {
        PagedResult {
            data: self.data.into_iter().map(f).collect(),
            page: self.page,
            size: self.size,
            total_count: self.total_count,
            total_pages: self.total_pages,
            has_previous: self.has_previous,
            has_next: self.has_next,
        }
    }
}

/// バックエンドのページ形式（フィールド名の揺れを吸収）
#[derive(Debug, Clone, Deserialize)]
pub struct RawPage<T> {
    #[serde(alias = "items", alias = "content", alias = "records", default = "Vec::new")]
    pub list: Vec<T>,
    #[serde(alias = "totalElements", alias = "totalCount", alias = "total_count", default)]
    pub total: Option<u64>,
}

impl<T> RawPage<T> {
    pub fn into_paged(self, page: u32, size: u32) -> PagedResult<T> {
        let total = self.total.unwrap_or(self.list.len() as u64);
        PagedResult::new(self.list, page, size, total)
    }
}
