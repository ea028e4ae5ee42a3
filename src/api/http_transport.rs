//! reqwestによるトランスポート実装
//!
//! - 全リクエストにBearerトークンを付与（リクエストインターセプタ相当）
//! - 冪等な読み取りのみリトライ
//! - エンドポイント別のメトリクス記録

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use crate::api::auth::SessionStore;
use crate::api::generic::*;
use crate::{CounselError, CounselResult};

/// エンドポイント統計
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EndpointStats {
    pub request_count: u64,
    pub success_count: u64,
    pub error_count: u64,
    pub average_response_time_ms: f64,
    pub max_response_time_ms: u64,
}

/// メトリクスのスナップショット
#[derive(Debug, Clone)]
pub struct ApiMetricsSnapshot {
    pub endpoint_stats: HashMap<String, EndpointStats>,
    pub total_requests: u64,
    pub total_errors: u64,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Default)]
struct ApiMetrics {
    endpoint_stats: HashMap<String, EndpointStats>,
    total_requests: u64,
    total_errors: u64,
}

impl ApiMetrics {
    fn record(&mut self, key: &str, status: Option<u16>, duration_ms: u64) {
        let stats = self.endpoint_stats.entry(key.to_string()).or_default();
        stats.request_count += 1;

        let ok = status.is_some_and(|s| (200..300).contains(&s));
        if ok {
            stats.success_count += 1;
        } else {
            stats.error_count += 1;
            self.total_errors += 1;
        }

        let count = stats.request_count as f64;
        stats.average_response_time_ms =
            (stats.average_response_time_ms * (count - 1.0) + duration_ms as f64) / count;
        stats.max_response_time_ms = stats.max_response_time_ms.max(duration_ms);

        self.total_requests += 1;
    }
}

/// 本番用HTTPトランスポート
pub struct HttpTransport {
    config: ApiClientConfig,
    http_client: reqwest::Client,
    session: SessionStore,
    metrics: Arc<RwLock<ApiMetrics>>,
}

impl HttpTransport {
    pub fn new(config: ApiClientConfig, session: SessionStore) -> CounselResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_millis(config.default_timeout_ms))
            .build()?;

        Ok(Self {
            config,
            http_client,
            session,
            metrics: Arc::new(RwLock::new(ApiMetrics::default())),
        })
    }

    pub fn config(&self) -> &ApiClientConfig {
        &self.config
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    fn build(&self, request: &ApiRequest) -> reqwest::RequestBuilder {
        let url = self.config.url_for(&request.endpoint);
        let method = match request.method {
            HttpMethod::GET => reqwest::Method::GET,
            HttpMethod::POST => reqwest::Method::POST,
            HttpMethod::PUT => reqwest::Method::PUT,
            HttpMethod::DELETE => reqwest::Method::DELETE,
            HttpMethod::PATCH => reqwest::Method::PATCH,
        };

        let mut builder = self.http_client.request(method, &url);

        for (key, value) in &self.config.default_headers {
            builder = builder.header(key, value);
        }

        if let Some(token) = self.session.token() {
            builder = builder.bearer_auth(token);
        }

        if !request.query_params.is_empty() {
            builder = builder.query(&request.query_params);
        }

        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        if let Some(timeout_ms) = request.timeout_ms {
            builder = builder.timeout(std::time::Duration::from_millis(timeout_ms));
        }

        builder
    }

    /// 冪等な読み取りはリトライ設定に従って再送する
    async fn send_with_retry(&self, request: &ApiRequest) -> CounselResult<reqwest::Response> {
        let retry = if request.method.is_idempotent_read() {
            self.config.retry.clone()
        } else {
            RetryConfig::disabled()
        };
        let max_attempts = retry.max_attempts.max(1);
        let mut attempts = 0;

        loop {
            attempts += 1;
            crate::utils::log_api_request(request.method.as_str(), &request.endpoint, attempts);

            match self.build(request).send().await {
                Ok(response) => {
                    let status = response.status().as_u16();
                    if response.status().is_success()
                        || !retry.retryable_status_codes.contains(&status)
                        || attempts >= max_attempts
                    {
                        return Ok(response);
                    }
                    tracing::warn!(
                        endpoint = %request.endpoint,
                        status,
                        attempt = attempts,
                        "🔁 Retrying after retryable status"
                    );
                }
                Err(e) => {
                    if attempts >= max_attempts {
                        return Err(CounselError::Network(e));
                    }
                    tracing::warn!(
                        endpoint = %request.endpoint,
                        attempt = attempts,
                        "🔁 Retrying after network error: {}",
                        e
                    );
                }
            }

            tokio::time::sleep(retry.delay_after(attempts)).await;
        }
    }

    pub fn metrics(&self) -> ApiMetricsSnapshot {
        let metrics = self.metrics.read();
        ApiMetricsSnapshot {
            endpoint_stats: metrics.endpoint_stats.clone(),
            total_requests: metrics.total_requests,
            total_errors: metrics.total_errors,
            timestamp: chrono::Utc::now(),
        }
    }
}

#[async_trait]
impl ApiTransport for HttpTransport {
    async fn execute(&self, request: ApiRequest) -> CounselResult<RawResponse> {
        let started = Instant::now();
        let metrics_key = format!("{} {}", request.method, request.endpoint);

        let response = match self.send_with_retry(&request).await {
            Ok(response) => response,
            Err(e) => {
                let elapsed = started.elapsed().as_millis() as u64;
                self.metrics.write().record(&metrics_key, None, elapsed);
                tracing::error!(
                    request_id = %request.id,
                    endpoint = %request.endpoint,
                    "❌ HTTP request failed: {}",
                    e
                );
                return Err(e);
            }
        };

        let status = response.status().as_u16();
        let text = response.text().await?;
        let elapsed_ms = started.elapsed().as_millis() as u64;
        self.metrics
            .write()
            .record(&metrics_key, Some(status), elapsed_ms);

        let body = if text.trim().is_empty() {
            None
        } else {
            match serde_json::from_str(&text) {
                Ok(value) => Some(value),
                Err(e) if (200..300).contains(&status) => {
                    tracing::error!("❌ Failed to parse JSON response: {}", e);
                    tracing::debug!(
                        request_id = %request.id,
                        "🔍 Response text preview: {}",
                        crate::utils::preview(&text, 200)
                    );
                    return Err(e.into());
                }
                // エラー応答のボディはHTMLなどの場合がある
                Err(_) => Some(serde_json::Value::String(text)),
            }
        };

        crate::utils::log_api_response(request.method.as_str(), &request.endpoint, status, elapsed_ms);

        Ok(RawResponse {
            status,
            body,
            elapsed_ms,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_creation() {
        let transport =
            HttpTransport::new(ApiClientConfig::default(), SessionStore::in_memory()).unwrap();
        assert_eq!(transport.config().default_timeout_ms, 15000);
        assert!(transport.session().token().is_none());
    }

    #[test]
    fn test_metrics_recording() {
        let mut metrics = ApiMetrics::default();
        metrics.record("GET /booking/list", Some(200), 100);
        metrics.record("GET /booking/list", Some(500), 300);
        metrics.record("GET /course/list", None, 50);

        let stats = &metrics.endpoint_stats["GET /booking/list"];
        assert_eq!(stats.request_count, 2);
        assert_eq!(stats.success_count, 1);
        assert_eq!(stats.error_count, 1);
        assert_eq!(stats.average_response_time_ms, 200.0);
        assert_eq!(stats.max_response_time_ms, 300);
        assert_eq!(metrics.total_requests, 3);
        assert_eq!(metrics.total_errors, 2);
    }

    #[test]
    fn test_bearer_token_is_attached() {
        let session = SessionStore::in_memory();
        let transport = HttpTransport::new(ApiClientConfig::default(), session.clone()).unwrap();

        let request = ApiRequest::get("/booking/list").query("page", 1);
        let anonymous = transport.build(&request).build().unwrap();
        assert!(anonymous.headers().get(reqwest::header::AUTHORIZATION).is_none());

        session.set_token("header.payload.signature").unwrap();
        let signed = transport.build(&request).build().unwrap();
        assert_eq!(
            signed.headers()[reqwest::header::AUTHORIZATION],
            "Bearer header.payload.signature"
        );
        assert_eq!(signed.url().query(), Some("page=1"));
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_network_error() {
        let config = ApiClientConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            default_timeout_ms: 2000,
            retry: RetryConfig::disabled(),
            ..ApiClientConfig::default()
        };
        let transport = HttpTransport::new(config, SessionStore::in_memory()).unwrap();

        let result = transport.execute(ApiRequest::get("/booking/list")).await;
        assert!(matches!(result, Err(CounselError::Network(_))));
        assert_eq!(transport.metrics().total_errors, 1);
    }
}
