//! エンベロープ解釈とステータス分類
//!
//! トランスポートの生レスポンスを、
//! 「データあり」「データなし」「エラー」の三つに振り分ける。

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::api::generic::{ApiRequest, ApiTransport, Envelope, RawResponse};
use crate::{CounselError, CounselResult};

/// 「データなし」と見なすステータスの方針
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct NoDataPolicy {
    /// 400をデータなしとして扱うか（falseならエラー）
    pub bad_request_is_no_data: bool,
}

impl Default for NoDataPolicy {
    fn default() -> Self {
        Self {
            bad_request_is_no_data: true,
        }
    }
}

impl NoDataPolicy {
    pub fn is_no_data(&self, status: u16) -> bool {
        match status {
            204 | 404 => true,
            400 => self.bad_request_is_no_data,
            _ => false,
        }
    }
}

/// 「無いこともある」参照の結果
#[derive(Debug, Clone, PartialEq)]
pub enum LookupOutcome<T> {
    Found(T),
    NoData,
}

impl<T> LookupOutcome<T> {
    pub fn into_option(self) -> Option<T> {
        match self {
            LookupOutcome::Found(value) => Some(value),
            LookupOutcome::NoData => None,
        }
    }

    pub fn is_no_data(&self) -> bool {
        matches!(self, LookupOutcome::NoData)
    }
}

/// 型付きバックエンドクライアント
#[derive(Clone)]
pub struct BackendApi {
    transport: Arc<dyn ApiTransport>,
    policy: NoDataPolicy,
}

impl BackendApi {
    pub fn new(transport: Arc<dyn ApiTransport>) -> Self {
        Self {
            transport,
            policy: NoDataPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: NoDataPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> NoDataPolicy {
        self.policy
    }

    /// データが必ずある前提の取得（一覧など）
    pub async fn fetch<T: DeserializeOwned>(&self, request: ApiRequest) -> CounselResult<T> {
        let endpoint = request.endpoint.clone();
        let response = self.transport.execute(request).await?;
        ensure_success(&response)?;

        let envelope = decode_envelope::<T>(response.body)?;
        envelope.data.ok_or_else(|| {
            tracing::warn!(endpoint = %endpoint, "⚠️ Envelope succeeded without data");
            CounselError::backend(format!("{} returned no data", endpoint))
        })
    }

    /// データが無いこともある参照
    pub async fn lookup<T: DeserializeOwned>(
        &self,
        request: ApiRequest,
    ) -> CounselResult<LookupOutcome<T>> {
        let endpoint = request.endpoint.clone();
        let response = self.transport.execute(request).await?;

        if self.policy.is_no_data(response.status) {
            if response.status == 400 {
                tracing::warn!(
                    endpoint = %endpoint,
                    "⚠️ HTTP 400 treated as no data"
                );
            } else {
                tracing::debug!(endpoint = %endpoint, status = response.status, "📭 No data");
            }
            return Ok(LookupOutcome::NoData);
        }
        ensure_success(&response)?;

        let Some(body) = response.body else {
            return Ok(LookupOutcome::NoData);
        };
        let envelope = Envelope::<serde_json::Value>::from_value(body)?;
        if !envelope.success {
            return Err(backend_error(envelope.error));
        }

        match envelope.data {
            None | Some(serde_json::Value::Null) => Ok(LookupOutcome::NoData),
            Some(serde_json::Value::Array(items)) if items.is_empty() => {
                Ok(LookupOutcome::NoData)
            }
            Some(data) => Ok(LookupOutcome::Found(serde_json::from_value(data)?)),
        }
    }

    /// 結果のデータを使わない更新系
    pub async fn dispatch(&self, request: ApiRequest) -> CounselResult<()> {
        let response = self.transport.execute(request).await?;
        ensure_success(&response)?;

        if let Some(body) = response.body {
            let envelope = Envelope::<serde_json::Value>::from_value(body)?;
            if !envelope.success {
                return Err(backend_error(envelope.error));
            }
        }
        Ok(())
    }
}

fn ensure_success(response: &RawResponse) -> CounselResult<()> {
    if response.is_success() {
        return Ok(());
    }

    // エラー応答にもエンベロープが載っていればそのメッセージを使う
    let message = response
        .body
        .as_ref()
        .and_then(|body| body.get("error"))
        .and_then(|error| error.as_str())
        .map(str::to_string)
        .unwrap_or_else(|| format!("HTTP {}", response.status));

    Err(CounselError::from_status(response.status, message))
}

fn decode_envelope<T: DeserializeOwned>(
    body: Option<serde_json::Value>,
) -> CounselResult<Envelope<T>> {
    let body = body.ok_or_else(|| CounselError::backend("Empty response body"))?;
    let envelope = Envelope::<T>::from_value(body)?;
    if !envelope.success {
        return Err(backend_error(envelope.error));
    }
    Ok(envelope)
}

fn backend_error(error: Option<String>) -> CounselError {
    CounselError::backend(error.unwrap_or_else(|| "Request was not successful".to_string()))
}
