//! 結合テスト用のメモリ上トランスポート
//!
//! メソッド・パス（と任意のクエリ条件）ごとに応答を台本として登録する。
//! ゲート付きの経路は、テスト側が開けるまで応答を保留する。

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::Notify;

use counsel_admin::api::{ApiRequest, ApiTransport, BackendApi, HttpMethod, RawResponse};
use counsel_admin::{CounselError, CounselResult};

/// 保留中の応答を開ける鍵
#[derive(Clone, Default)]
pub struct Gate {
    arrived: Arc<Notify>,
    release: Arc<Notify>,
}

impl Gate {
    pub fn new() -> Self {
        Self::default()
    }

    /// リクエストが届くまで待つ
    pub async fn arrived(&self) {
        self.arrived.notified().await;
    }

    pub fn open(&self) {
        self.release.notify_one();
    }
}

#[derive(Clone)]
enum Reply {
    Respond(RawResponse),
    Fail(String),
}

struct Route {
    method: HttpMethod,
    endpoint: String,
    query: Vec<(String, String)>,
    body: Vec<(String, Value)>,
    reply: Reply,
    gate: Option<Gate>,
}

impl Route {
    fn matches(&self, request: &ApiRequest) -> bool {
        self.method == request.method
            && self.endpoint == request.endpoint
            && self
                .query
                .iter()
                .all(|(k, v)| request.query_value(k) == Some(v.as_str()))
            && self.body.iter().all(|(k, v)| {
                request.body.as_ref().and_then(|body| body.get(k)) == Some(v)
            })
    }
}

#[derive(Default)]
pub struct MockTransport {
    routes: Mutex<Vec<Route>>,
    requests: Mutex<Vec<ApiRequest>>,
}

pub struct RouteBuilder<'a> {
    transport: &'a MockTransport,
    method: HttpMethod,
    endpoint: String,
    query: Vec<(String, String)>,
    body: Vec<(String, Value)>,
    gate: Option<Gate>,
}

impl<'a> RouteBuilder<'a> {
    /// JSONボディのフィールドで絞り込む
    pub fn with_body(mut self, key: &str, value: Value) -> Self {
        self.body.push((key.to_string(), value));
        self
    }

    pub fn with_query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    pub fn gated(mut self, gate: &Gate) -> Self {
        self.gate = Some(gate.clone());
        self
    }

    fn finish(self, reply: Reply) {
        self.transport.routes.lock().push(Route {
            method: self.method,
            endpoint: self.endpoint,
            query: self.query,
            body: self.body,
            reply,
            gate: self.gate,
        });
    }

    /// 任意のステータス・ボディ
    pub fn respond(self, status: u16, body: Option<Value>) {
        self.finish(Reply::Respond(RawResponse::new(status, body)));
    }

    /// `{success: true, data}` を返す
    pub fn ok(self, data: Value) {
        self.respond(200, Some(json!({"success": true, "data": data})));
    }

    pub fn status(self, status: u16) {
        self.respond(status, None);
    }

    /// `{success: false, error}` を返す
    pub fn backend_error(self, message: &str) {
        self.respond(200, Some(json!({"success": false, "error": message})));
    }

    /// トランスポート自体の失敗
    pub fn fail(self, message: &str) {
        self.finish(Reply::Fail(message.to_string()));
    }
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn on(&self, method: HttpMethod, endpoint: impl Into<String>) -> RouteBuilder<'_> {
        RouteBuilder {
            transport: self,
            method,
            endpoint: endpoint.into(),
            query: Vec::new(),
            body: Vec::new(),
            gate: None,
        }
    }

    pub fn on_get(&self, endpoint: impl Into<String>) -> RouteBuilder<'_> {
        self.on(HttpMethod::GET, endpoint)
    }

    pub fn on_put(&self, endpoint: impl Into<String>) -> RouteBuilder<'_> {
        self.on(HttpMethod::PUT, endpoint)
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().clone()
    }

    pub fn count(&self, method: HttpMethod, endpoint: &str) -> usize {
        self.requests
            .lock()
            .iter()
            .filter(|r| r.method == method && r.endpoint == endpoint)
            .count()
    }
}

#[async_trait]
impl ApiTransport for MockTransport {
    async fn execute(&self, request: ApiRequest) -> CounselResult<RawResponse> {
        self.requests.lock().push(request.clone());

        // 後から登録した経路を優先
        let found = {
            let routes = self.routes.lock();
            routes
                .iter()
                .rev()
                .find(|route| route.matches(&request))
                .map(|route| (route.reply.clone(), route.gate.clone()))
        };

        let Some((reply, gate)) = found else {
            return Ok(RawResponse::new(404, None));
        };

        if let Some(gate) = gate {
            gate.arrived.notify_one();
            gate.release.notified().await;
        }

        match reply {
            Reply::Respond(response) => Ok(response),
            Reply::Fail(message) => Err(CounselError::General(anyhow::anyhow!(message))),
        }
    }
}

pub fn backend(transport: &Arc<MockTransport>) -> BackendApi {
    BackendApi::new(transport.clone())
}
