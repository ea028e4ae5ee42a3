pub mod auth; // セッション・トークン
pub mod backend; // エンベロープ解釈
pub mod endpoints;
pub mod generic; // 共通型とトランスポートトレイト
pub mod http_transport; // reqwest実装

pub use backend::{BackendApi, LookupOutcome, NoDataPolicy};
pub use generic::{
    ApiClientConfig, ApiRequest, ApiTransport, Envelope, HttpMethod, PagedResult, RawResponse,
    RetryConfig,
};
pub use http_transport::HttpTransport;
