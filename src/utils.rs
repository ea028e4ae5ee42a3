// ログ初期化と表示用ユーティリティ

use tracing_appender::non_blocking::WorkerGuard;
use tracing::Subscriber;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::config_manager::{ConfigManager, LogConfig};

/// ログ初期化
///
/// `RUST_LOG` があればそれを優先し、無ければ設定のレベルを使う。
/// ファイル出力が有効なら日次ローテーションのファイルにJSON行で書き、
/// 返したガードを保持している間だけ書き込みが続く。
pub fn init_logging(config: &LogConfig) -> anyhow::Result<Option<WorkerGuard>> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .or_else(|_| EnvFilter::try_new("info"))?;

    let console_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact();

    let (file_layer, guard) = match file_log_dir(config) {
        Some(dir) => {
            std::fs::create_dir_all(&dir)?;
            let appender = tracing_appender::rolling::daily(&dir, &config.file_prefix);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(json_file_layer(writer)), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()?;

    if guard.is_some() {
        tracing::debug!("📝 File logging enabled");
    }
    Ok(guard)
}

/// ファイル用のレイヤー。1行1JSONで、フィールドはイベント直下に展開する
fn json_file_layer<S, W>(writer: W) -> impl Layer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    tracing_subscriber::fmt::layer()
        .json()
        .flatten_event(true)
        .with_current_span(false)
        .with_ansi(false)
        .with_target(true)
        .with_writer(writer)
}

fn file_log_dir(config: &LogConfig) -> Option<std::path::PathBuf> {
    if !config.enable_file_logging {
        return None;
    }
    config.log_dir.clone().or_else(ConfigManager::default_log_dir)
}

/// API リクエスト/レスポンスのログ
pub fn log_api_request(method: &str, url: &str, attempt: u32) {
    tracing::debug!(method, url = %url, attempt, "📡 API request sent");
}

pub fn log_api_response(method: &str, url: &str, status: u16, duration_ms: u64) {
    if (200..300).contains(&status) {
        tracing::debug!(method, url = %url, status, duration_ms, "📥 API response received");
    } else {
        tracing::warn!(method, url = %url, status, duration_ms, "⚠️ API response not successful");
    }
}

/// 先頭だけを表示用に切り出す
pub fn preview(text: &str, max_chars: usize) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{}…", head)
    } else {
        head
    }
}
