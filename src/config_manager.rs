//! アプリケーション設定管理モジュール
//!
//! XDGディレクトリの `config.toml` に設定を保存・読み込みする。

use anyhow::{Context, Result};
use chrono::{FixedOffset, Offset, Utc};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::api::{ApiClientConfig, NoDataPolicy, RetryConfig};
use crate::booking::TickerConfig;

/// ログ設定
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LogConfig {
    /// ログレベル (trace/debug/info/warn/error)
    pub log_level: String,
    /// ファイル出力有効化
    pub enable_file_logging: bool,
    /// カスタムログディレクトリ（Noneの場合はXDGデフォルト使用）
    pub log_dir: Option<PathBuf>,
    /// ログファイル名の接頭辞
    pub file_prefix: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            enable_file_logging: false,
            log_dir: None,
            file_prefix: "counsel-admin.log".to_string(),
        }
    }
}

/// API接続設定
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    /// リクエストタイムアウト（ミリ秒）
    pub timeout_ms: u64,
    /// 読み取りのみ再試行
    pub retry: RetryConfig,
    pub no_data: NoDataPolicy,
}

impl Default for ApiConfig {
    fn default() -> Self {
        let client = ApiClientConfig::default();
        Self {
            base_url: client.base_url,
            timeout_ms: client.default_timeout_ms,
            retry: client.retry,
            no_data: NoDataPolicy::default(),
        }
    }
}

/// 表示設定
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DisplayConfig {
    /// 日付グループ化に使うUTCオフセット（分）
    pub utc_offset_minutes: i32,
    /// 一覧の既定ページサイズ
    pub page_size: u32,
    /// レビュー期間（時間）
    pub review_window_hours: i64,
    /// カウントダウン更新間隔（ミリ秒）
    pub countdown_tick_ms: u64,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            utc_offset_minutes: 0,
            page_size: 20,
            review_window_hours: crate::booking::REVIEW_WINDOW_HOURS,
            countdown_tick_ms: 1000,
        }
    }
}

/// アプリケーション設定
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub display: DisplayConfig,
    pub log: LogConfig,
}

impl AppConfig {
    /// HTTPクライアント設定
    pub fn client_config(&self) -> ApiClientConfig {
        ApiClientConfig {
            base_url: self.api.base_url.clone(),
            default_timeout_ms: self.api.timeout_ms,
            retry: self.api.retry.clone(),
            ..ApiClientConfig::default()
        }
    }

    /// 表示用タイムゾーン（範囲外ならUTC）
    pub fn display_offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.display.utc_offset_minutes * 60).unwrap_or_else(|| {
            warn!(
                offset_minutes = self.display.utc_offset_minutes,
                "⚠️ Display offset out of range, using UTC"
            );
            Utc.fix()
        })
    }

    pub fn ticker_config(&self) -> TickerConfig {
        TickerConfig {
            interval: Duration::from_millis(self.display.countdown_tick_ms.max(1)),
            window: chrono::Duration::hours(self.display.review_window_hours),
        }
    }
}

/// 設定管理マネージャー
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// XDGディレクトリの設定ファイルを使う
    pub fn new() -> Result<Self> {
        let config_path = Self::default_config_path()?;
        Self::with_path(config_path)
    }

    /// 任意のパスを使う（テスト・`--config` 指定用）
    pub fn with_path(config_path: impl Into<PathBuf>) -> Result<Self> {
        let config_path = config_path.into();
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }
        Ok(Self { config_path })
    }

    fn default_config_path() -> Result<PathBuf> {
        let project_dirs = ProjectDirs::from("dev", "counsel", "counsel-admin")
            .context("Failed to get project directories")?;

        let config_file = project_dirs.config_dir().join("config.toml");
        debug!("Config file path: {}", config_file.display());
        Ok(config_file)
    }

    /// 既定のログディレクトリ
    pub fn default_log_dir() -> Option<PathBuf> {
        ProjectDirs::from("dev", "counsel", "counsel-admin")
            .map(|dirs| dirs.data_local_dir().join("logs"))
    }

    /// 設定を読み込み（ファイルが無ければ既定値）
    pub fn load_config(&self) -> Result<AppConfig> {
        if !self.config_path.exists() {
            info!(
                "Config file not found, using default settings: {}",
                self.config_path.display()
            );
            return Ok(AppConfig::default());
        }

        let config_content = fs::read_to_string(&self.config_path).with_context(|| {
            format!("Failed to read config file: {}", self.config_path.display())
        })?;

        let config: AppConfig = toml::from_str(&config_content).with_context(|| {
            format!("Failed to parse config file: {}", self.config_path.display())
        })?;

        info!("✅ Configuration loaded from: {}", self.config_path.display());
        Ok(config)
    }

    /// 設定を保存
    pub fn save_config(&self, config: &AppConfig) -> Result<()> {
        let config_content =
            toml::to_string_pretty(config).context("Failed to serialize config")?;

        fs::write(&self.config_path, config_content).with_context(|| {
            format!("Failed to write config file: {}", self.config_path.display())
        })?;

        info!("💾 Configuration saved to: {}", self.config_path.display());
        Ok(())
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn config_exists(&self) -> bool {
        self.config_path.exists()
    }
}
