//! 一時通知（トースト）
//!
//! 操作の成否を短時間だけ表示する。表示時間を過ぎたものは取得時に捨てる。

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;

/// 通知の種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ToastLevel {
    Info,
    Success,
    Error,
}

/// 通知
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Toast {
    pub id: String,
    pub level: ToastLevel,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Toast {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// 通知センターの設定
#[derive(Debug, Clone)]
pub struct NotificationCenterConfig {
    /// 表示時間
    pub ttl: Duration,
    /// 保持する最大件数（古いものから捨てる）
    pub capacity: usize,
}

impl Default for NotificationCenterConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::seconds(5),
            capacity: 20,
        }
    }
}

/// 通知センター（複製しても同じキューを共有）
#[derive(Debug, Clone, Default)]
pub struct NotificationCenter {
    config: NotificationCenterConfig,
    queue: Arc<Mutex<VecDeque<Toast>>>,
}

impl NotificationCenter {
    pub fn new(config: NotificationCenterConfig) -> Self {
        Self {
            config,
            queue: Arc::new(Mutex::new(VecDeque::new())),
        }
    }

    pub fn push_at(&self, level: ToastLevel, message: impl Into<String>, now: DateTime<Utc>) -> Toast {
        let toast = Toast {
            id: uuid::Uuid::new_v4().to_string(),
            level,
            message: message.into(),
            created_at: now,
            expires_at: now + self.config.ttl,
        };

        let mut queue = self.queue.lock();
        queue.push_back(toast.clone());
        while queue.len() > self.config.capacity {
            queue.pop_front();
        }

        tracing::debug!(level = ?toast.level, message = %toast.message, "🔔 Toast pushed");
        toast
    }

    pub fn push(&self, level: ToastLevel, message: impl Into<String>) -> Toast {
        self.push_at(level, message, Utc::now())
    }

    pub fn info(&self, message: impl Into<String>) -> Toast {
        self.push(ToastLevel::Info, message)
    }

    pub fn success(&self, message: impl Into<String>) -> Toast {
        self.push(ToastLevel::Success, message)
    }

    pub fn error(&self, message: impl Into<String>) -> Toast {
        self.push(ToastLevel::Error, message)
    }

    /// 表示中の通知（期限切れは捨てる）
    pub fn active_at(&self, now: DateTime<Utc>) -> Vec<Toast> {
        let mut queue = self.queue.lock();
        queue.retain(|toast| !toast.is_expired_at(now));
        queue.iter().cloned().collect()
    }

    pub fn active(&self) -> Vec<Toast> {
        self.active_at(Utc::now())
    }

    /// 閉じる
    pub fn dismiss(&self, id: &str) -> bool {
        let mut queue = self.queue.lock();
        let before = queue.len();
        queue.retain(|toast| toast.id != id);
        queue.len() != before
    }

    /// すべて取り出す
    pub fn drain(&self) -> Vec<Toast> {
        self.queue.lock().drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.queue.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.lock().is_empty()
    }
}
