//! 診断レポートの送信
//!
//! 送信先ごとに送信中フラグを持つ。メンバーAとメンバーBへの送信は
//! 互いに独立して完了・失敗する。再試行はしない。

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

use crate::api::endpoints;
use crate::api::{ApiRequest, BackendApi};
use crate::booking::BookingId;
use crate::view::NotificationCenter;
use crate::{CounselError, CounselResult};

/// 送信先コード
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ReportCode {
    /// 一人目
    FirstMember,
    /// 二人目
    SecondMember,
    /// 二人とも
    Both,
    /// 相性分析
    Compatibility,
}

impl ReportCode {
    pub const ALL: [ReportCode; 4] = [
        ReportCode::FirstMember,
        ReportCode::SecondMember,
        ReportCode::Both,
        ReportCode::Compatibility,
    ];

    pub fn code(&self) -> u8 {
        match self {
            ReportCode::FirstMember => 1,
            ReportCode::SecondMember => 2,
            ReportCode::Both => 3,
            ReportCode::Compatibility => 4,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.code() == code)
    }

    pub fn recipient(&self) -> &'static str {
        match self {
            ReportCode::FirstMember => "member1",
            ReportCode::SecondMember => "member2",
            ReportCode::Both => "both",
            ReportCode::Compatibility => "compatibility",
        }
    }
}

impl std::fmt::Display for ReportCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.recipient(), self.code())
    }
}

#[derive(Debug, Serialize)]
struct ReportMetadataBody {
    code: u8,
}

/// 送信中フラグのキー（操作・予約・送信先）
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InFlightKey {
    pub action: &'static str,
    pub booking: BookingId,
    pub recipient: ReportCode,
}

impl InFlightKey {
    pub const SEND_REPORT: &'static str = "send-report";

    pub fn send_report(booking: &BookingId, code: ReportCode) -> Self {
        Self {
            action: Self::SEND_REPORT,
            booking: booking.clone(),
            recipient: code,
        }
    }
}

impl std::fmt::Display for InFlightKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.action, self.booking, self.recipient.recipient())
    }
}

type InFlightSet = Arc<Mutex<HashSet<InFlightKey>>>;

/// 完了・失敗・中断のどれでもフラグを下ろす
struct InFlightGuard {
    set: InFlightSet,
    key: InFlightKey,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.set.lock().remove(&self.key);
    }
}

/// レポート送信
#[derive(Clone)]
pub struct ReportDispatcher {
    api: BackendApi,
    notifications: NotificationCenter,
    in_flight: InFlightSet,
}

impl ReportDispatcher {
    pub fn new(api: BackendApi, notifications: NotificationCenter) -> Self {
        Self {
            api,
            notifications,
            in_flight: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    pub fn is_in_flight(&self, booking: &BookingId, code: ReportCode) -> bool {
        self.in_flight
            .lock()
            .contains(&InFlightKey::send_report(booking, code))
    }

    pub fn in_flight_count(&self) -> usize {
        self.in_flight.lock().len()
    }

    /// レポートを送信する
    ///
    /// 同じ送信先が送信中なら `AlreadyInFlight`。失敗時はトーストを出して
    /// 自分のフラグだけ下ろす。
    pub async fn send(&self, booking: &BookingId, code: ReportCode) -> CounselResult<()> {
        let key = InFlightKey::send_report(booking, code);
        if !self.in_flight.lock().insert(key.clone()) {
            tracing::debug!(key = %key, "⏳ Report send already in flight");
            return Err(CounselError::AlreadyInFlight(key.to_string()));
        }
        let _guard = InFlightGuard {
            set: self.in_flight.clone(),
            key: key.clone(),
        };

        tracing::info!(%booking, code = code.code(), "📨 Sending report");

        let request = ApiRequest::put(endpoints::report_metadata(booking.as_str()))
            .json(&ReportMetadataBody { code: code.code() })?;

        match self.api.dispatch(request).await {
            Ok(()) => {
                tracing::info!(%booking, code = code.code(), "✅ Report sent");
                self.notifications
                    .success(format!("Report sent to {}", code.recipient()));
                Ok(())
            }
            Err(e) => {
                tracing::error!(%booking, code = code.code(), "❌ Report send failed: {}", e);
                self.notifications
                    .error(format!("Failed to send report to {}: {}", code.recipient(), e));
                Err(e)
            }
        }
    }
}
