//! レビュー期限のカウントダウン
//!
//! 「終了」状態の予約について、終了時刻 + 24時間 までの残り時間を求める。
//! 残りが0以下になったら期限切れとし、以降は負にならず期限切れのまま。

use chrono::{DateTime, Duration, Utc};
use std::collections::{BTreeMap, BTreeSet};

use super::models::{BookingId, BookingRecord};

/// レビュー期間（時間）
pub const REVIEW_WINDOW_HOURS: i64 = 24;

pub fn review_window() -> Duration {
    Duration::hours(REVIEW_WINDOW_HOURS)
}

/// 一予約分のカウントダウン
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountdownState {
    pub booking_id: BookingId,
    pub deadline: DateTime<Utc>,
    /// 残り秒数（0以上）
    pub remaining_secs: i64,
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
    pub is_expired: bool,
}

impl CountdownState {
    pub fn compute(booking_id: BookingId, deadline: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        if deadline <= now {
            return Self::expired(booking_id, deadline);
        }
        // 1秒未満の端数は切り上げる（期限直前に00:00:00を出さない）
        let millis = (deadline - now).num_milliseconds();
        let remaining = (millis + 999) / 1000;

        Self {
            booking_id,
            deadline,
            remaining_secs: remaining,
            hours: remaining / 3600,
            minutes: (remaining % 3600) / 60,
            seconds: remaining % 60,
            is_expired: false,
        }
    }

    pub fn expired(booking_id: BookingId, deadline: DateTime<Utc>) -> Self {
        Self {
            booking_id,
            deadline,
            remaining_secs: 0,
            hours: 0,
            minutes: 0,
            seconds: 0,
            is_expired: true,
        }
    }

    /// "HH:MM:SS"
    pub fn display(&self) -> String {
        format!("{:02}:{:02}:{:02}", self.hours, self.minutes, self.seconds)
    }
}

/// 予約一覧から対象の予約だけカウントダウンを求める
pub fn derive_countdowns(
    bookings: &[BookingRecord],
    now: DateTime<Utc>,
    window: Duration,
) -> BTreeMap<BookingId, CountdownState> {
    bookings
        .iter()
        .filter(|booking| booking.status.has_review_countdown())
        .map(|booking| {
            let state = CountdownState::compute(booking.id.clone(), booking.end_time + window, now);
            (booking.id.clone(), state)
        })
        .collect()
}

/// 画面に出すカウントダウン表
///
/// 一度期限切れになった予約は、時計が戻っても期限切れのまま。
#[derive(Debug, Clone, PartialEq)]
pub struct CountdownBoard {
    window: Duration,
    entries: BTreeMap<BookingId, CountdownState>,
    expired: BTreeSet<BookingId>,
}

impl Default for CountdownBoard {
    fn default() -> Self {
        Self::new(review_window())
    }
}

impl CountdownBoard {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            entries: BTreeMap::new(),
            expired: BTreeSet::new(),
        }
    }

    /// 現在の予約一覧と時刻で再計算する
    pub fn refresh(&mut self, bookings: &[BookingRecord], now: DateTime<Utc>) {
        let mut entries = derive_countdowns(bookings, now, self.window);

        for (id, state) in entries.iter_mut() {
            if self.expired.contains(id) && !state.is_expired {
                *state = CountdownState::expired(id.clone(), state.deadline);
            }
            if state.is_expired && self.expired.insert(id.clone()) {
                tracing::debug!(booking = %id, "⌛ Review window expired");
            }
        }

        // 一覧から消えた予約は忘れる
        self.expired.retain(|id| entries.contains_key(id));
        self.entries = entries;
    }

    pub fn get(&self, booking_id: &BookingId) -> Option<&CountdownState> {
        self.entries.get(booking_id)
    }

    pub fn entries(&self) -> impl Iterator<Item = &CountdownState> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn active_count(&self) -> usize {
        self.entries.values().filter(|s| !s.is_expired).count()
    }
}
