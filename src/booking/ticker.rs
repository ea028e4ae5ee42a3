//! カウントダウンのタイマー資源
//!
//! - 生成で開始し、drop・`stop()` のどちらでも必ず停止する
//! - 一定間隔で表を再計算し、watchチャネルで配信する
//! - 時計は差し替え可能（テストでは手動時計）

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;

use super::countdown::{review_window, CountdownBoard};
use super::models::BookingRecord;

/// 現在時刻の取得元
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// システム時計
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// 手動で進める時計
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock() = now;
    }

    pub fn advance(&self, by: ChronoDuration) {
        let mut now = self.now.lock();
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}

/// ティッカー設定
#[derive(Debug, Clone)]
pub struct TickerConfig {
    /// 再計算の間隔
    pub interval: Duration,
    /// レビュー期間
    pub window: ChronoDuration,
}

impl Default for TickerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            window: review_window(),
        }
    }
}

/// タスク終了時に稼働フラグを下ろす
struct AliveGuard(Arc<AtomicBool>);

impl Drop for AliveGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// マウント中だけ動くカウントダウン
pub struct CountdownTicker {
    bookings: Arc<RwLock<Vec<BookingRecord>>>,
    board_rx: watch::Receiver<CountdownBoard>,
    cancel_sender: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
    alive: Arc<AtomicBool>,
}

impl CountdownTicker {
    /// tokioランタイム上で開始する
    pub fn start(
        bookings: Vec<BookingRecord>,
        clock: Arc<dyn Clock>,
        config: TickerConfig,
    ) -> Self {
        let mut board = CountdownBoard::new(config.window);
        board.refresh(&bookings, clock.now());

        let (board_tx, board_rx) = watch::channel(board.clone());
        let (cancel_sender, mut cancel_receiver) = oneshot::channel::<()>();
        let bookings = Arc::new(RwLock::new(bookings));
        let alive = Arc::new(AtomicBool::new(true));

        let task_bookings = bookings.clone();
        let guard = AliveGuard(alive.clone());
        let period = config.interval;

        let handle = tokio::spawn(async move {
            let _guard = guard;
            let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        {
                            let bookings = task_bookings.read();
                            board.refresh(&bookings, clock.now());
                        }
                        board_tx.send_replace(board.clone());
                    }
                    _ = &mut cancel_receiver => {
                        tracing::debug!("⏱️ [COUNTDOWN] Ticker cancelled");
                        return;
                    }
                }
            }
        });

        tracing::debug!(
            interval_ms = period.as_millis() as u64,
            "⏱️ [COUNTDOWN] Ticker started"
        );

        Self {
            bookings,
            board_rx,
            cancel_sender: Some(cancel_sender),
            handle: Some(handle),
            alive,
        }
    }

    /// 表の変更を購読する
    pub fn subscribe(&self) -> watch::Receiver<CountdownBoard> {
        self.board_rx.clone()
    }

    /// 最新の表
    pub fn board(&self) -> CountdownBoard {
        self.board_rx.borrow().clone()
    }

    /// 一覧の再読み込み後に対象を差し替える（次のティックから反映）
    pub fn replace_bookings(&self, bookings: Vec<BookingRecord>) {
        *self.bookings.write() = bookings;
    }

    pub fn is_running(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    /// 稼働状態の監視用フラグ
    pub fn alive_flag(&self) -> Arc<AtomicBool> {
        self.alive.clone()
    }

    /// 停止する。二度目以降は何もしない
    pub fn stop(&mut self) {
        if let Some(sender) = self.cancel_sender.take() {
            let _ = sender.send(());
        }
        if let Some(handle) = self.handle.take() {
            handle.abort();
            tracing::debug!("⏱️ [COUNTDOWN] Ticker stopped");
        }
    }
}

impl Drop for CountdownTicker {
    fn drop(&mut self) {
        self.stop();
    }
}
