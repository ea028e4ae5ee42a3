//! 予約一覧とレビュー期限のカウントダウン

pub mod countdown;
pub mod models;
pub mod service;
pub mod ticker;

pub use countdown::{derive_countdowns, review_window, CountdownBoard, CountdownState, REVIEW_WINDOW_HOURS};
pub use models::{BookingId, BookingMember, BookingRecord, BookingStatus, MemberId};
pub use service::{BookingQuery, BookingService};
pub use ticker::{Clock, CountdownTicker, ManualClock, SystemClock, TickerConfig};
