//! 画面側の状態管理（読み込み状態・スコープ・通知）

pub mod load_state;
pub mod notifications;
pub mod scope;

pub use load_state::{FailureNotice, LoadState};
pub use notifications::{NotificationCenter, NotificationCenterConfig, Toast, ToastLevel};
pub use scope::{ComponentScope, ScopeTicket, StateSlot};
