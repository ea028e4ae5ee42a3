//! 診断レポートの送信操作

pub mod dispatcher;

pub use dispatcher::{InFlightKey, ReportCode, ReportDispatcher};
