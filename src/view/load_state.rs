//! データ取得コンポーネントごとの読み込み状態

use crate::error::{CounselError, Presentation};

/// 失敗時に画面へ出す内容
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureNotice {
    pub message: String,
    /// 再試行ボタンを出すか
    pub retryable: bool,
    pub presentation: Presentation,
}

impl FailureNotice {
    pub fn from_error(error: &CounselError) -> Self {
        Self {
            message: error.to_string(),
            retryable: error.is_transport(),
            presentation: error.presentation(),
        }
    }
}

/// 読み込み状態
#[derive(Debug, Clone, PartialEq, Default)]
pub enum LoadState<T> {
    /// 未開始
    #[default]
    Idle,
    Loading,
    Ready(T),
    /// 取得は成功したがデータなし
    Empty,
    Failed(FailureNotice),
}

impl<T> LoadState<T> {
    pub fn failed(error: &CounselError) -> Self {
        Self::Failed(FailureNotice::from_error(error))
    }

    /// `Ok(None)` は `Empty`
    pub fn from_result(result: crate::CounselResult<Option<T>>) -> Self {
        match result {
            Ok(Some(value)) => Self::Ready(value),
            Ok(None) => Self::Empty,
            Err(e) => Self::failed(&e),
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    pub fn ready(&self) -> Option<&T> {
        match self {
            Self::Ready(value) => Some(value),
            _ => None,
        }
    }

    pub fn into_ready(self) -> Option<T> {
        match self {
            Self::Ready(value) => Some(value),
            _ => None,
        }
    }

    pub fn failure(&self) -> Option<&FailureNotice> {
        match self {
            Self::Failed(notice) => Some(notice),
            _ => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> LoadState<U> {
        match self {
            Self::Idle => LoadState::Idle,
            Self::Loading => LoadState::Loading,
            Self::Ready(value) => LoadState::Ready(f(value)),
            Self::Empty => LoadState::Empty,
            Self::Failed(notice) => LoadState::Failed(notice),
        }
    }
}
