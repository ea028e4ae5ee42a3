//! 古い非同期結果の書き込み防止
//!
//! 各コンポーネントは `ComponentScope` を一つ持ち、取得を始めるたびに
//! `ScopeTicket` を発行する。結果はマウント中かつ最新のチケットでのみ反映する。

use parking_lot::RwLock;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use super::load_state::LoadState;
use crate::CounselResult;

#[derive(Debug)]
struct ScopeInner {
    name: String,
    mounted: AtomicBool,
    generation: AtomicU64,
}

/// コンポーネントのマウント範囲
///
/// drop でアンマウントされ、発行済みのチケットはすべて無効になる。
#[derive(Debug)]
pub struct ComponentScope {
    inner: Arc<ScopeInner>,
}

impl ComponentScope {
    pub fn mount(name: impl Into<String>) -> Self {
        let name = name.into();
        tracing::trace!(scope = %name, "🔗 Scope mounted");
        Self {
            inner: Arc::new(ScopeInner {
                name,
                mounted: AtomicBool::new(true),
                generation: AtomicU64::new(0),
            }),
        }
    }

    /// 新しい取得を開始する。以前のチケットは無効になる
    pub fn begin(&self) -> ScopeTicket {
        let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
        ScopeTicket {
            inner: self.inner.clone(),
            generation,
        }
    }

    pub fn is_mounted(&self) -> bool {
        self.inner.mounted.load(Ordering::SeqCst)
    }

    pub fn unmount(&self) {
        if self.inner.mounted.swap(false, Ordering::SeqCst) {
            tracing::trace!(scope = %self.inner.name, "🔌 Scope unmounted");
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }
}

impl Drop for ComponentScope {
    fn drop(&mut self) {
        self.unmount();
    }
}

/// 一回の取得に紐づく許可証
#[derive(Debug, Clone)]
pub struct ScopeTicket {
    inner: Arc<ScopeInner>,
    generation: u64,
}

impl ScopeTicket {
    /// まだ結果を反映してよいか
    pub fn is_current(&self) -> bool {
        self.inner.mounted.load(Ordering::SeqCst)
            && self.inner.generation.load(Ordering::SeqCst) == self.generation
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// コンポーネントが所有する状態の置き場
#[derive(Debug)]
pub struct StateSlot<T> {
    state: Arc<RwLock<LoadState<T>>>,
}

impl<T> Clone for StateSlot<T> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
        }
    }
}

impl<T> Default for StateSlot<T> {
    fn default() -> Self {
        Self {
            state: Arc::new(RwLock::new(LoadState::Idle)),
        }
    }
}

impl<T: Clone> StateSlot<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> LoadState<T> {
        self.state.read().clone()
    }

    /// チケットが有効な場合のみ書き込む。書き込んだら `true`
    pub fn apply(&self, ticket: &ScopeTicket, next: LoadState<T>) -> bool {
        if !ticket.is_current() {
            tracing::debug!(
                scope = %ticket.inner.name,
                generation = ticket.generation,
                "🗑️ Discarded stale resolution"
            );
            return false;
        }
        *self.state.write() = next;
        true
    }

    /// 読み込み中にしてから取得し、結果を反映する
    ///
    /// 結果を反映したら `true`。
    pub async fn load<F>(&self, scope: &ComponentScope, fetch: F) -> bool
    where
        F: Future<Output = LoadState<T>>,
    {
        let ticket = scope.begin();
        self.apply(&ticket, LoadState::Loading);
        let next = fetch.await;
        self.apply(&ticket, next)
    }

    /// `CounselResult<Option<T>>` を返す取得用
    pub async fn load_result<F>(&self, scope: &ComponentScope, fetch: F) -> bool
    where
        F: Future<Output = CounselResult<Option<T>>>,
    {
        self.load(scope, async move { LoadState::from_result(fetch.await) })
            .await
    }
}
