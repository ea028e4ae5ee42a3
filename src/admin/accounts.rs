//! カウンセラー・会員アカウントの利用停止／再開

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::api::endpoints;
use crate::api::{ApiRequest, BackendApi};
use crate::CounselResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AccountKind {
    Counselor,
    Member,
}

impl AccountKind {
    fn status_endpoint(&self, id: &str) -> String {
        match self {
            AccountKind::Counselor => endpoints::counselor_status(id),
            AccountKind::Member => endpoints::member_status(id),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountStatus {
    Active,
    Blocked,
}

/// 一覧の一行
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountEntry {
    pub id: String,
    pub kind: AccountKind,
    pub name: String,
    pub status: AccountStatus,
}

/// 手元のアカウント一覧
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AccountDirectory {
    entries: BTreeMap<(AccountKind, String), AccountEntry>,
}

impl AccountDirectory {
    /// 取得し直した一覧で置き換える
    pub fn replace_all(&mut self, entries: impl IntoIterator<Item = AccountEntry>) {
        self.entries = entries
            .into_iter()
            .map(|entry| ((entry.kind, entry.id.clone()), entry))
            .collect();
    }

    pub fn get(&self, kind: AccountKind, id: &str) -> Option<&AccountEntry> {
        self.entries.get(&(kind, id.to_string()))
    }

    pub fn entries(&self) -> impl Iterator<Item = &AccountEntry> {
        self.entries.values()
    }

    pub fn blocked_count(&self) -> usize {
        self.entries
            .values()
            .filter(|e| e.status == AccountStatus::Blocked)
            .count()
    }

    fn patch_status(&mut self, kind: AccountKind, id: &str, status: AccountStatus) -> bool {
        match self.entries.get_mut(&(kind, id.to_string())) {
            Some(entry) => {
                entry.status = status;
                true
            }
            None => false,
        }
    }
}

#[derive(Debug, Serialize)]
struct StatusBody {
    status: AccountStatus,
}

#[derive(Clone)]
pub struct AccountService {
    api: BackendApi,
}

impl AccountService {
    pub fn new(api: BackendApi) -> Self {
        Self { api }
    }

    /// 状態を変更し、成功したら手元の一覧にも反映する
    pub async fn set_status(
        &self,
        directory: &mut AccountDirectory,
        kind: AccountKind,
        id: &str,
        status: AccountStatus,
    ) -> CounselResult<()> {
        let request = ApiRequest::put(kind.status_endpoint(id)).json(&StatusBody { status })?;
        self.api.dispatch(request).await?;

        let patched = directory.patch_status(kind, id, status);
        tracing::info!(?kind, id, ?status, patched, "🔒 Account status changed");
        Ok(())
    }

    pub async fn block(&self, directory: &mut AccountDirectory, kind: AccountKind, id: &str) -> CounselResult<()> {
        self.set_status(directory, kind, id, AccountStatus::Blocked).await
    }

    pub async fn unblock(&self, directory: &mut AccountDirectory, kind: AccountKind, id: &str) -> CounselResult<()> {
        self.set_status(directory, kind, id, AccountStatus::Active).await
    }
}
