//! 管理者向けお知らせ一覧

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::deserialize_id;
use crate::api::endpoints;
use crate::api::generic::RawPage;
use crate::api::{ApiRequest, BackendApi, PagedResult};
use crate::CounselResult;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationItem {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, alias = "content")]
    pub message: String,
    #[serde(default, alias = "isRead")]
    pub read: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

pub fn unread_count(items: &[NotificationItem]) -> usize {
    items.iter().filter(|item| !item.read).count()
}

#[derive(Clone)]
pub struct NotificationFeed {
    api: BackendApi,
}

impl NotificationFeed {
    pub fn new(api: BackendApi) -> Self {
        Self { api }
    }

    pub async fn list(&self, page: u32, size: u32) -> CounselResult<PagedResult<NotificationItem>> {
        let request = ApiRequest::get(endpoints::NOTIFICATION_LIST)
            .query("page", page)
            .query("size", size);
        let page_data = match self.api.lookup::<RawPage<NotificationItem>>(request).await?.into_option() {
            Some(raw) => raw.into_paged(page, size),
            None => PagedResult::empty(page, size),
        };
        tracing::debug!(
            count = page_data.data.len(),
            unread = unread_count(&page_data.data),
            "🔔 Notifications loaded"
        );
        Ok(page_data)
    }
}
