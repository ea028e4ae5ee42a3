//! 予約一覧の取得

use serde_json::Value;

use super::models::{BookingRecord, BookingStatus};
use crate::api::endpoints;
use crate::api::generic::RawPage;
use crate::api::{ApiRequest, BackendApi, PagedResult};
use crate::CounselResult;

/// 予約一覧の検索条件
#[derive(Debug, Clone, PartialEq)]
pub struct BookingQuery {
    /// 1始まり
    pub page: u32,
    pub size: u32,
    pub status: Option<BookingStatus>,
}

impl Default for BookingQuery {
    fn default() -> Self {
        Self {
            page: 1,
            size: 20,
            status: None,
        }
    }
}

#[derive(Clone)]
pub struct BookingService {
    api: BackendApi,
}

impl BookingService {
    pub fn new(api: BackendApi) -> Self {
        Self { api }
    }

    pub async fn list(&self, query: &BookingQuery) -> CounselResult<PagedResult<BookingRecord>> {
        let request = ApiRequest::get(endpoints::BOOKING_LIST)
            .query("page", query.page)
            .query("size", query.size)
            .query_opt("status", query.status.as_ref().map(BookingStatus::as_api_str));

        let page: RawPage<Value> = self.api.fetch(request).await?;
        let raw_count = page.list.len();
        let paged = page.into_paged(query.page, query.size);

        let bookings: Vec<BookingRecord> =
            paged.data.iter().filter_map(BookingRecord::from_value).collect();
        if bookings.len() != raw_count {
            tracing::warn!(
                dropped = raw_count - bookings.len(),
                "⚠️ Skipped booking records without id or time window"
            );
        }

        tracing::debug!(
            page = query.page,
            count = bookings.len(),
            total = paged.total_count,
            "📅 Bookings loaded"
        );

        Ok(PagedResult {
            data: bookings,
            page: paged.page,
            size: paged.size,
            total_count: paged.total_count,
            total_pages: paged.total_pages,
            has_previous: paged.has_previous,
            has_next: paged.has_next,
        })
    }
}
