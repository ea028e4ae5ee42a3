//! 講座の一覧・作成

use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{deserialize_id, validated};
use crate::api::endpoints;
use crate::api::generic::RawPage;
use crate::api::{ApiRequest, BackendApi, PagedResult};
use crate::CounselResult;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(alias = "name")]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub price: f64,
    #[serde(default, alias = "lessons")]
    pub lesson_count: u32,
    #[serde(default)]
    pub published: bool,
}

/// 作成フォーム
#[derive(Debug, Clone, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CourseForm {
    #[validate(length(min = 1, max = 200, message = "Title must be 1 to 200 characters"))]
    pub title: String,
    #[validate(length(max = 5000))]
    pub description: String,
    #[validate(range(min = 0.0, message = "Price cannot be negative"))]
    pub price: f64,
    #[validate(range(min = 1, max = 500, message = "A course needs at least one lesson"))]
    pub lesson_count: u32,
    #[validate(url(message = "Thumbnail must be a URL"))]
    pub thumbnail_url: Option<String>,
}

#[derive(Clone)]
pub struct CourseService {
    api: BackendApi,
}

impl CourseService {
    pub fn new(api: BackendApi) -> Self {
        Self { api }
    }

    pub async fn list(&self, page: u32, size: u32) -> CounselResult<PagedResult<Course>> {
        let request = ApiRequest::get(endpoints::COURSE_LIST)
            .query("page", page)
            .query("size", size);
        let raw: RawPage<Course> = self.api.fetch(request).await?;
        Ok(raw.into_paged(page, size))
    }

    pub async fn create(&self, form: &CourseForm) -> CounselResult<Course> {
        let request = ApiRequest::post(endpoints::COURSE).json(validated(form)?)?;
        let course: Course = self.api.fetch(request).await?;
        tracing::info!(course = %course.id, title = %course.title, "📚 Course created");
        Ok(course)
    }
}
