//! カウンセラー資格証明の審査

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use super::{deserialize_id, validated};
use crate::api::endpoints;
use crate::api::generic::RawPage;
use crate::api::{ApiRequest, BackendApi, PagedResult};
use crate::CounselResult;

/// 審査状態
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CertificateStatus {
    Pending,
    Approved,
    Rejected,
    Unknown(String),
}

impl CertificateStatus {
    pub fn as_api_str(&self) -> &str {
        match self {
            Self::Pending => "PENDING",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
            Self::Unknown(raw) => raw,
        }
    }
}

impl From<String> for CertificateStatus {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_uppercase().as_str() {
            "PENDING" | "WAITING" => Self::Pending,
            "APPROVED" | "APPROVE" => Self::Approved,
            "REJECTED" | "REJECT" => Self::Rejected,
            _ => Self::Unknown(value),
        }
    }
}

impl From<CertificateStatus> for String {
    fn from(value: CertificateStatus) -> Self {
        value.as_api_str().to_string()
    }
}

/// 資格証明
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Certificate {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(default, alias = "name")]
    pub title: String,
    #[serde(default, alias = "counselor")]
    pub counselor_name: String,
    #[serde(default, alias = "fileUrl")]
    pub image_url: Option<String>,
    pub status: CertificateStatus,
    #[serde(default, alias = "createdAt")]
    pub submitted_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub note: Option<String>,
}

/// 一覧の検索条件
#[derive(Debug, Clone, PartialEq)]
pub struct CertificateQuery {
    pub page: u32,
    pub size: u32,
    pub status: Option<CertificateStatus>,
}

impl Default for CertificateQuery {
    fn default() -> Self {
        Self {
            page: 1,
            size: 20,
            status: Some(CertificateStatus::Pending),
        }
    }
}

/// 審査フォーム
#[derive(Debug, Clone, Serialize, Validate)]
#[validate(schema(function = "rejection_needs_note"))]
pub struct CertificateReviewForm {
    pub approved: bool,
    #[validate(length(max = 500, message = "Note must be at most 500 characters"))]
    pub note: Option<String>,
}

impl CertificateReviewForm {
    pub fn approve() -> Self {
        Self {
            approved: true,
            note: None,
        }
    }

    pub fn reject(note: impl Into<String>) -> Self {
        Self {
            approved: false,
            note: Some(note.into()),
        }
    }
}

fn rejection_needs_note(form: &CertificateReviewForm) -> Result<(), ValidationError> {
    let has_note = form.note.as_deref().is_some_and(|n| !n.trim().is_empty());
    if form.approved || has_note {
        return Ok(());
    }
    Err(ValidationError::new("rejection_note")
        .with_message("A reason is required when rejecting".into()))
}

#[derive(Clone)]
pub struct CertificateService {
    api: BackendApi,
}

impl CertificateService {
    pub fn new(api: BackendApi) -> Self {
        Self { api }
    }

    pub async fn list(&self, query: &CertificateQuery) -> CounselResult<PagedResult<Certificate>> {
        let request = ApiRequest::get(endpoints::CERTIFICATE_LIST)
            .query("page", query.page)
            .query("size", query.size)
            .query_opt("status", query.status.as_ref().map(CertificateStatus::as_api_str));

        let page: RawPage<Certificate> = self.api.fetch(request).await?;
        Ok(page.into_paged(query.page, query.size))
    }

    /// 承認・却下して、成功したら手元の一覧にも反映する
    pub async fn review(
        &self,
        certificates: &mut [Certificate],
        certificate_id: &str,
        form: &CertificateReviewForm,
    ) -> CounselResult<()> {
        let request = ApiRequest::put(endpoints::certificate_approval(certificate_id))
            .json(validated(form)?)?;
        self.api.dispatch(request).await?;

        let next = if form.approved {
            CertificateStatus::Approved
        } else {
            CertificateStatus::Rejected
        };
        tracing::info!(certificate = certificate_id, status = next.as_api_str(), "📜 Certificate reviewed");

        if let Some(certificate) = certificates.iter_mut().find(|c| c.id == certificate_id) {
            certificate.status = next;
            certificate.note = form.note.clone();
        }
        Ok(())
    }
}
