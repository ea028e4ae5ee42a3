//! 会員プランの管理

use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{deserialize_id, validated};
use crate::api::endpoints;
use crate::api::{ApiRequest, BackendApi};
use crate::CounselResult;

/// 会員プラン
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Membership {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub price: f64,
    #[serde(default, alias = "duration")]
    pub duration_days: u32,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

/// 作成・更新フォーム
#[derive(Debug, Clone, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct MembershipForm {
    #[validate(length(min = 1, max = 100, message = "Name must be 1 to 100 characters"))]
    pub name: String,
    #[validate(range(min = 0.0, message = "Price cannot be negative"))]
    pub price: f64,
    #[validate(range(min = 1, max = 3650, message = "Duration must be between 1 and 3650 days"))]
    pub duration_days: u32,
    #[validate(length(max = 1000, message = "Description must be at most 1000 characters"))]
    pub description: String,
    pub active: bool,
}

impl From<&Membership> for MembershipForm {
    fn from(membership: &Membership) -> Self {
        Self {
            name: membership.name.clone(),
            price: membership.price,
            duration_days: membership.duration_days,
            description: membership.description.clone(),
            active: membership.active,
        }
    }
}

#[derive(Clone)]
pub struct MembershipService {
    api: BackendApi,
}

impl MembershipService {
    pub fn new(api: BackendApi) -> Self {
        Self { api }
    }

    pub async fn list(&self) -> CounselResult<Vec<Membership>> {
        let memberships: Option<Vec<Membership>> = self
            .api
            .lookup(ApiRequest::get(endpoints::MEMBERSHIP))
            .await?
            .into_option();
        Ok(memberships.unwrap_or_default())
    }

    pub async fn create(&self, form: &MembershipForm) -> CounselResult<Membership> {
        let request = ApiRequest::post(endpoints::MEMBERSHIP).json(validated(form)?)?;
        let created: Membership = self.api.fetch(request).await?;
        tracing::info!(membership = %created.id, name = %created.name, "🪪 Membership created");
        Ok(created)
    }

    pub async fn update(&self, membership_id: &str, form: &MembershipForm) -> CounselResult<Membership> {
        let request =
            ApiRequest::put(endpoints::membership_item(membership_id)).json(validated(form)?)?;
        let updated: Membership = self.api.fetch(request).await?;
        tracing::info!(membership = membership_id, "🪪 Membership updated");
        Ok(updated)
    }

    pub async fn delete(&self, membership_id: &str) -> CounselResult<()> {
        self.api
            .dispatch(ApiRequest::delete(endpoints::membership_item(membership_id)))
            .await?;
        tracing::info!(membership = membership_id, "🗑️ Membership deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> MembershipForm {
        MembershipForm {
            name: "Premium".into(),
            price: 49.0,
            duration_days: 30,
            description: String::new(),
            active: true,
        }
    }

    #[test]
    fn test_valid_form() {
        assert!(form().validate().is_ok());
    }

    #[test]
    fn test_invalid_fields_are_reported() {
        let invalid = MembershipForm {
            name: String::new(),
            price: -1.0,
            duration_days: 0,
            ..form()
        };
        let errors = invalid.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("name"));
        assert!(fields.contains_key("price"));
        assert!(fields.contains_key("duration_days"));
    }

    #[test]
    fn test_form_serializes_camel_case() {
        let body = serde_json::to_value(form()).unwrap();
        assert_eq!(body["durationDays"], 30);
    }
}
