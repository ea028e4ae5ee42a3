//! 性格タイプ（診断結果ラベル）の参照データ管理
//!
//! 診断結果の補足取得とは違い、ここでの失敗はそのまま呼び出し側へ返す。

use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{deserialize_id, validated};
use crate::api::endpoints;
use crate::api::{ApiRequest, BackendApi};
use crate::survey::{PersonalityDetail, SurveyType};
use crate::CounselResult;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalityType {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(alias = "typeName", alias = "result")]
    pub name: String,
    #[serde(default)]
    pub survey_id: Option<u8>,
    #[serde(default, alias = "desc", alias = "detail")]
    pub description: String,
    #[serde(default, alias = "image")]
    pub image_url: Option<String>,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub weaknesses: Vec<String>,
}

impl PersonalityType {
    pub fn survey_type(&self) -> Option<SurveyType> {
        self.survey_id.and_then(SurveyType::from_survey_id)
    }
}

/// 説明文・画像などの更新フォーム
#[derive(Debug, Clone, Default, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PersonalityTypeForm {
    #[validate(length(max = 5000, message = "Description must be at most 5000 characters"))]
    pub description: String,
    #[validate(url(message = "Image must be a URL"))]
    pub image_url: Option<String>,
    #[validate(length(max = 20))]
    pub strengths: Vec<String>,
    #[validate(length(max = 20))]
    pub weaknesses: Vec<String>,
}

impl From<&PersonalityType> for PersonalityTypeForm {
    fn from(personality: &PersonalityType) -> Self {
        Self {
            description: personality.description.clone(),
            image_url: personality.image_url.clone(),
            strengths: personality.strengths.clone(),
            weaknesses: personality.weaknesses.clone(),
        }
    }
}

#[derive(Clone)]
pub struct PersonalityTypeService {
    api: BackendApi,
}

impl PersonalityTypeService {
    pub fn new(api: BackendApi) -> Self {
        Self { api }
    }

    /// 一覧。種類を指定すればその診断のタイプだけ
    pub async fn list(&self, survey_type: Option<SurveyType>) -> CounselResult<Vec<PersonalityType>> {
        let request = ApiRequest::get(endpoints::PERSON_TYPE_LIST)
            .query_opt("surveyId", survey_type.map(|t| t.survey_id()));
        let types: Option<Vec<PersonalityType>> = self.api.lookup(request).await?.into_option();
        Ok(types.unwrap_or_default())
    }

    /// タイプ名で詳細を引く。該当なしは `None`
    pub async fn detail(&self, name: &str) -> CounselResult<Option<PersonalityDetail>> {
        let name = name.trim();
        if name.is_empty() {
            return Ok(None);
        }
        let request = ApiRequest::get(endpoints::PERSON_TYPE_BY_NAME).query("name", name);
        Ok(self.api.lookup(request).await?.into_option())
    }

    pub async fn update(&self, type_id: &str, form: &PersonalityTypeForm) -> CounselResult<()> {
        let request = ApiRequest::put(endpoints::person_type_item(type_id)).json(validated(form)?)?;
        self.api.dispatch(request).await?;
        tracing::info!(personality_type = type_id, "🧩 Personality type updated");
        Ok(())
    }
}
