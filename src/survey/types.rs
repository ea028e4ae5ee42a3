//! 診断結果のデータ型

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 特性名 → スコア
pub type ScoreMap = BTreeMap<String, f64>;

/// 診断の種類（固定の4種）
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
    derive_more::Display,
)]
pub enum SurveyType {
    #[display("MBTI")]
    Mbti,
    #[display("DISC")]
    Disc,
    #[display("Love Language")]
    LoveLanguage,
    #[display("Big Five")]
    BigFive,
}

impl SurveyType {
    /// 表示優先順
    pub const ALL: [SurveyType; 4] = [
        SurveyType::Mbti,
        SurveyType::Disc,
        SurveyType::LoveLanguage,
        SurveyType::BigFive,
    ];

    /// バックエンドの survey ID
    pub fn survey_id(&self) -> u8 {
        match self {
            SurveyType::Mbti => 1,
            SurveyType::Disc => 2,
            SurveyType::LoveLanguage => 3,
            SurveyType::BigFive => 4,
        }
    }

    pub fn from_survey_id(id: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.survey_id() == id)
    }

    /// 同じ日付内での並び順（小さいほど先）
    pub fn priority(&self) -> u8 {
        self.survey_id()
    }

    /// カップル診断ペイロードでのキー
    pub fn couple_key(&self) -> &'static str {
        match self {
            SurveyType::Mbti => "mbti",
            SurveyType::Disc => "disc",
            SurveyType::LoveLanguage => "loveLanguage",
            SurveyType::BigFive => "bigFive",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let key: String = raw
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        match key.as_str() {
            "mbti" | "1" => Some(SurveyType::Mbti),
            "disc" | "2" => Some(SurveyType::Disc),
            "lovelanguage" | "lovelanguages" | "3" => Some(SurveyType::LoveLanguage),
            "bigfive" | "big5" | "ocean" | "4" => Some(SurveyType::BigFive),
            _ => None,
        }
    }
}

/// by-name 参照で得られる詳細
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PersonalityDetail {
    #[serde(default, alias = "detail", alias = "content")]
    pub long_description: Option<String>,
    #[serde(default, alias = "image", alias = "imageUrl")]
    pub image_url: Option<String>,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub weaknesses: Vec<String>,
}

impl PersonalityDetail {
    pub fn is_empty(&self) -> bool {
        self.long_description.is_none()
            && self.image_url.is_none()
            && self.strengths.is_empty()
            && self.weaknesses.is_empty()
    }
}

/// 正規化済みの診断結果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurveyResult {
    pub survey_type: SurveyType,
    /// 結果ラベル（例: "INTJ"）
    pub label: String,
    pub description: String,
    pub scores: ScoreMap,
    pub created_at: Option<DateTime<Utc>>,
    /// エンリッチメントで付与される詳細
    pub detail: Option<PersonalityDetail>,
}

impl SurveyResult {
    pub fn new(survey_type: SurveyType, label: impl Into<String>) -> Self {
        Self {
            survey_type,
            label: label.into(),
            description: String::new(),
            scores: ScoreMap::new(),
            created_at: None,
            detail: None,
        }
    }

    pub fn has_label(&self) -> bool {
        !self.label.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_survey_id_round_trip() {
        for survey_type in SurveyType::ALL {
            assert_eq!(
                SurveyType::from_survey_id(survey_type.survey_id()),
                Some(survey_type)
            );
        }
        assert_eq!(SurveyType::from_survey_id(9), None);
    }

    #[test]
    fn test_parse_variants() {
        assert_eq!(SurveyType::parse("Love-Language"), Some(SurveyType::LoveLanguage));
        assert_eq!(SurveyType::parse("BIG_FIVE"), Some(SurveyType::BigFive));
        assert_eq!(SurveyType::parse("disc"), Some(SurveyType::Disc));
        assert_eq!(SurveyType::parse("enneagram"), None);
    }

    #[test]
    fn test_display_names() {
        assert_eq!(SurveyType::LoveLanguage.to_string(), "Love Language");
        assert_eq!(SurveyType::Mbti.to_string(), "MBTI");
    }
}
