//! カップル診断スナップショット
//!
//! 予約単位で二人分の診断結果と相性情報をまとめて取得する。
//! 全項目が空なら「データなし」、部分的なデータは「あり」として扱う。

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::normalizer::{normalize_entry, normalize_payload};
use super::types::{SurveyResult, SurveyType};
use crate::api::endpoints;
use crate::api::{ApiRequest, BackendApi, LookupOutcome};
use crate::booking::BookingId;
use crate::view::LoadState;

/// 相性情報
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompatibilityRecord {
    /// 0〜100
    pub score: u8,
    pub description: String,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
}

impl CompatibilityRecord {
    fn from_value(value: &Value) -> Option<Self> {
        let Value::Object(map) = value else {
            return None;
        };

        let score = map
            .get("score")
            .or_else(|| map.get("compatibilityScore"))
            .and_then(|v| match v {
                Value::Number(n) => n.as_f64(),
                Value::String(s) => s.trim().parse().ok(),
                _ => None,
            })
            .map(|s: f64| s.round().clamp(0.0, 100.0) as u8)
            .unwrap_or(0);

        let description = map
            .get("description")
            .or_else(|| map.get("desc"))
            .or_else(|| map.get("text"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        Some(Self {
            score,
            description,
            strengths: string_list(map.get("strengths")),
            weaknesses: string_list(map.get("weaknesses")),
        })
    }
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        // 改行・カンマ区切りの文字列
        Some(Value::String(s)) => s
            .split(['\n', ','])
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

/// 一種類分の二人の結果
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemberPair {
    pub first: Option<SurveyResult>,
    pub second: Option<SurveyResult>,
}

impl MemberPair {
    pub fn is_empty(&self) -> bool {
        self.first.is_none() && self.second.is_none()
    }

    fn from_value(survey_type: SurveyType, value: &Value) -> Option<Self> {
        let pair = match value {
            Value::Object(map) => {
                let side = |keys: &[&str]| {
                    keys.iter()
                        .filter_map(|k| map.get(*k))
                        .find(|v| !v.is_null())
                        .and_then(|v| latest_of(survey_type, v))
                };
                Self {
                    first: side(&["member1", "first", "memberA", "husband"]),
                    second: side(&["member2", "second", "memberB", "wife"]),
                }
            }
            // [一人目, 二人目]
            Value::Array(items) => Self {
                first: items.first().and_then(|v| normalize_entry(survey_type, v)),
                second: items.get(1).and_then(|v| normalize_entry(survey_type, v)),
            },
            _ => return None,
        };
        (!pair.is_empty()).then_some(pair)
    }
}

fn latest_of(survey_type: SurveyType, value: &Value) -> Option<SurveyResult> {
    normalize_payload(survey_type, value).into_iter().next()
}

/// カップル診断スナップショット
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CoupleSurveySnapshot {
    pub booking_id: String,
    pub mbti: Option<MemberPair>,
    pub disc: Option<MemberPair>,
    pub love_language: Option<MemberPair>,
    pub big_five: Option<MemberPair>,
    pub compatibility: Option<CompatibilityRecord>,
}

impl CoupleSurveySnapshot {
    /// 生ペイロードから組み立てる
    pub fn from_value(booking_id: &BookingId, value: &Value) -> Self {
        let field = |survey_type: SurveyType| {
            value
                .get(survey_type.couple_key())
                .and_then(|v| MemberPair::from_value(survey_type, v))
        };

        let compatibility = ["compatibilityDetail", "compatibility"]
            .iter()
            .filter_map(|k| value.get(*k))
            .find(|v| !v.is_null())
            .and_then(CompatibilityRecord::from_value);

        Self {
            booking_id: booking_id.to_string(),
            mbti: field(SurveyType::Mbti),
            disc: field(SurveyType::Disc),
            love_language: field(SurveyType::LoveLanguage),
            big_five: field(SurveyType::BigFive),
            compatibility,
        }
    }

    pub fn pair(&self, survey_type: SurveyType) -> Option<&MemberPair> {
        match survey_type {
            SurveyType::Mbti => self.mbti.as_ref(),
            SurveyType::Disc => self.disc.as_ref(),
            SurveyType::LoveLanguage => self.love_language.as_ref(),
            SurveyType::BigFive => self.big_five.as_ref(),
        }
    }

    /// 4種類すべてと相性情報が無い場合のみ空
    pub fn is_empty(&self) -> bool {
        SurveyType::ALL.iter().all(|t| self.pair(*t).is_none()) && self.compatibility.is_none()
    }

    /// データのある種類
    pub fn available_types(&self) -> Vec<SurveyType> {
        SurveyType::ALL
            .into_iter()
            .filter(|t| self.pair(*t).is_some())
            .collect()
    }
}

/// カップル診断の取得サービス
#[derive(Clone)]
pub struct CoupleSurveyService {
    api: BackendApi,
}

impl CoupleSurveyService {
    pub fn new(api: BackendApi) -> Self {
        Self { api }
    }

    /// 取得して表示状態に変換する
    ///
    /// 404/204/400 と空スナップショットは `Empty`、通信・サーバーエラーは `Failed`。
    pub async fn fetch_couple_snapshot(&self, booking: &BookingId) -> LoadState<CoupleSurveySnapshot> {
        let request = ApiRequest::get(endpoints::couple_survey_by_booking(booking.as_str()));

        match self.api.lookup::<Value>(request).await {
            Ok(LookupOutcome::Found(payload)) => {
                let snapshot = CoupleSurveySnapshot::from_value(booking, &payload);
                if snapshot.is_empty() {
                    tracing::debug!(%booking, "📭 Couple snapshot has no survey data");
                    LoadState::Empty
                } else {
                    tracing::info!(
                        %booking,
                        types = snapshot.available_types().len(),
                        has_compatibility = snapshot.compatibility.is_some(),
                        "💞 Couple snapshot loaded"
                    );
                    LoadState::Ready(snapshot)
                }
            }
            Ok(LookupOutcome::NoData) => LoadState::Empty,
            Err(e) => {
                tracing::error!(%booking, "❌ Couple snapshot failed: {}", e);
                LoadState::failed(&e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn booking() -> BookingId {
        BookingId::from("b-1")
    }

    #[test]
    fn test_all_null_snapshot_is_empty() {
        let payload = json!({
            "mbti": null, "disc": null, "loveLanguage": null, "bigFive": null,
            "compatibilityDetail": null
        });
        assert!(CoupleSurveySnapshot::from_value(&booking(), &payload).is_empty());
        assert!(CoupleSurveySnapshot::from_value(&booking(), &json!({})).is_empty());
    }

    #[test]
    fn test_partial_snapshot_is_present() {
        let payload = json!({
            "disc": {"member1": {"result": "D", "createdAt": "2024-01-01"}, "member2": null}
        });
        let snapshot = CoupleSurveySnapshot::from_value(&booking(), &payload);
        assert!(!snapshot.is_empty());
        assert_eq!(snapshot.available_types(), vec![SurveyType::Disc]);
        let pair = snapshot.disc.unwrap();
        assert_eq!(pair.first.unwrap().label, "D");
        assert!(pair.second.is_none());
    }

    #[test]
    fn test_compatibility_only_is_present() {
        let payload = json!({"compatibilityDetail": {"score": 104.6, "description": "Good", "strengths": "trust, humor", "weaknesses": ["pace"]}});
        let snapshot = CoupleSurveySnapshot::from_value(&booking(), &payload);
        assert!(!snapshot.is_empty());

        let record = snapshot.compatibility.unwrap();
        assert_eq!(record.score, 100);
        assert_eq!(record.strengths, vec!["trust", "humor"]);
        assert_eq!(record.weaknesses, vec!["pace"]);
    }

    #[test]
    fn test_pair_from_array_and_history() {
        let payload = json!({
            "mbti": [{"result": "INTJ"}, {"type": "ENFP"}],
            "bigFive": {"first": [{"result": "old", "createdAt": "2023-01-01"}, {"result": "new", "createdAt": "2024-01-01"}]}
        });
        let snapshot = CoupleSurveySnapshot::from_value(&booking(), &payload);
        let mbti = snapshot.pair(SurveyType::Mbti).unwrap();
        assert_eq!(mbti.second.as_ref().unwrap().label, "ENFP");

        let big_five = snapshot.pair(SurveyType::BigFive).unwrap();
        assert_eq!(big_five.first.as_ref().unwrap().label, "new");
    }
}
