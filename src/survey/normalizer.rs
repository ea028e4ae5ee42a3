//! 診断結果ペイロードの正規化
//!
//! バックエンドの診断APIはフィールド名が時期によって揺れている。
//! ここで別名をすべて解決し、以降のコードは `SurveyResult` だけを見る。

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde_json::Value;

use super::types::{ScoreMap, SurveyResult, SurveyType};

const LABEL_KEYS: &[&str] = &["result", "type", "label", "resultType", "personType"];
const DESCRIPTION_KEYS: &[&str] = &["description", "desc"];
const TIMESTAMP_KEYS: &[&str] = &["createAt", "createdAt", "created_at", "date"];
const SCORE_KEYS: &[&str] = &["scores", "score", "scoreMap"];
const LIST_KEYS: &[&str] = &["list", "items", "results", "records"];

/// "K:V,K:V" 形式のスコア文字列を解析する
///
/// コロンが無い・キーが空・値が数値でない要素は黙って捨てる。
pub fn parse_score_string(raw: &str) -> ScoreMap {
    let trimmed = raw.trim();

    // JSON文字列として埋め込まれている場合
    if trimmed.starts_with('{') {
        if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(trimmed) {
            return scores_from_object(&map);
        }
    }

    let mut scores = ScoreMap::new();
    for segment in trimmed.split(',') {
        let Some((key, value)) = segment.split_once(':') else {
            if !segment.trim().is_empty() {
                tracing::trace!(segment, "Dropping score segment without colon");
            }
            continue;
        };
        let key = key.trim().trim_matches('"');
        if key.is_empty() {
            continue;
        }
        match value.trim().trim_matches('"').parse::<f64>() {
            Ok(number) if number.is_finite() => {
                scores.insert(key.to_string(), number);
            }
            _ => tracing::trace!(segment, "Dropping non-numeric score"),
        }
    }
    scores
}

fn scores_from_object(map: &serde_json::Map<String, Value>) -> ScoreMap {
    map.iter()
        .filter_map(|(key, value)| number_of(value).map(|n| (key.clone(), n)))
        .collect()
}

fn number_of(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|n| n.is_finite())
}

/// スコア欄を解析（オブジェクト・文字列・`[{name, score}]` 配列）
pub fn parse_scores(value: &Value) -> ScoreMap {
    match value {
        Value::Object(map) => scores_from_object(map),
        Value::String(s) => parse_score_string(s),
        Value::Array(items) => items
            .iter()
            .filter_map(|item| {
                let name = item
                    .get("name")
                    .or_else(|| item.get("trait"))
                    .and_then(Value::as_str)?;
                let score = item
                    .get("score")
                    .or_else(|| item.get("value"))
                    .and_then(number_of)?;
                Some((name.to_string(), score))
            })
            .collect(),
        _ => ScoreMap::new(),
    }
}

/// 作成日時を解析（RFC 3339・日付時刻文字列・エポックミリ秒/秒）
pub fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Number(n) => n.as_i64().and_then(from_epoch),
        Value::String(s) => parse_timestamp_str(s.trim()),
        _ => None,
    }
}

fn from_epoch(raw: i64) -> Option<DateTime<Utc>> {
    // 1e11を超える値はミリ秒とみなす
    if raw.abs() >= 100_000_000_000 {
        Utc.timestamp_millis_opt(raw).single()
    } else {
        Utc.timestamp_opt(raw, 0).single()
    }
}

fn parse_timestamp_str(s: &str) -> Option<DateTime<Utc>> {
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(naive.and_utc());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
    }
    s.parse::<i64>().ok().and_then(from_epoch)
}

fn first_of<'a>(entry: &'a serde_json::Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| entry.get(*key))
        .find(|value| !value.is_null())
}

fn text_of(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

/// 一件分の生データを正規化する。オブジェクト以外は `None`
pub fn normalize_entry(survey_type: SurveyType, entry: &Value) -> Option<SurveyResult> {
    let Value::Object(map) = entry else {
        tracing::debug!(%survey_type, "Skipping non-object survey entry");
        return None;
    };

    let label = text_of(first_of(map, LABEL_KEYS));
    let description = text_of(first_of(map, DESCRIPTION_KEYS));
    let scores = first_of(map, SCORE_KEYS)
        .map(parse_scores)
        .unwrap_or_default();
    let created_at = first_of(map, TIMESTAMP_KEYS).and_then(parse_timestamp);

    Some(SurveyResult {
        survey_type,
        label,
        description,
        scores,
        created_at,
        detail: None,
    })
}

/// 新しい順に並べる（日時なしは末尾）
pub fn sort_latest_first(results: &mut [SurveyResult]) {
    results.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}

/// 一種類分のペイロード（単体・配列・リストを包んだオブジェクト）を正規化する
pub fn normalize_payload(survey_type: SurveyType, payload: &Value) -> Vec<SurveyResult> {
    let entries: Vec<&Value> = match payload {
        Value::Array(items) => items.iter().collect(),
        Value::Object(map) => match first_of(map, LIST_KEYS) {
            Some(Value::Array(items)) => items.iter().collect(),
            _ => vec![payload],
        },
        Value::Null => Vec::new(),
        other => vec![other],
    };

    let mut results: Vec<SurveyResult> = entries
        .into_iter()
        .filter_map(|entry| normalize_entry(survey_type, entry))
        .collect();
    sort_latest_first(&mut results);
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_score_string() {
        let scores = parse_score_string("E:10,I:5");
        assert_eq!(scores.len(), 2);
        assert_eq!(scores["E"], 10.0);
        assert_eq!(scores["I"], 5.0);
    }

    #[test]
    fn test_parse_score_string_drops_malformed() {
        let scores = parse_score_string("E:10, broken ,I:abc,:3, N : 7.5 ,S:");
        assert_eq!(scores.len(), 2);
        assert_eq!(scores["E"], 10.0);
        assert_eq!(scores["N"], 7.5);
    }

    #[test]
    fn test_parse_score_string_embedded_json() {
        let scores = parse_score_string(r#"{"D": 12, "I": "4", "S": "x"}"#);
        assert_eq!(scores.len(), 2);
        assert_eq!(scores["I"], 4.0);
    }

    #[test]
    fn test_parse_scores_array_form() {
        let scores = parse_scores(&json!([
            {"name": "Openness", "score": 80},
            {"trait": "Neuroticism", "value": "20"},
            {"name": "Bad"}
        ]));
        assert_eq!(scores.len(), 2);
        assert_eq!(scores["Neuroticism"], 20.0);
    }

    #[test]
    fn test_parse_timestamp_variants() {
        let rfc = parse_timestamp(&json!("2024-03-01T10:00:00+09:00")).unwrap();
        assert_eq!(rfc.to_rfc3339(), "2024-03-01T01:00:00+00:00");

        let naive = parse_timestamp(&json!("2024-03-01 10:00:00")).unwrap();
        assert_eq!(naive.to_rfc3339(), "2024-03-01T10:00:00+00:00");

        let millis = parse_timestamp(&json!(1_709_287_200_000_i64)).unwrap();
        let secs = parse_timestamp(&json!(1_709_287_200_i64)).unwrap();
        assert_eq!(millis, secs);

        assert!(parse_timestamp(&json!("yesterday")).is_none());
        assert!(parse_timestamp(&json!(true)).is_none());
    }

    #[test]
    fn test_normalize_entry_aliases() {
        let legacy = json!({"type": "INTJ", "desc": "Architect", "createAt": "2024-01-01", "score": "E:2,I:8"});
        let current = json!({"result": "ENFP", "description": "Campaigner", "createdAt": "2024-02-01T00:00:00Z", "scores": {"E": 9, "I": 1}});

        let a = normalize_entry(SurveyType::Mbti, &legacy).unwrap();
        assert_eq!(a.label, "INTJ");
        assert_eq!(a.description, "Architect");
        assert_eq!(a.scores["I"], 8.0);
        assert!(a.created_at.is_some());

        let b = normalize_entry(SurveyType::Mbti, &current).unwrap();
        assert_eq!(b.label, "ENFP");
        assert_eq!(b.scores["E"], 9.0);

        assert!(normalize_entry(SurveyType::Mbti, &json!("INTJ")).is_none());
    }

    #[test]
    fn test_normalize_entry_prefers_non_null_alias() {
        let entry = json!({"result": null, "label": "High D", "date": null, "createdAt": "2024-05-05"});
        let result = normalize_entry(SurveyType::Disc, &entry).unwrap();
        assert_eq!(result.label, "High D");
        assert!(result.created_at.is_some());
    }

    #[test]
    fn test_normalize_payload_sorts_latest_first() {
        let payload = json!({"list": [
            {"result": "old", "createdAt": "2023-01-01"},
            {"result": "undated"},
            {"result": "new", "createdAt": "2024-06-01"},
            42
        ]});
        let results = normalize_payload(SurveyType::BigFive, &payload);
        let labels: Vec<_> = results.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["new", "old", "undated"]);
    }

    #[test]
    fn test_normalize_payload_single_object() {
        let results = normalize_payload(SurveyType::Disc, &json!({"result": "S"}));
        assert_eq!(results.len(), 1);
        assert!(normalize_payload(SurveyType::Disc, &Value::Null).is_empty());
    }
}
