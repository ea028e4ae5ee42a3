//! 表示用の集約
//!
//! - 種類ごとの最新結果
//! - 日付ごとの履歴（新しい日付から、日付内は種類の優先順→新しい順）
//! - スコアバーと詳細パネルの表示モデル

use chrono::{FixedOffset, NaiveDate};
use std::collections::BTreeMap;

use super::types::{ScoreMap, SurveyResult, SurveyType};

/// 一会員・一予約分の診断結果
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SurveyResultSet {
    /// 種類ごとに新しい順
    pub by_type: BTreeMap<SurveyType, Vec<SurveyResult>>,
}

impl SurveyResultSet {
    pub fn insert(&mut self, survey_type: SurveyType, mut results: Vec<SurveyResult>) {
        if results.is_empty() {
            return;
        }
        super::normalizer::sort_latest_first(&mut results);
        self.by_type.insert(survey_type, results);
    }

    pub fn is_empty(&self) -> bool {
        self.by_type.values().all(Vec::is_empty)
    }

    pub fn total(&self) -> usize {
        self.by_type.values().map(Vec::len).sum()
    }

    pub fn results_mut(&mut self) -> impl Iterator<Item = &mut SurveyResult> {
        self.by_type.values_mut().flat_map(|results| results.iter_mut())
    }

    pub fn all(&self) -> impl Iterator<Item = &SurveyResult> {
        self.by_type.values().flatten()
    }

    /// 種類ごとの最新結果（優先順）
    pub fn latest_by_type(&self) -> Vec<&SurveyResult> {
        SurveyType::ALL
            .iter()
            .filter_map(|t| self.by_type.get(t).and_then(|results| latest(results)))
            .collect()
    }

    pub fn latest(&self, survey_type: SurveyType) -> Option<&SurveyResult> {
        self.by_type.get(&survey_type).and_then(|results| latest(results))
    }
}

/// 作成日時が最大のもの（日時なしは候補が他に無い場合のみ）
pub fn latest(results: &[SurveyResult]) -> Option<&SurveyResult> {
    results.iter().reduce(|best, candidate| {
        if candidate.created_at > best.created_at {
            candidate
        } else {
            best
        }
    })
}

/// 履歴の日付バケット
#[derive(Debug, Clone, PartialEq)]
pub struct DateBucket {
    /// 日付なしの結果は `None`
    pub date: Option<NaiveDate>,
    /// 表示ラベル（"YYYY/MM/DD"）
    pub label: String,
    pub entries: Vec<SurveyResult>,
}

/// 日付ごとの履歴を組み立てる
pub fn history_by_date<'a>(
    results: impl IntoIterator<Item = &'a SurveyResult>,
    display_offset: FixedOffset,
) -> Vec<DateBucket> {
    let mut buckets: BTreeMap<Option<NaiveDate>, Vec<SurveyResult>> = BTreeMap::new();
    for result in results {
        let date = result
            .created_at
            .map(|ts| ts.with_timezone(&display_offset).date_naive());
        buckets.entry(date).or_default().push(result.clone());
    }

    let mut history: Vec<DateBucket> = buckets
        .into_iter()
        .map(|(date, mut entries)| {
            entries.sort_by(|a, b| {
                a.survey_type
                    .priority()
                    .cmp(&b.survey_type.priority())
                    .then_with(|| b.created_at.cmp(&a.created_at))
            });
            DateBucket {
                date,
                label: date
                    .map(|d| d.format("%Y/%m/%d").to_string())
                    .unwrap_or_else(|| "Undated".to_string()),
                entries,
            }
        })
        .collect();

    // 新しい日付が先、日付なしは最後
    history.sort_by(|a, b| match (a.date, b.date) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });
    history
}

/// スコアバー
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreBar {
    pub trait_name: String,
    pub value: f64,
    /// 合計に対する割合（0〜100）
    pub percent: f64,
}

pub fn score_bars(scores: &ScoreMap) -> Vec<ScoreBar> {
    let total: f64 = scores.values().filter(|v| **v > 0.0).sum();
    scores
        .iter()
        .map(|(name, value)| ScoreBar {
            trait_name: name.clone(),
            value: *value,
            percent: if total > 0.0 {
                (value.max(0.0) / total * 100.0).clamp(0.0, 100.0)
            } else {
                0.0
            },
        })
        .collect()
}

/// 展開可能な結果パネル
#[derive(Debug, Clone, PartialEq)]
pub struct ResultPanel {
    pub survey_type: SurveyType,
    pub title: String,
    pub summary: String,
    pub bars: Vec<ScoreBar>,
    pub expanded: bool,
    /// 展開時に表示する本文（補足情報がある場合）
    pub detail_text: Option<String>,
    pub image_url: Option<String>,
}

impl ResultPanel {
    pub fn from_result(result: &SurveyResult) -> Self {
        let detail = result.detail.as_ref();
        Self {
            survey_type: result.survey_type,
            title: if result.has_label() {
                format!("{}: {}", result.survey_type, result.label)
            } else {
                result.survey_type.to_string()
            },
            summary: result.description.clone(),
            bars: score_bars(&result.scores),
            expanded: false,
            detail_text: detail.and_then(|d| d.long_description.clone()),
            image_url: detail.and_then(|d| d.image_url.clone()),
        }
    }

    pub fn is_expandable(&self) -> bool {
        self.detail_text.is_some() || self.image_url.is_some()
    }

    /// 展開状態を切り替える。補足情報が無いパネルは開かない
    pub fn toggle(&mut self) {
        self.expanded = self.is_expandable() && !self.expanded;
    }
}
