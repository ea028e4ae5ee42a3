//! 診断結果の補足情報取得（ベストエフォート）
//!
//! ラベル名で詳細を引き、取れた場合だけ結果に付け足す。
//! 失敗は `Ignored` という値として返し、呼び出し側が意図的に捨てる。

use futures_util::future::join_all;

use super::types::{PersonalityDetail, SurveyResult};
use crate::api::endpoints;
use crate::api::{ApiRequest, BackendApi, LookupOutcome};

/// 捨てられた補足取得の理由
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ignored {
    pub reason: String,
}

impl Ignored {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// 失敗しても構わない処理の結果
pub type BestEffort<T> = Result<T, Ignored>;

/// 補足取得の集計
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnrichmentReport {
    pub attempted: usize,
    pub merged: usize,
    pub ignored: Vec<(String, Ignored)>,
}

/// ラベル名で詳細を引くクライアント
#[derive(Clone)]
pub struct ResultEnricher {
    api: BackendApi,
}

impl ResultEnricher {
    pub fn new(api: BackendApi) -> Self {
        Self { api }
    }

    /// 一件分の詳細を取得する。どんな失敗も `Ignored`
    pub async fn lookup_detail(&self, label: &str) -> BestEffort<PersonalityDetail> {
        let label = label.trim();
        if label.is_empty() {
            return Err(Ignored::new("empty label"));
        }

        let request = ApiRequest::get(endpoints::PERSON_TYPE_BY_NAME).query("name", label);
        match self.api.lookup::<PersonalityDetail>(request).await {
            Ok(LookupOutcome::Found(detail)) if !detail.is_empty() => Ok(detail),
            Ok(LookupOutcome::Found(_)) => Err(Ignored::new("detail has no content")),
            Ok(LookupOutcome::NoData) => Err(Ignored::new("no detail for label")),
            Err(e) => Err(Ignored::new(e.to_string())),
        }
    }

    /// ラベルのある結果すべてに並行して詳細を付与する
    pub async fn enrich_all(&self, results: &mut [SurveyResult]) -> EnrichmentReport {
        let targets: Vec<usize> = results
            .iter()
            .enumerate()
            .filter(|(_, result)| result.has_label())
            .map(|(index, _)| index)
            .collect();

        let labels: Vec<String> = targets
            .iter()
            .map(|&index| results[index].label.clone())
            .collect();
        let outcomes = join_all(labels.iter().map(|label| self.lookup_detail(label))).await;

        let mut report = EnrichmentReport {
            attempted: targets.len(),
            ..EnrichmentReport::default()
        };

        for (index, outcome) in targets.into_iter().zip(outcomes) {
            if merge_best_effort(&mut results[index], outcome.clone()) {
                report.merged += 1;
            } else if let Err(ignored) = outcome {
                tracing::debug!(
                    label = %results[index].label,
                    reason = %ignored.reason,
                    "🙈 Enrichment ignored"
                );
                report.ignored.push((results[index].label.clone(), ignored));
            }
        }

        report
    }
}

/// 取れた詳細だけを付け足す。付け足したら `true`
pub fn merge_best_effort(result: &mut SurveyResult, outcome: BestEffort<PersonalityDetail>) -> bool {
    match outcome {
        Ok(detail) => {
            result.detail = Some(detail);
            true
        }
        // 意図的に捨てる
        Err(_) => false,
    }
}
